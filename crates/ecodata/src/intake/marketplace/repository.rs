use uuid::Uuid;

use super::domain::MarketplaceProduct;
use crate::persistence::RepositoryError;

pub trait ProductRepository: Send + Sync {
    fn insert_product(
        &self,
        product: MarketplaceProduct,
    ) -> Result<MarketplaceProduct, RepositoryError>;
    fn fetch_product(&self, id: Uuid) -> Result<Option<MarketplaceProduct>, RepositoryError>;
    /// Active products ordered by name, optionally restricted to one category.
    fn list_active_products(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<MarketplaceProduct>, RepositoryError>;
}
