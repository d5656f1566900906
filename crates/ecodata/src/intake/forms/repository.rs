use uuid::Uuid;

use super::domain::{Form, FormFilter};
use crate::persistence::RepositoryError;

pub trait FormRepository: Send + Sync {
    fn insert_form(&self, form: Form) -> Result<Form, RepositoryError>;
    fn fetch_form(&self, id: Uuid) -> Result<Option<Form>, RepositoryError>;
    fn update_form(&self, form: Form) -> Result<(), RepositoryError>;
    fn delete_form(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// Most recently updated first.
    fn list_forms(
        &self,
        filter: &FormFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Form>, RepositoryError>;
    fn count_forms(&self, filter: &FormFilter) -> Result<usize, RepositoryError>;
    fn count_forms_for_schema(&self, schema_id: Uuid) -> Result<usize, RepositoryError>;
}
