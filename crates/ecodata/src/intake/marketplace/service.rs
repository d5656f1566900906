use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::domain::{MarketplaceProduct, ProductQuery, PurchaseReceipt, PurchaseRequest};
use super::repository::ProductRepository;
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::UserSession;
use crate::error::ServiceError;
use crate::intake::notifications::{Notification, NotificationKind, NotificationRepository};
use crate::intake::present;

pub struct MarketplaceService {
    products: Arc<dyn ProductRepository>,
    notifications: Arc<dyn NotificationRepository>,
    audit: AuditTrail,
}

impl MarketplaceService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        notifications: Arc<dyn NotificationRepository>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            products,
            notifications,
            audit,
        }
    }

    pub fn list(&self, query: &ProductQuery) -> Result<Vec<MarketplaceProduct>, ServiceError> {
        Ok(self
            .products
            .list_active_products(present(query.category.as_deref()))?)
    }

    pub fn purchase(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        request: PurchaseRequest,
    ) -> Result<PurchaseReceipt, ServiceError> {
        let product_id = present(request.product_id.as_deref())
            .ok_or_else(|| ServiceError::validation("productId is required"))?;
        let product_id =
            Uuid::parse_str(product_id).map_err(|_| ServiceError::NotFound("product"))?;

        let product = self
            .products
            .fetch_product(product_id)?
            .filter(|product| product.is_active)
            .ok_or(ServiceError::NotFound("product"))?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(
                AuditAction::Create,
                AuditResource::MarketplacePurchase,
                product.id,
            )
            .with_details(json!({
                "productName": product.name,
                "price": product.price(),
                "currency": product.currency,
            })),
        )?;

        self.notifications.insert_notification(Notification::new(
            session.user_id,
            NotificationKind::Success,
            "Purchase complete!",
            format!(
                "You acquired \"{}\". The module will be available shortly.",
                product.name
            ),
        ))?;

        info!(user_id = %session.user_id, product_id = %product.id, "marketplace purchase");

        Ok(PurchaseReceipt {
            product_id: product.id,
            price: product.price(),
            product_name: product.name,
            price_cents: product.price_cents,
            currency: product.currency,
            purchased_at: Utc::now(),
        })
    }
}
