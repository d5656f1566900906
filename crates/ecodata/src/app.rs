//! Wires the resource services onto one store and assembles the HTTP surface.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, Router};

use crate::audit::{audit_router, AuditService, AuditTrail};
use crate::auth::{resolve_session, PasswordHasher, SessionService};
use crate::extraction::TextExtractionService;
use crate::health::{health_router, HealthProbe, HealthService, OcrProbe, StoreProbe};
use crate::intake::accounts::{account_router, AccountService};
use crate::intake::documents::{document_router, DocumentService};
use crate::intake::forms::{form_router, FormService};
use crate::intake::marketplace::{marketplace_router, MarketplaceService};
use crate::intake::notifications::{notification_router, NotificationService};
use crate::intake::schemas::{schema_router, SchemaService};
use crate::knowledge::{knowledge_router, KnowledgeBase, KnowledgeService};
use crate::persistence::RecordStore;

#[derive(Clone)]
pub struct IntakeServices {
    pub accounts: Arc<AccountService>,
    pub documents: Arc<DocumentService>,
    pub forms: Arc<FormService>,
    pub schemas: Arc<SchemaService>,
    pub notifications: Arc<NotificationService>,
    pub marketplace: Arc<MarketplaceService>,
    pub audit: Arc<AuditService>,
    pub knowledge: Arc<KnowledgeService>,
    pub health: Arc<HealthService>,
}

impl IntakeServices {
    pub fn from_store<S>(
        store: Arc<S>,
        sessions: Arc<SessionService>,
        hasher: PasswordHasher,
        extractor: Arc<TextExtractionService>,
        knowledge: Arc<dyn KnowledgeBase>,
        version: impl Into<String>,
    ) -> Self
    where
        S: RecordStore + 'static,
    {
        let trail = AuditTrail::new(store.clone());
        let probes: Vec<Arc<dyn HealthProbe>> = vec![
            Arc::new(StoreProbe::new(store.clone())),
            Arc::new(OcrProbe::new(extractor.ocr_engine())),
        ];

        Self {
            accounts: Arc::new(AccountService::new(
                store.clone(),
                store.clone(),
                trail.clone(),
                sessions,
                hasher,
            )),
            documents: Arc::new(DocumentService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                extractor,
                trail.clone(),
            )),
            forms: Arc::new(FormService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                trail.clone(),
            )),
            schemas: Arc::new(SchemaService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                trail.clone(),
            )),
            notifications: Arc::new(NotificationService::new(store.clone(), trail.clone())),
            marketplace: Arc::new(MarketplaceService::new(
                store.clone(),
                store.clone(),
                trail.clone(),
            )),
            audit: Arc::new(AuditService::new(store.clone(), store)),
            knowledge: Arc::new(KnowledgeService::new(knowledge, trail)),
            health: Arc::new(HealthService::new(probes, version)),
        }
    }
}

/// Every `/api` route behind the session resolver. Handlers decide for themselves whether a
/// session is required.
pub fn intake_router(
    services: IntakeServices,
    sessions: Arc<SessionService>,
    upload_limit_bytes: usize,
) -> Router {
    Router::new()
        .merge(account_router(services.accounts))
        .merge(document_router(services.documents))
        .merge(form_router(services.forms))
        .merge(schema_router(services.schemas))
        .merge(notification_router(services.notifications))
        .merge(marketplace_router(services.marketplace))
        .merge(audit_router(services.audit))
        .merge(knowledge_router(services.knowledge))
        .merge(health_router(services.health))
        .layer(DefaultBodyLimit::max(upload_limit_bytes))
        .layer(middleware::from_fn_with_state(sessions, resolve_session))
}
