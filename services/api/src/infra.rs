use ecodata::auth::{PasswordHasher, SessionService};
use ecodata::config::AppConfig;
use ecodata::error::AppError;
use ecodata::extraction::TextExtractionService;
use ecodata::knowledge::NotionClient;
use ecodata::persistence::InMemoryStore;
use ecodata::IntakeServices;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire every resource service against `store` using the loaded configuration.
pub(crate) fn build_services(
    config: &AppConfig,
    store: Arc<InMemoryStore>,
) -> Result<(IntakeServices, Arc<SessionService>), AppError> {
    let sessions = Arc::new(SessionService::from_config(&config.auth));
    let extractor = Arc::new(TextExtractionService::from_config(&config.extraction));
    let knowledge = Arc::new(NotionClient::from_config(&config.knowledge)?);

    let services = IntakeServices::from_store(
        store,
        sessions.clone(),
        PasswordHasher::new(config.auth.bcrypt_cost),
        extractor,
        knowledge,
        config.version.clone(),
    );
    Ok((services, sessions))
}
