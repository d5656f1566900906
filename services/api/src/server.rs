use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::with_operational_routes;
use crate::seed::seed_demo_data;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ecodata::auth::PasswordHasher;
use ecodata::config::AppConfig;
use ecodata::error::AppError;
use ecodata::intake_router;
use ecodata::persistence::InMemoryStore;
use ecodata::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::new());
    if !args.no_seed {
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);
        let seeded = seed_demo_data(&store, &hasher).await?;
        info!(
            users = seeded.users,
            schemas = seeded.schemas,
            products = seeded.products,
            "demo data loaded"
        );
    }

    let (services, sessions) = build_services(&config, store)?;
    let app = with_operational_routes(intake_router(
        services,
        sessions,
        config.server.upload_limit_bytes,
    ))
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, version = %config.version, "document intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
