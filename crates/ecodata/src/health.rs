//! Dependency health report served at `/api/health`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::extraction::OcrEngine;
use crate::persistence::RecordStore;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self) -> Result<(), String>;
}

pub struct StoreProbe {
    store: Arc<dyn RecordStore>,
}

impl StoreProbe {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthProbe for StoreProbe {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn check(&self) -> Result<(), String> {
        self.store.ping().map_err(|err| err.to_string())
    }
}

pub struct OcrProbe {
    engine: Arc<dyn OcrEngine>,
}

impl OcrProbe {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl HealthProbe for OcrProbe {
    fn name(&self) -> &'static str {
        "ocr"
    }

    async fn check(&self) -> Result<(), String> {
        self.engine.probe().await.map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyCheck {
    pub status: CheckStatus,
    /// Milliseconds.
    pub latency: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the service started.
    pub uptime: f64,
    pub checks: BTreeMap<&'static str, DependencyCheck>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }
}

pub struct HealthService {
    probes: Vec<Arc<dyn HealthProbe>>,
    version: String,
    started: Instant,
}

impl HealthService {
    pub fn new(probes: Vec<Arc<dyn HealthProbe>>, version: impl Into<String>) -> Self {
        Self {
            probes,
            version: version.into(),
            started: Instant::now(),
        }
    }

    pub async fn report(&self) -> HealthReport {
        let checks = join_all(self.probes.iter().map(|probe| async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(PROBE_TIMEOUT, probe.check()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(format!("probe timed out after {}s", PROBE_TIMEOUT.as_secs())),
            };
            let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let check = match outcome {
                Ok(()) => DependencyCheck {
                    status: CheckStatus::Healthy,
                    latency,
                    error: None,
                },
                Err(error) => DependencyCheck {
                    status: CheckStatus::Unhealthy,
                    latency,
                    error: Some(error),
                },
            };
            (probe.name(), check)
        }))
        .await
        .into_iter()
        .collect::<BTreeMap<_, _>>();

        let status = if checks
            .values()
            .all(|check| check.status == CheckStatus::Healthy)
        {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };

        HealthReport {
            status,
            version: self.version.clone(),
            timestamp: Utc::now(),
            uptime: self.started.elapsed().as_secs_f64(),
            checks,
        }
    }
}

pub fn health_router(service: Arc<HealthService>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .with_state(service)
}

async fn health_handler(
    State(service): State<Arc<HealthService>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = service.report().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct Fixed(&'static str, Result<(), String>);

    #[async_trait]
    impl HealthProbe for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn check(&self) -> Result<(), String> {
            self.1.clone()
        }
    }

    fn service(ocr: Result<(), String>) -> Arc<HealthService> {
        Arc::new(HealthService::new(
            vec![
                Arc::new(Fixed("store", Ok(()))),
                Arc::new(Fixed("ocr", ocr)),
            ],
            "1.2.3",
        ))
    }

    #[tokio::test]
    async fn all_healthy_returns_ok() {
        let response = health_router(service(Ok(())))
            .oneshot(Request::get("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "healthy");
        assert_eq!(payload["version"], "1.2.3");
        assert_eq!(payload["checks"]["store"]["status"], "healthy");
        assert!(payload["checks"]["ocr"].get("error").is_none());
    }

    #[tokio::test]
    async fn failing_dependency_degrades() {
        let response = health_router(service(Err("tesseract missing".to_string())))
            .oneshot(Request::get("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "degraded");
        assert_eq!(payload["checks"]["ocr"]["status"], "unhealthy");
        assert_eq!(payload["checks"]["ocr"]["error"], "tesseract missing");
    }

    #[tokio::test]
    async fn store_probe_pings_the_store() {
        let store: Arc<dyn RecordStore> = Arc::new(crate::persistence::InMemoryStore::new());
        assert_eq!(StoreProbe::new(store).check().await, Ok(()));
    }
}
