use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::app::{intake_router, IntakeServices};
use crate::audit::{AuditFilter, AuditRecord, AuditRepository};
use crate::auth::{CookieSettings, PasswordHasher, Role, SessionService, UserSession};
use crate::extraction::{
    ExtractionError, OcrEngine, OcrOutput, PdfEngine, PdfOutput, TextExtractionService,
};
use crate::intake::accounts::{User, UserRepository};
use crate::intake::schemas::{Schema, SchemaField, SchemaRepository, SchemaStatus};
use crate::knowledge::{KnowledgeBase, KnowledgeError, KnowledgePage, KnowledgeQuery};
use crate::persistence::InMemoryStore;

pub(super) const BOUNDARY: &str = "ecodata-test-boundary";

pub(super) struct FakePdf;

#[async_trait]
impl PdfEngine for FakePdf {
    async fn parse(&self, _bytes: &[u8]) -> Result<PdfOutput, ExtractionError> {
        Ok(PdfOutput {
            text: "Apólice de seguro saúde".to_string(),
            pages: 2,
            info: serde_json::Map::new(),
        })
    }
}

pub(super) struct FakeOcr {
    outcome: Result<OcrOutput, String>,
}

impl FakeOcr {
    pub(super) fn reading(text: &str, mean_confidence: f64) -> Self {
        Self {
            outcome: Ok(OcrOutput {
                text: text.to_string(),
                words: text.split_whitespace().count(),
                mean_confidence,
            }),
        }
    }

    pub(super) fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, _bytes: &[u8]) -> Result<OcrOutput, ExtractionError> {
        self.outcome.clone().map_err(ExtractionError::Parse)
    }
}

#[derive(Default)]
pub(super) struct FakeKnowledge {
    pub(super) pages: Mutex<Vec<KnowledgePage>>,
    pub(super) unavailable: bool,
}

#[async_trait]
impl KnowledgeBase for FakeKnowledge {
    async fn search(&self, query: &KnowledgeQuery) -> Result<Vec<Value>, KnowledgeError> {
        if self.unavailable {
            return Err(KnowledgeError::Status {
                operation: "search",
                status: 502,
            });
        }
        Ok(vec![
            json!({ "object": "page", "id": "page-1", "query": query.query }),
            json!({ "object": "page", "id": "page-2", "query": query.query }),
        ])
    }

    async fn create_page(&self, page: &KnowledgePage) -> Result<String, KnowledgeError> {
        let mut pages = self.pages.lock().expect("pages lock");
        pages.push(page.clone());
        Ok(format!("page-{}", pages.len()))
    }
}

pub(super) struct Harness {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) sessions: Arc<SessionService>,
    pub(super) knowledge: Arc<FakeKnowledge>,
    router: Router,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_ocr(FakeOcr::reading("REGISTRO GERAL 12.345.678-9", 91.0))
    }

    pub(super) fn with_ocr(ocr: FakeOcr) -> Self {
        Self::build(ocr, FakeKnowledge::default())
    }

    pub(super) fn with_knowledge(knowledge: FakeKnowledge) -> Self {
        Self::build(FakeOcr::reading("texto", 80.0), knowledge)
    }

    fn build(ocr: FakeOcr, knowledge: FakeKnowledge) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let sessions = Arc::new(SessionService::new(
            "intake-test-secret",
            Duration::from_secs(3600),
            CookieSettings {
                name: "session".to_string(),
                secure: false,
            },
        ));
        let extractor = Arc::new(TextExtractionService::new(
            Arc::new(FakePdf),
            Arc::new(ocr),
        ));
        let knowledge = Arc::new(knowledge);

        let services = IntakeServices::from_store(
            store.clone(),
            sessions.clone(),
            PasswordHasher::new(4),
            extractor,
            knowledge.clone(),
            "test",
        );
        let router = intake_router(services, sessions.clone(), 1024 * 1024);

        Self {
            store,
            sessions,
            knowledge,
            router,
        }
    }

    /// Stores a user with the given role and returns a bearer token for it.
    pub(super) fn login_as(&self, role: Role) -> (UserSession, String) {
        let email = format!("{}-{}@ecodata.io", role.label(), uuid::Uuid::new_v4());
        let user = self
            .store
            .insert_user(User::new(&email, "not-a-hash".to_string(), "Test User", role))
            .expect("user stored");
        let session = user.session();
        let token = self.sessions.issue(&session).expect("token issued");
        (session, token)
    }

    pub(super) fn schema(&self, slug: &str, fields: Vec<SchemaField>) -> Schema {
        self.store
            .insert_schema(Schema::new(slug, slug, fields, SchemaStatus::Active))
            .expect("schema stored")
    }

    pub(super) fn audit_records(&self) -> Vec<AuditRecord> {
        self.store
            .list_audit(&AuditFilter::default(), 0, usize::MAX)
            .expect("audit listed")
    }

    pub(super) async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds")
    }
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "intake-tests")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request")
}

pub(super) fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub(super) fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::delete(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

pub(super) fn upload(
    token: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
    schema_id: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    if let Some(schema_id) = schema_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"schemaId\"\r\n\r\n{schema_id}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/documents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
