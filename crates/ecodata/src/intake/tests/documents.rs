use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use super::common::*;
use crate::audit::AuditAction;
use crate::auth::Role;
use crate::intake::documents::{DocumentRepository, DocumentStatus, ExtractionRepository};
use crate::intake::schemas::SchemaField;

async fn upload_text(harness: &Harness, token: &str) -> Value {
    let response = harness
        .send(upload(token, "notes.txt", "text/plain", "linha 1\nlinha 2".as_bytes(), None))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

fn document_id(body: &Value) -> String {
    body["document"]["id"]
        .as_str()
        .expect("document id")
        .to_string()
}

#[tokio::test]
async fn text_uploads_are_extracted_losslessly() {
    let harness = Harness::new();
    let (session, token) = harness.login_as(Role::Insured);

    let body = upload_text(&harness, &token).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["document"]["status"], "extracted");
    assert_eq!(body["document"]["mimeType"], "text/plain");
    assert_eq!(body["document"]["sizeBytes"], 15);
    assert_eq!(body["extraction"]["engine"], "passthrough");
    assert_eq!(body["extraction"]["rawText"], "linha 1\nlinha 2");
    assert_eq!(body["extraction"]["confidence"], 1.0);
    assert!(body.get("warning").is_none());

    let records = harness.audit_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, AuditAction::Upload);
    assert_eq!(records[0].user_id, session.user_id);
    assert_eq!(records[0].details["filename"], "notes.txt");
}

#[tokio::test]
async fn images_are_sent_to_ocr() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Broker);

    let response = harness
        .send(upload(&token, "rg.png", "image/png", &[0x89, 0x50, 0x4e, 0x47], None))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json_body(response).await;
    assert_eq!(body["document"]["status"], "extracted");
    assert_eq!(body["extraction"]["engine"], "tesseract");
    assert_eq!(body["extraction"]["rawText"], "REGISTRO GERAL 12.345.678-9");
    assert_eq!(body["extraction"]["confidence"], 0.91);
}

#[tokio::test]
async fn failed_extraction_still_stores_the_document() {
    let harness = Harness::with_ocr(FakeOcr::failing("tesseract crashed"));
    let (_, token) = harness.login_as(Role::Insured);

    let response = harness
        .send(upload(&token, "cnh.jpg", "image/jpeg", b"not really a jpeg", None))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json_body(response).await;
    assert_eq!(body["document"]["status"], "pending");
    assert_eq!(body["extraction"]["engine"], "tesseract-error");
    assert_eq!(body["extraction"]["confidence"], 0.0);
    assert_eq!(
        body["warning"],
        "document stored but extraction failed; try again"
    );

    let id = uuid::Uuid::parse_str(&document_id(&body)).expect("uuid");
    let stored = harness
        .store
        .fetch_document(id)
        .expect("fetch")
        .expect("document stored");
    assert_eq!(stored.status, DocumentStatus::Pending);
    assert_eq!(harness.store.count_extractions(id).expect("count"), 1);
}

#[tokio::test]
async fn unsupported_types_are_kept_pending() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Insured);

    let response = harness
        .send(upload(&token, "bundle.zip", "application/zip", b"PK\x03\x04", None))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["document"]["status"], "pending");
    assert_eq!(body["extraction"]["engine"], "unsupported");
    assert!(body["extraction"]["rawText"].is_null());
}

#[tokio::test]
async fn uploads_validate_the_schema_reference() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Insured);

    let invalid = harness
        .send(upload(&token, "a.txt", "text/plain", b"a", Some("not-a-uuid")))
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let unknown = harness
        .send(upload(
            &token,
            "a.txt",
            "text/plain",
            b"a",
            Some(&uuid::Uuid::new_v4().to_string()),
        ))
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let schema = harness.schema("rg-nacional", vec![SchemaField::new("cpf", "CPF", "text", true)]);
    let linked = harness
        .send(upload(&token, "a.txt", "text/plain", b"a", Some(&schema.id.to_string())))
        .await;
    assert_eq!(linked.status(), StatusCode::CREATED);
    let body = read_json_body(linked).await;
    assert_eq!(body["document"]["schemaId"], schema.id.to_string());
}

#[tokio::test]
async fn uploads_require_a_session() {
    let harness = Harness::new();
    let mut request = upload("ignored", "a.txt", "text/plain", b"a", None);
    request.headers_mut().remove(axum::http::header::AUTHORIZATION);
    let response = harness.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_is_scoped_to_the_uploader() {
    let harness = Harness::new();
    let (_, mine) = harness.login_as(Role::Insured);
    let (_, theirs) = harness.login_as(Role::Insured);

    upload_text(&harness, &mine).await;
    upload_text(&harness, &mine).await;
    upload_text(&harness, &theirs).await;

    let response = harness.send(get("/api/documents?limit=1", Some(&mine))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["documents"].as_array().expect("documents").len(), 1);
    assert_eq!(body["documents"][0]["extractionCount"], 1);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let filtered = harness
        .send(get("/api/documents?status=approved", Some(&mine)))
        .await;
    let filtered = read_json_body(filtered).await;
    assert_eq!(filtered["pagination"]["total"], 0);

    let invalid = harness
        .send(get("/api/documents?status=archived", Some(&mine)))
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn details_are_visible_to_owner_and_reviewers_only() {
    let harness = Harness::new();
    let (_, owner) = harness.login_as(Role::Insured);
    let (_, stranger) = harness.login_as(Role::Broker);
    let (_, analyst) = harness.login_as(Role::DocAnalyst);

    let id = document_id(&upload_text(&harness, &owner).await);
    let uri = format!("/api/documents/{id}");

    let response = harness.send(get(&uri, Some(&owner))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["document"]["extractions"][0]["engine"], "passthrough");

    assert_eq!(
        harness.send(get(&uri, Some(&stranger))).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        harness.send(get(&uri, Some(&analyst))).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        harness
            .send(get("/api/documents/not-an-id", Some(&owner)))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn review_statuses_need_a_reviewer() {
    let harness = Harness::new();
    let (_, owner) = harness.login_as(Role::Insured);
    let (_, analyst) = harness.login_as(Role::DocAnalyst);

    let id = document_id(&upload_text(&harness, &owner).await);
    let uri = format!("/api/documents/{id}");

    let denied = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&owner),
            json!({ "status": "validated" }),
        ))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let metadata = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&owner),
            json!({ "metadata": { "policy": "123" } }),
        ))
        .await;
    assert_eq!(metadata.status(), StatusCode::OK);

    let validated = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&analyst),
            json!({ "status": "validated" }),
        ))
        .await;
    assert_eq!(validated.status(), StatusCode::OK);
    let body = read_json_body(validated).await;
    assert_eq!(body["document"]["status"], "validated");
    assert_eq!(body["document"]["metadata"]["policy"], "123");

    let latest = &harness.audit_records()[0];
    assert_eq!(latest.action, AuditAction::Validate);
    assert_eq!(latest.details["previousStatus"], "extracted");
    assert_eq!(latest.details["changes"], json!(["status"]));
}

#[tokio::test]
async fn status_cannot_move_backwards_or_leave_terminal_states() {
    let harness = Harness::new();
    let (_, owner) = harness.login_as(Role::Insured);
    let (_, validator) = harness.login_as(Role::Validator);

    let id = document_id(&upload_text(&harness, &owner).await);
    let uri = format!("/api/documents/{id}");
    let patch = |status: &str| {
        json_request(
            Method::PATCH,
            &uri,
            Some(&validator),
            json!({ "status": status }),
        )
    };

    assert_eq!(
        harness.send(patch("pending")).await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        harness.send(patch("approved")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        harness.send(patch("rejected")).await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        harness.send(patch("archived")).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(harness.audit_records()[0].action, AuditAction::Approve);
}
