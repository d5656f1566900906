use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use super::common::*;
use crate::audit::{AuditAction, AuditResource};
use crate::auth::Role;
use crate::intake::forms::FormRepository;
use crate::intake::schemas::{Schema, SchemaField};

fn cnh_schema(harness: &Harness) -> Schema {
    harness.schema(
        "cnh-digital",
        vec![
            SchemaField::new("numero_registro", "Nº Registro", "text", true),
            SchemaField::new("categoria", "Categoria", "text", true),
            SchemaField::new("observacoes", "Observações", "text", false),
        ],
    )
}

async fn create_form(harness: &Harness, token: &str, schema: &Schema, data: Value) -> Value {
    let response = harness
        .send(json_request(
            Method::POST,
            "/api/forms",
            Some(token),
            json!({ "title": "CNH do titular", "schemaId": schema.id, "data": data }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

fn form_uri(body: &Value) -> String {
    format!(
        "/api/forms/{}",
        body["form"]["id"].as_str().expect("form id")
    )
}

#[tokio::test]
async fn create_validates_schema_and_data() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Broker);
    let schema = cnh_schema(&harness);

    let missing = harness
        .send(json_request(
            Method::POST,
            "/api/forms",
            Some(&token),
            json!({ "title": "Sem schema" }),
        ))
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let unknown = harness
        .send(json_request(
            Method::POST,
            "/api/forms",
            Some(&token),
            json!({ "title": "x", "schemaId": uuid::Uuid::new_v4() }),
        ))
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let not_object = harness
        .send(json_request(
            Method::POST,
            "/api/forms",
            Some(&token),
            json!({ "title": "x", "schemaId": schema.id, "data": [1, 2] }),
        ))
        .await;
    assert_eq!(not_object.status(), StatusCode::BAD_REQUEST);

    let created = create_form(&harness, &token, &schema, Value::Null).await;
    assert_eq!(created["form"]["status"], "draft");
    assert_eq!(created["form"]["data"], json!({}));
}

#[tokio::test]
async fn detail_embeds_schema_and_creator() {
    let harness = Harness::new();
    let (session, token) = harness.login_as(Role::Broker);
    let schema = cnh_schema(&harness);
    let created = create_form(&harness, &token, &schema, json!({ "categoria": "B" })).await;

    let response = harness.send(get(&form_uri(&created), Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["form"]["schema"]["slug"], "cnh-digital");
    assert_eq!(body["form"]["user"]["email"], session.email);
    assert_eq!(body["form"]["data"]["categoria"], "B");
}

#[tokio::test]
async fn submission_requires_every_required_field() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Insured);
    let schema = cnh_schema(&harness);
    let created = create_form(&harness, &token, &schema, json!({ "categoria": "B" })).await;
    let uri = form_uri(&created);

    let rejected = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&token),
            json!({ "status": "submitted" }),
        ))
        .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(rejected).await;
    assert_eq!(body["error"], "missing required fields: numero_registro");

    let submitted = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&token),
            json!({
                "status": "submitted",
                "data": { "categoria": "B", "numero_registro": "01234567890" }
            }),
        ))
        .await;
    assert_eq!(submitted.status(), StatusCode::OK);
    let body = read_json_body(submitted).await;
    assert_eq!(body["form"]["status"], "submitted");

    let latest = &harness.audit_records()[0];
    assert_eq!(latest.action, AuditAction::Update);
    assert_eq!(latest.details["changes"], json!(["data", "status"]));
}

#[tokio::test]
async fn only_owners_or_moderators_may_edit() {
    let harness = Harness::new();
    let (_, owner) = harness.login_as(Role::Insured);
    let (_, stranger) = harness.login_as(Role::DocAnalyst);
    let (_, admin) = harness.login_as(Role::SecurityAdmin);
    let schema = cnh_schema(&harness);
    let uri = form_uri(&create_form(&harness, &owner, &schema, json!({})).await);

    let patch = |token: &str| {
        json_request(
            Method::PATCH,
            &uri,
            Some(token),
            json!({ "title": "Renomeado" }),
        )
    };
    assert_eq!(
        harness.send(patch(&stranger)).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(harness.send(patch(&admin)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn only_draft_forms_can_be_deleted() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Insured);
    let schema = cnh_schema(&harness);

    let draft = create_form(&harness, &token, &schema, json!({})).await;
    let draft_id = uuid::Uuid::parse_str(draft["form"]["id"].as_str().expect("id")).expect("uuid");
    let response = harness.send(delete(&form_uri(&draft), &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["success"], true);
    assert!(harness.store.fetch_form(draft_id).expect("fetch").is_none());

    let latest = &harness.audit_records()[0];
    assert_eq!(latest.action, AuditAction::Delete);
    assert_eq!(latest.resource, AuditResource::Form);
    assert_eq!(latest.resource_id, draft_id.to_string());

    let submitted = create_form(
        &harness,
        &token,
        &schema,
        json!({ "numero_registro": "1", "categoria": "AB" }),
    )
    .await;
    let uri = form_uri(&submitted);
    harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&token),
            json!({ "status": "submitted" }),
        ))
        .await;

    let refused = harness.send(delete(&uri, &token)).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(refused).await;
    assert_eq!(body["error"], "only draft forms can be deleted");

    assert_eq!(
        harness.send(delete(&uri, "bogus")).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn listing_shows_own_forms_with_pagination() {
    let harness = Harness::new();
    let (_, token) = harness.login_as(Role::Broker);
    let (_, other) = harness.login_as(Role::Broker);
    let schema = cnh_schema(&harness);
    create_form(&harness, &token, &schema, json!({})).await;
    create_form(&harness, &other, &schema, json!({})).await;

    let response = harness.send(get("/api/forms", Some(&token))).await;
    let body = read_json_body(response).await;
    assert_eq!(body["forms"].as_array().expect("forms").len(), 1);
    assert_eq!(body["forms"][0]["schema"]["slug"], "cnh-digital");
    assert_eq!(body["pagination"]["limit"], 20);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn reviewed_forms_cannot_be_reopened_or_deleted() {
    let harness = Harness::new();
    let (_, owner) = harness.login_as(Role::Insured);
    let (_, validator) = harness.login_as(Role::Validator);
    let schema = cnh_schema(&harness);
    let uri = form_uri(
        &create_form(
            &harness,
            &owner,
            &schema,
            json!({ "numero_registro": "1", "categoria": "B" }),
        )
        .await,
    );
    let patch = |token: &str, status: &str| {
        json_request(
            Method::PATCH,
            &uri,
            Some(token),
            json!({ "status": status }),
        )
    };

    assert_eq!(
        harness.send(patch(&owner, "approved")).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        harness.send(patch(&validator, "approved")).await.status(),
        StatusCode::CONFLICT,
        "drafts are submitted before review"
    );

    assert_eq!(
        harness.send(patch(&owner, "submitted")).await.status(),
        StatusCode::OK
    );
    let approved = harness.send(patch(&validator, "approved")).await;
    assert_eq!(approved.status(), StatusCode::OK);
    assert_eq!(read_json_body(approved).await["form"]["status"], "approved");

    let reopened = harness.send(patch(&owner, "draft")).await;
    assert_eq!(reopened.status(), StatusCode::CONFLICT);
    assert_eq!(
        read_json_body(reopened).await["error"],
        "cannot move form from approved to draft"
    );

    assert_eq!(
        harness.send(delete(&uri, &owner)).await.status(),
        StatusCode::FORBIDDEN
    );
    let latest = &harness.audit_records()[0];
    assert_eq!(latest.action, AuditAction::Update);
    assert_eq!(latest.details["changes"], json!(["status"]));

    let foreign_edit = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&validator),
            json!({ "title": "Renomeado", "status": "approved" }),
        ))
        .await;
    assert_eq!(foreign_edit.status(), StatusCode::FORBIDDEN);
}
