use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use super::common::*;
use crate::audit::AuditAction;
use crate::auth::Role;

fn rg_payload() -> Value {
    json!({
        "name": "RG Nacional",
        "slug": "rg-nacional",
        "description": "Carteira de identidade",
        "status": "active",
        "fields": [
            { "id": "nome", "label": "Nome completo", "required": true },
            { "id": "data_nascimento", "label": "Nascimento", "type": "date", "required": true },
            { "id": "naturalidade", "label": "Naturalidade" }
        ]
    })
}

async fn create_rg(harness: &Harness, token: &str) -> Value {
    let response = harness
        .send(json_request(Method::POST, "/api/schemas", Some(token), rg_payload()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

#[tokio::test]
async fn creation_is_limited_to_schema_writers() {
    let harness = Harness::new();
    let (_, broker) = harness.login_as(Role::Broker);
    let (_, creator) = harness.login_as(Role::TemplateCreator);

    let denied = harness
        .send(json_request(Method::POST, "/api/schemas", Some(&broker), rg_payload()))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let body = create_rg(&harness, &creator).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["schema"]["version"], "1.0.0");
    assert_eq!(body["schema"]["status"], "active");
    assert_eq!(body["schema"]["fields"][0]["type"], "text");
    assert_eq!(body["schema"]["fields"][2]["required"], false);

    let latest = &harness.audit_records()[0];
    assert_eq!(latest.action, AuditAction::Create);
    assert_eq!(latest.details["fieldCount"], 3);
}

#[tokio::test]
async fn creation_validates_slug_fields_and_uniqueness() {
    let harness = Harness::new();
    let (_, admin) = harness.login_as(Role::SecurityAdmin);
    create_rg(&harness, &admin).await;

    let duplicate = harness
        .send(json_request(Method::POST, "/api/schemas", Some(&admin), rg_payload()))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let mut bad_slug = rg_payload();
    bad_slug["slug"] = json!("RG Nacional");
    let response = harness
        .send(json_request(Method::POST, "/api/schemas", Some(&admin), bad_slug))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut repeated = rg_payload();
    repeated["slug"] = json!("rg-v2");
    repeated["fields"] = json!([
        { "id": "nome", "label": "Nome" },
        { "id": "nome", "label": "Nome de novo" }
    ]);
    let response = harness
        .send(json_request(Method::POST, "/api/schemas", Some(&admin), repeated))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await["error"],
        "duplicate field id: nome"
    );
}

#[tokio::test]
async fn changing_fields_snapshots_and_bumps_the_version() {
    let harness = Harness::new();
    let (_, creator) = harness.login_as(Role::TemplateCreator);
    let created = create_rg(&harness, &creator).await;
    let uri = format!(
        "/api/schemas/{}",
        created["schema"]["id"].as_str().expect("schema id")
    );

    let updated = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&creator),
            json!({ "fields": [{ "id": "nome", "label": "Nome", "required": true }] }),
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = read_json_body(updated).await;
    assert_eq!(body["schema"]["version"], "1.0.1");

    let renamed = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&creator),
            json!({ "name": "RG", "version": "2.0.0" }),
        ))
        .await;
    assert_eq!(read_json_body(renamed).await["schema"]["version"], "2.0.0");

    let detail = read_json_body(harness.send(get(&uri, Some(&creator))).await).await;
    assert_eq!(detail["schema"]["name"], "RG");
    assert_eq!(detail["schema"]["counts"]["versions"], 1);
    assert_eq!(detail["schema"]["versions"][0]["version"], "1.0.0");
    assert_eq!(
        detail["schema"]["versions"][0]["fields"]
            .as_array()
            .expect("fields")
            .len(),
        3
    );

    let bad_version = harness
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&creator),
            json!({ "version": "v2" }),
        ))
        .await;
    assert_eq!(bad_version.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_by_status_and_search() {
    let harness = Harness::new();
    let (_, admin) = harness.login_as(Role::SecurityAdmin);
    create_rg(&harness, &admin).await;
    let mut draft = rg_payload();
    draft["slug"] = json!("apolice-saude");
    draft["name"] = json!("Apólice Saúde");
    draft["status"] = json!("draft");
    harness
        .send(json_request(Method::POST, "/api/schemas", Some(&admin), draft))
        .await;

    let all = read_json_body(harness.send(get("/api/schemas", Some(&admin))).await).await;
    assert_eq!(all["schemas"].as_array().expect("schemas").len(), 2);

    let active = read_json_body(
        harness
            .send(get("/api/schemas?status=active", Some(&admin)))
            .await,
    )
    .await;
    assert_eq!(active["schemas"].as_array().expect("schemas").len(), 1);
    assert_eq!(active["schemas"][0]["slug"], "rg-nacional");
    assert_eq!(active["schemas"][0]["counts"]["forms"], 0);

    let searched = read_json_body(
        harness
            .send(get("/api/schemas?search=SAUDE", Some(&admin)))
            .await,
    )
    .await;
    assert_eq!(searched["schemas"][0]["slug"], "apolice-saude");

    assert_eq!(
        harness.send(get("/api/schemas", None)).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn unknown_schemas_are_not_found() {
    let harness = Harness::new();
    let (_, admin) = harness.login_as(Role::SecurityAdmin);
    let uri = format!("/api/schemas/{}", uuid::Uuid::new_v4());
    assert_eq!(
        harness.send(get(&uri, Some(&admin))).await.status(),
        StatusCode::NOT_FOUND
    );
    let response = harness
        .send(json_request(Method::PATCH, &uri, Some(&admin), json!({ "name": "x" })))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
