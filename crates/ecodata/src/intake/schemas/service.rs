use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::domain::{
    bump_patch, is_valid_slug, parse_version, validate_fields, CreateSchemaRequest, Schema,
    SchemaCounts, SchemaDetail, SchemaFilter, SchemaListItem, SchemaQuery, SchemaStatus,
    SchemaVersion, UpdateSchemaRequest,
};
use super::repository::SchemaRepository;
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::{authorize, Permission, UserSession};
use crate::error::ServiceError;
use crate::intake::documents::DocumentRepository;
use crate::intake::forms::FormRepository;
use crate::intake::present;
use crate::persistence::RepositoryError;

const VERSION_HISTORY: usize = 10;

/// Versioned field-definition contracts.
pub struct SchemaService {
    schemas: Arc<dyn SchemaRepository>,
    documents: Arc<dyn DocumentRepository>,
    forms: Arc<dyn FormRepository>,
    audit: AuditTrail,
}

impl SchemaService {
    pub fn new(
        schemas: Arc<dyn SchemaRepository>,
        documents: Arc<dyn DocumentRepository>,
        forms: Arc<dyn FormRepository>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            schemas,
            documents,
            forms,
            audit,
        }
    }

    pub fn list(&self, query: &SchemaQuery) -> Result<Vec<SchemaListItem>, ServiceError> {
        let filter = SchemaFilter {
            status: present(query.status.as_deref())
                .map(SchemaStatus::parse_required)
                .transpose()?,
            search: present(query.search.as_deref()).map(str::to_string),
        };

        self.schemas
            .list_schemas(&filter)?
            .into_iter()
            .map(|schema| {
                let counts = self.counts(schema.id)?;
                Ok(SchemaListItem { schema, counts })
            })
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Result<SchemaDetail, ServiceError> {
        let schema = self
            .schemas
            .fetch_schema(id)?
            .ok_or(ServiceError::NotFound("schema"))?;
        let versions = self.schemas.schema_versions(id, VERSION_HISTORY)?;
        let counts = self.counts(id)?;

        Ok(SchemaDetail {
            schema,
            versions,
            counts,
        })
    }

    pub fn create(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        request: CreateSchemaRequest,
    ) -> Result<Schema, ServiceError> {
        authorize(session, Permission::SchemaWrite)?;

        let (Some(name), Some(slug), Some(fields)) = (
            present(request.name.as_deref()),
            present(request.slug.as_deref()),
            request.fields,
        ) else {
            return Err(ServiceError::validation(
                "name, slug and fields are required",
            ));
        };

        if !is_valid_slug(slug) {
            return Err(ServiceError::validation(
                "slug may only contain lowercase letters, digits and hyphens",
            ));
        }
        validate_fields(&fields)?;

        let status = present(request.status.as_deref())
            .map(SchemaStatus::parse_required)
            .transpose()?
            .unwrap_or(SchemaStatus::Draft);

        if self.schemas.find_schema_by_slug(slug)?.is_some() {
            return Err(ServiceError::conflict("slug already exists"));
        }

        let mut schema = Schema::new(name, slug, fields, status);
        schema.description = present(request.description.as_deref()).map(str::to_string);

        let schema = self.schemas.insert_schema(schema).map_err(|err| match err {
            RepositoryError::Conflict => ServiceError::conflict("slug already exists"),
            other => other.into(),
        })?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Create, AuditResource::Schema, schema.id).with_details(
                json!({
                    "name": schema.name,
                    "slug": schema.slug,
                    "fieldCount": schema.fields.len(),
                }),
            ),
        )?;

        info!(schema_id = %schema.id, slug = %schema.slug, "schema created");
        Ok(schema)
    }

    pub fn update(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        id: Uuid,
        request: UpdateSchemaRequest,
    ) -> Result<Schema, ServiceError> {
        authorize(session, Permission::SchemaWrite)?;

        let mut schema = self
            .schemas
            .fetch_schema(id)?
            .ok_or(ServiceError::NotFound("schema"))?;
        let changes = request.changed_keys();

        if let Some(name) = request.name.as_deref() {
            schema.name = present(Some(name))
                .ok_or_else(|| ServiceError::validation("name cannot be empty"))?
                .to_string();
        }
        if let Some(description) = &request.description {
            schema.description = present(description.as_deref()).map(str::to_string);
        }
        if let Some(status) = request.status.as_deref() {
            schema.status = SchemaStatus::parse_required(status)?;
        }

        let explicit_version = match request.version.as_deref() {
            Some(version) => {
                parse_version(version).ok_or_else(|| {
                    ServiceError::validation("version must be MAJOR.MINOR.PATCH")
                })?;
                Some(version.trim().to_string())
            }
            None => None,
        };

        if let Some(fields) = request.fields {
            validate_fields(&fields)?;
            if fields != schema.fields {
                self.schemas.push_schema_version(SchemaVersion {
                    id: Uuid::new_v4(),
                    schema_id: schema.id,
                    version: schema.version.clone(),
                    fields: std::mem::replace(&mut schema.fields, fields),
                    created_at: Utc::now(),
                })?;
                if explicit_version.is_none() {
                    schema.version = bump_patch(&schema.version);
                }
            }
        }
        if let Some(version) = explicit_version {
            schema.version = version;
        }

        schema.updated_at = Utc::now();
        self.schemas.update_schema(schema.clone())?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Update, AuditResource::Schema, schema.id)
                .with_details(json!({ "changes": changes })),
        )?;

        info!(schema_id = %schema.id, version = %schema.version, "schema updated");
        Ok(schema)
    }

    fn counts(&self, schema_id: Uuid) -> Result<SchemaCounts, RepositoryError> {
        Ok(SchemaCounts {
            documents: self.documents.count_documents_for_schema(schema_id)?,
            forms: self.forms.count_forms_for_schema(schema_id)?,
            versions: self.schemas.count_schema_versions(schema_id)?,
        })
    }
}
