use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{
    Document, DocumentDetail, DocumentFilter, DocumentListItem, DocumentPage, DocumentQuery,
    DocumentStatus, Extraction, UpdateDocumentRequest, UploadOutcome, UploadedFile,
};
use super::repository::{DocumentRepository, ExtractionRepository};
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::{authorize, Permission, UserSession};
use crate::error::ServiceError;
use crate::extraction::TextExtractionService;
use crate::intake::present;
use crate::intake::schemas::{SchemaRepository, SchemaSummary};
use crate::pagination::PageRequest;

const FALLBACK_MIME: &str = "application/octet-stream";
const EXTRACTION_WARNING: &str = "document stored but extraction failed; try again";

/// Upload, extraction, and review of documents.
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    extractions: Arc<dyn ExtractionRepository>,
    schemas: Arc<dyn SchemaRepository>,
    extractor: Arc<TextExtractionService>,
    audit: AuditTrail,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        extractions: Arc<dyn ExtractionRepository>,
        schemas: Arc<dyn SchemaRepository>,
        extractor: Arc<TextExtractionService>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            documents,
            extractions,
            schemas,
            extractor,
            audit,
        }
    }

    pub fn list(
        &self,
        session: &UserSession,
        query: &DocumentQuery,
    ) -> Result<DocumentPage, ServiceError> {
        let filter = DocumentFilter {
            owner: Some(session.user_id),
            status: present(query.status.as_deref())
                .map(DocumentStatus::parse_required)
                .transpose()?,
        };
        let window = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref(), 20, 50);

        let documents = self
            .documents
            .list_documents(&filter, window.offset(), window.limit)?
            .into_iter()
            .map(|document| {
                let schema = self.schema_summary(document.schema_id)?;
                let extraction_count = self.extractions.count_extractions(document.id)?;
                Ok(DocumentListItem {
                    document,
                    schema,
                    extraction_count,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;
        let total = self.documents.count_documents(&filter)?;

        Ok(DocumentPage {
            documents,
            pagination: window.describe(total),
        })
    }

    /// Stores the document, audits the upload, and runs extraction inline. The response is
    /// always a success once the document is stored; failed extractions leave it pending
    /// and attach a warning.
    pub async fn upload(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        file: UploadedFile,
        schema_id: Option<String>,
    ) -> Result<UploadOutcome, ServiceError> {
        let schema_id = self.resolve_schema_id(schema_id.as_deref())?;

        let filename = present(Some(&file.filename)).unwrap_or("upload").to_string();
        let mime_type = present(file.content_type.as_deref())
            .map(str::to_string)
            .or_else(|| {
                mime_guess::from_path(&filename)
                    .first_raw()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let mut document = self.documents.insert_document(Document::new(
            &filename,
            &mime_type,
            file.bytes.len() as u64,
            session.user_id,
            schema_id,
        ))?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Upload, AuditResource::Document, document.id)
                .with_details(json!({
                    "filename": document.filename,
                    "mimeType": document.mime_type,
                    "size": document.size_bytes,
                })),
        )?;

        let result = self.extractor.extract(&file.bytes, &mime_type).await;
        let succeeded = result.is_success();
        let engine = result.engine;

        let extraction = match self
            .extractions
            .insert_extraction(Extraction::from_result(document.id, session.user_id, result))
        {
            Ok(extraction) => Some(extraction),
            Err(err) => {
                warn!(document_id = %document.id, error = %err, "unable to persist extraction");
                None
            }
        };

        let mut warning = None;
        if succeeded && extraction.is_some() {
            let mut extracted = document.clone();
            extracted.status = DocumentStatus::Extracted;
            extracted.updated_at = Utc::now();
            match self.documents.update_document(extracted.clone()) {
                Ok(()) => document = extracted,
                Err(err) => {
                    warn!(document_id = %document.id, error = %err, "unable to mark document extracted");
                    warning = Some(EXTRACTION_WARNING.to_string());
                }
            }
        } else {
            warn!(document_id = %document.id, engine = %engine, "extraction did not produce text");
            warning = Some(EXTRACTION_WARNING.to_string());
        }

        info!(
            document_id = %document.id,
            engine = %engine,
            status = document.status.label(),
            "document uploaded"
        );

        Ok(UploadOutcome {
            success: true,
            document,
            extraction,
            warning,
        })
    }

    pub fn get(&self, session: &UserSession, id: Uuid) -> Result<DocumentDetail, ServiceError> {
        let document = self.fetch(id)?;
        ensure_owner_or_reviewer(session, &document)?;

        let schema = self.schema_summary(document.schema_id)?;
        let extractions = self.extractions.extractions_for_document(document.id)?;

        Ok(DocumentDetail {
            document,
            schema,
            extractions,
        })
    }

    pub fn update(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        id: Uuid,
        request: UpdateDocumentRequest,
    ) -> Result<Document, ServiceError> {
        let status = request
            .status
            .as_deref()
            .map(DocumentStatus::parse_required)
            .transpose()?;

        let mut document = self.fetch(id)?;
        ensure_owner_or_reviewer(session, &document)?;
        if status.is_some_and(DocumentStatus::is_review) {
            authorize(session, Permission::DocumentReview)?;
        }

        let previous_status = document.status;
        if let Some(next) = status {
            if !previous_status.can_transition_to(next) {
                return Err(ServiceError::conflict(format!(
                    "cannot move document from {} to {}",
                    previous_status.label(),
                    next.label()
                )));
            }
            document.status = next;
        }

        if let Some(schema_id) = &request.schema_id {
            document.schema_id = self.resolve_schema_id(schema_id.as_deref())?;
        }
        if let Some(metadata) = &request.metadata {
            document.metadata = metadata.clone();
        }

        document.updated_at = Utc::now();
        self.documents.update_document(document.clone())?;

        let action = status.map_or(AuditAction::Update, DocumentStatus::audit_action);
        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(action, AuditResource::Document, document.id).with_details(json!({
                "changes": request.changed_keys(),
                "previousStatus": previous_status,
            })),
        )?;

        info!(document_id = %document.id, action = %action, "document updated");
        Ok(document)
    }

    fn fetch(&self, id: Uuid) -> Result<Document, ServiceError> {
        self.documents
            .fetch_document(id)?
            .ok_or(ServiceError::NotFound("document"))
    }

    fn resolve_schema_id(&self, raw: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
        let Some(raw) = present(raw) else {
            return Ok(None);
        };
        let id = Uuid::parse_str(raw)
            .map_err(|_| ServiceError::validation("schemaId must be a valid id"))?;
        if self.schemas.fetch_schema(id)?.is_none() {
            return Err(ServiceError::NotFound("schema"));
        }
        Ok(Some(id))
    }

    fn schema_summary(&self, schema_id: Option<Uuid>) -> Result<Option<SchemaSummary>, ServiceError> {
        match schema_id {
            Some(id) => Ok(self.schemas.fetch_schema(id)?.map(|schema| schema.summary())),
            None => Ok(None),
        }
    }
}

fn ensure_owner_or_reviewer(session: &UserSession, document: &Document) -> Result<(), ServiceError> {
    if document.uploaded_by == session.user_id {
        Ok(())
    } else {
        authorize(session, Permission::DocumentReview)
    }
}
