use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::error::ServiceError;
use crate::extraction::{ExtractionEngine, ExtractionResult};
use crate::intake::schemas::SchemaSummary;
use crate::pagination::Pagination;

/// Document lifecycle. Moves forward along pending → extracted → validated → approved;
/// `rejected` is reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Extracted,
    Validated,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(Self::Pending),
            "extracted" => Some(Self::Extracted),
            "validated" => Some(Self::Validated),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub(crate) fn parse_required(raw: &str) -> Result<Self, ServiceError> {
        Self::parse(raw)
            .ok_or_else(|| ServiceError::validation(format!("unknown document status: {raw}")))
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracted => "extracted",
            Self::Validated => "validated",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Extracted => 1,
            Self::Validated => 2,
            Self::Approved => 3,
            Self::Rejected => 4,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Statuses that record a review decision.
    pub const fn is_review(self) -> bool {
        matches!(self, Self::Validated | Self::Approved | Self::Rejected)
    }

    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == Self::Rejected || next.rank() > self.rank()
    }

    pub const fn audit_action(self) -> AuditAction {
        match self {
            Self::Validated => AuditAction::Validate,
            Self::Approved => AuditAction::Approve,
            Self::Rejected => AuditAction::Reject,
            Self::Pending | Self::Extracted => AuditAction::Update,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub status: DocumentStatus,
    pub uploaded_by: Uuid,
    pub schema_id: Option<Uuid>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        filename: &str,
        mime_type: &str,
        size_bytes: u64,
        uploaded_by: Uuid,
        schema_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes,
            status: DocumentStatus::Pending,
            uploaded_by,
            schema_id,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One extraction attempt against a document, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub id: Uuid,
    pub document_id: Uuid,
    pub extracted_by: Uuid,
    pub engine: ExtractionEngine,
    pub raw_text: Option<String>,
    pub structured: Option<Value>,
    pub confidence: f64,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Extraction {
    pub fn from_result(document_id: Uuid, extracted_by: Uuid, result: ExtractionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            extracted_by,
            engine: result.engine,
            raw_text: result.raw_text,
            structured: result.structured,
            confidence: result.confidence,
            duration_ms: result.duration_ms,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub owner: Option<Uuid>,
    pub status: Option<DocumentStatus>,
}

impl DocumentFilter {
    pub fn matches(&self, document: &Document) -> bool {
        self.owner.map_or(true, |owner| document.uploaded_by == owner)
            && self.status.map_or(true, |status| document.status == status)
    }
}

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "crate::intake::double_option")]
    pub schema_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::intake::double_option")]
    pub metadata: Option<Option<Value>>,
}

impl UpdateDocumentRequest {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        [
            ("status", self.status.is_some()),
            ("schemaId", self.schema_id.is_some()),
            ("metadata", self.metadata.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListItem {
    #[serde(flatten)]
    pub document: Document,
    pub schema: Option<SchemaSummary>,
    pub extraction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentPage {
    pub documents: Vec<DocumentListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub schema: Option<SchemaSummary>,
    pub extractions: Vec<Extraction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub document: Document,
    pub extraction: Option<Extraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;

    #[test]
    fn status_moves_forward_only() {
        assert!(Pending.can_transition_to(Extracted));
        assert!(Extracted.can_transition_to(Validated));
        assert!(Validated.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Validated));

        assert!(!Validated.can_transition_to(Extracted));
        assert!(!Extracted.can_transition_to(Pending));
    }

    #[test]
    fn rejection_is_reachable_until_terminal() {
        for status in [Pending, Extracted, Validated] {
            assert!(status.can_transition_to(Rejected), "{status:?}");
        }
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Pending));
    }

    #[test]
    fn reapplying_the_current_status_is_allowed() {
        for status in [Pending, Extracted, Validated, Approved, Rejected] {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn audit_action_follows_status() {
        assert_eq!(Validated.audit_action(), AuditAction::Validate);
        assert_eq!(Approved.audit_action(), AuditAction::Approve);
        assert_eq!(Rejected.audit_action(), AuditAction::Reject);
        assert_eq!(Extracted.audit_action(), AuditAction::Update);
    }
}
