use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::intake::schemas::{Schema, SchemaSummary};
use crate::pagination::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl FormStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub(crate) fn parse_required(raw: &str) -> Result<Self, ServiceError> {
        Self::parse(raw)
            .ok_or_else(|| ServiceError::validation(format!("unknown form status: {raw}")))
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Statuses only a reviewer may set.
    pub const fn is_review(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// draft → submitted → approved | rejected. Re-applying the current status is a no-op.
    pub fn can_transition_to(self, next: FormStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (Self::Draft, Self::Submitted)
                    | (Self::Submitted, Self::Approved | Self::Rejected)
            )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    pub schema_id: Uuid,
    pub created_by: Uuid,
    pub data: Value,
    pub status: FormStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    pub fn new(title: &str, schema_id: Uuid, created_by: Uuid, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            schema_id,
            created_by,
            data,
            status: FormStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFilter {
    pub owner: Option<Uuid>,
    pub status: Option<FormStatus>,
}

impl FormFilter {
    pub fn matches(&self, form: &Form) -> bool {
        self.owner.map_or(true, |owner| form.created_by == owner)
            && self.status.map_or(true, |status| form.status == status)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormRequest {
    pub title: Option<String>,
    pub schema_id: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFormRequest {
    pub title: Option<String>,
    pub data: Option<Value>,
    pub status: Option<String>,
}

impl UpdateFormRequest {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("data", self.data.is_some()),
            ("status", self.status.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormListItem {
    #[serde(flatten)]
    pub form: Form,
    pub schema: Option<SchemaSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormPage {
    pub forms: Vec<FormListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSummary {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormDetail {
    #[serde(flatten)]
    pub form: Form,
    pub schema: Option<Schema>,
    pub user: Option<CreatorSummary>,
}
