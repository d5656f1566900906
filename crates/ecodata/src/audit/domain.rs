use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// State-changing actions recorded in the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    Upload,
    Validate,
    Approve,
    Reject,
}

impl AuditAction {
    pub const ALL: [AuditAction; 9] = [
        AuditAction::Create,
        AuditAction::Update,
        AuditAction::Delete,
        AuditAction::Login,
        AuditAction::Logout,
        AuditAction::Upload,
        AuditAction::Validate,
        AuditAction::Approve,
        AuditAction::Reject,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Upload => "UPLOAD",
            AuditAction::Validate => "VALIDATE",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resource kinds an audit record can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResource {
    User,
    Document,
    Form,
    Schema,
    Notification,
    MarketplacePurchase,
    KnowledgePage,
}

impl AuditResource {
    pub const fn label(self) -> &'static str {
        match self {
            AuditResource::User => "user",
            AuditResource::Document => "document",
            AuditResource::Form => "form",
            AuditResource::Schema => "schema",
            AuditResource::Notification => "notification",
            AuditResource::MarketplacePurchase => "marketplace_purchase",
            AuditResource::KnowledgePage => "knowledge_page",
        }
    }
}

impl fmt::Display for AuditResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Request origin captured alongside each record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// What happened, before the trail stamps it with actor, origin, and time.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource: AuditResource,
    pub resource_id: String,
    pub details: Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction, resource: AuditResource, resource_id: impl ToString) -> Self {
        Self {
            action,
            resource,
            resource_id: resource_id.to_string(),
            details: Value::Object(Default::default()),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Immutable trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub resource: AuditResource,
    pub resource_id: String,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Conjunctive filter over the trail. `resource` is matched against the label so that
/// unknown names simply match nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub resource: Option<String>,
    pub user_id: Option<Uuid>,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.action.map_or(true, |action| record.action == action)
            && self
                .resource
                .as_deref()
                .map_or(true, |resource| record.resource.label() == resource)
            && self.user_id.map_or(true, |user_id| record.user_id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(action: AuditAction, resource: AuditResource) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            action,
            resource,
            resource_id: "r-1".to_string(),
            details: json!({}),
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn actions_serialize_upper_case() {
        let encoded = serde_json::to_value(AuditAction::Approve).expect("serializes");
        assert_eq!(encoded, json!("APPROVE"));
        assert_eq!(AuditAction::parse("logout"), Some(AuditAction::Logout));
        assert_eq!(AuditAction::parse("PURGE"), None);
    }

    #[test]
    fn filter_is_conjunctive() {
        let upload = record(AuditAction::Upload, AuditResource::Document);
        let filter = AuditFilter {
            action: Some(AuditAction::Upload),
            resource: Some("document".to_string()),
            user_id: None,
        };
        assert!(filter.matches(&upload));

        let wrong_resource = AuditFilter {
            resource: Some("form".to_string()),
            ..filter.clone()
        };
        assert!(!wrong_resource.matches(&upload));

        let wrong_user = AuditFilter {
            user_id: Some(Uuid::new_v4()),
            ..filter
        };
        assert!(!wrong_user.matches(&upload));
    }
}
