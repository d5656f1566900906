use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::ServiceError;

pub const INITIAL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaStatus {
    Draft,
    Active,
    Deprecated,
}

impl SchemaStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }

    pub(crate) fn parse_required(raw: &str) -> Result<Self, ServiceError> {
        Self::parse(raw)
            .ok_or_else(|| ServiceError::validation(format!("unknown schema status: {raw}")))
    }
}

fn default_field_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
}

impl SchemaField {
    pub fn new(id: &str, label: &str, field_type: &str, required: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type: field_type.to_string(),
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub fields: Vec<SchemaField>,
    pub status: SchemaStatus,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schema {
    pub fn new(name: &str, slug: &str, fields: Vec<SchemaField>, status: SchemaStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            slug: slug.trim().to_string(),
            description: None,
            fields,
            status,
            version: INITIAL_VERSION.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }

    /// Required field ids absent (or null/blank) in `data`.
    pub fn missing_required(&self, data: &serde_json::Value) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .filter(|field| match data.get(&field.id) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(value)) => value.trim().is_empty(),
                Some(_) => false,
            })
            .map(|field| field.id.clone())
            .collect()
    }
}

/// Snapshot of a previous field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    pub id: Uuid,
    pub schema_id: Uuid,
    pub version: String,
    pub fields: Vec<SchemaField>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaFilter {
    pub status: Option<SchemaStatus>,
    pub search: Option<String>,
}

impl SchemaFilter {
    pub fn matches(&self, schema: &Schema) -> bool {
        let status_matches = self.status.map_or(true, |status| schema.status == status);
        let search_matches = self.search.as_deref().map_or(true, |search| {
            let needle = search.to_lowercase();
            schema.name.to_lowercase().contains(&needle)
                || schema.slug.to_lowercase().contains(&needle)
        });
        status_matches && search_matches
    }
}

/// Slugs are non-empty runs of lowercase ASCII letters, digits, and hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn validate_fields(fields: &[SchemaField]) -> Result<(), ServiceError> {
    let mut seen = HashSet::new();
    for field in fields {
        let id = field.id.trim();
        if id.is_empty() {
            return Err(ServiceError::validation("every field needs an id"));
        }
        if !seen.insert(id) {
            return Err(ServiceError::validation(format!("duplicate field id: {id}")));
        }
    }
    Ok(())
}

pub fn parse_version(raw: &str) -> Option<(u64, u64, u64)> {
    let mut parts = raw.trim().split('.').map(|part| part.parse::<u64>().ok());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Some(major)), Some(Some(minor)), Some(Some(patch)), None) => {
            Some((major, minor, patch))
        }
        _ => None,
    }
}

pub fn bump_patch(version: &str) -> String {
    match parse_version(version) {
        Some((major, minor, patch)) => format!("{major}.{minor}.{}", patch + 1),
        None => INITIAL_VERSION.to_string(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSchemaRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<SchemaField>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSchemaRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::intake::double_option")]
    pub description: Option<Option<String>>,
    pub fields: Option<Vec<SchemaField>>,
    pub status: Option<String>,
    pub version: Option<String>,
}

impl UpdateSchemaRequest {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("fields", self.fields.is_some()),
            ("status", self.status.is_some()),
            ("version", self.version.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCounts {
    pub documents: usize,
    pub forms: usize,
    pub versions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaListItem {
    #[serde(flatten)]
    pub schema: Schema,
    pub counts: SchemaCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDetail {
    #[serde(flatten)]
    pub schema: Schema,
    pub versions: Vec<SchemaVersion>,
    pub counts: SchemaCounts,
}
