//! Resource services for accounts, documents, forms, schemas, notifications, and the
//! marketplace. Each resource follows the same shape: `domain` types, a storage
//! `repository` trait, a `service` that authenticates, authorizes, validates, persists,
//! and audits, and a `router` exposing it over HTTP.

pub mod accounts;
pub mod documents;
pub mod forms;
pub mod marketplace;
pub mod notifications;
pub mod schemas;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::ServiceError;

/// Path ids that are not valid uuids cannot name a stored record.
pub(crate) fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::NotFound(entity))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
