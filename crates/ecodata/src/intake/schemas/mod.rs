//! Versioned schemas describing the fields expected in documents and forms.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    bump_patch, is_valid_slug, CreateSchemaRequest, Schema, SchemaCounts, SchemaDetail,
    SchemaField, SchemaFilter, SchemaListItem, SchemaQuery, SchemaStatus, SchemaSummary,
    SchemaVersion, UpdateSchemaRequest,
};
pub use repository::SchemaRepository;
pub use router::schema_router;
pub use service::SchemaService;
