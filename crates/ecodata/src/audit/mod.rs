//! Append-only audit trail and its restricted listing endpoint.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{AuditAction, AuditEvent, AuditFilter, AuditRecord, AuditResource, ClientInfo};
pub use repository::AuditRepository;
pub use router::audit_router;
pub use service::{ActorSummary, AuditEntryView, AuditPage, AuditQuery, AuditService, AuditTrail};
