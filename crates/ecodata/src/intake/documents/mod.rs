//! Document upload, inline extraction, and the review workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Document, DocumentDetail, DocumentFilter, DocumentListItem, DocumentPage, DocumentQuery,
    DocumentStatus, Extraction, UpdateDocumentRequest, UploadOutcome, UploadedFile,
};
pub use repository::{DocumentRepository, ExtractionRepository};
pub use router::document_router;
pub use service::DocumentService;
