use uuid::Uuid;

use super::domain::{Document, DocumentFilter, Extraction};
use crate::persistence::RepositoryError;

pub trait DocumentRepository: Send + Sync {
    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError>;
    fn fetch_document(&self, id: Uuid) -> Result<Option<Document>, RepositoryError>;
    fn update_document(&self, document: Document) -> Result<(), RepositoryError>;
    /// Newest first.
    fn list_documents(
        &self,
        filter: &DocumentFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Document>, RepositoryError>;
    fn count_documents(&self, filter: &DocumentFilter) -> Result<usize, RepositoryError>;
    fn count_documents_for_schema(&self, schema_id: Uuid) -> Result<usize, RepositoryError>;
}

pub trait ExtractionRepository: Send + Sync {
    /// Fails with [`RepositoryError::NotFound`] when the document does not exist.
    fn insert_extraction(&self, extraction: Extraction) -> Result<Extraction, RepositoryError>;
    /// Newest first.
    fn extractions_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<Extraction>, RepositoryError>;
    fn count_extractions(&self, document_id: Uuid) -> Result<usize, RepositoryError>;
}
