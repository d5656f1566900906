//! External knowledge base integration: search and page creation behind [`KnowledgeBase`],
//! with a Notion REST implementation.

mod notion;
pub mod router;
pub mod service;

pub use notion::{build_blocks, chunk_text, NotionClient};
pub use router::knowledge_router;
pub use service::{CreatePageRequest, KnowledgeSearch, KnowledgeSearchQuery, KnowledgeService};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Restricts a search to one kind of object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    Page,
    DataSource,
}

impl SearchFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "page" => Some(Self::Page),
            "data_source" => Some(Self::DataSource),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeQuery {
    pub query: String,
    pub filter: Option<SearchFilter>,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgePage {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("knowledge base request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("knowledge base {operation} failed: {status}")]
    Status { operation: &'static str, status: u16 },
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Raw result objects as returned by the remote service.
    async fn search(&self, query: &KnowledgeQuery) -> Result<Vec<Value>, KnowledgeError>;

    /// Returns the id of the created page.
    async fn create_page(&self, page: &KnowledgePage) -> Result<String, KnowledgeError>;
}
