use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{KnowledgeBase, KnowledgePage, KnowledgeQuery, SearchFilter};
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::UserSession;
use crate::error::ServiceError;
use crate::intake::present;

const SEARCH_PAGE_SIZE: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeSearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KnowledgeSearch {
    pub results: Vec<Value>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePageRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub struct KnowledgeService {
    base: Arc<dyn KnowledgeBase>,
    audit: AuditTrail,
}

impl KnowledgeService {
    pub fn new(base: Arc<dyn KnowledgeBase>, audit: AuditTrail) -> Self {
        Self { base, audit }
    }

    pub async fn search(&self, query: KnowledgeSearchQuery) -> Result<KnowledgeSearch, ServiceError> {
        let text = present(query.q.as_deref())
            .ok_or_else(|| ServiceError::validation("query parameter 'q' is required"))?;
        let filter = match present(query.kind.as_deref()) {
            Some(raw) => Some(
                SearchFilter::parse(raw)
                    .ok_or_else(|| ServiceError::validation("type must be page or data_source"))?,
            ),
            None => None,
        };

        let results = self
            .base
            .search(&KnowledgeQuery {
                query: text.to_string(),
                filter,
                page_size: SEARCH_PAGE_SIZE,
            })
            .await?;

        Ok(KnowledgeSearch {
            total: results.len(),
            results,
        })
    }

    pub async fn create_page(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        request: CreatePageRequest,
    ) -> Result<String, ServiceError> {
        let (Some(title), Some(content)) = (
            present(request.title.as_deref()),
            present(request.content.as_deref()),
        ) else {
            return Err(ServiceError::validation("title and content are required"));
        };

        let tags: Vec<String> = request
            .tags
            .iter()
            .filter_map(|tag| present(Some(tag)))
            .map(str::to_string)
            .collect();

        let page_id = self
            .base
            .create_page(&KnowledgePage {
                title: title.to_string(),
                content: content.to_string(),
                tags: tags.clone(),
            })
            .await?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Create, AuditResource::KnowledgePage, &page_id)
                .with_details(json!({ "title": title, "tags": tags })),
        )?;

        info!(user_id = %session.user_id, page_id = %page_id, "knowledge page created");
        Ok(page_id)
    }
}
