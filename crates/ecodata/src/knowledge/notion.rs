use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{KnowledgeBase, KnowledgeError, KnowledgePage, KnowledgeQuery};
use crate::config::KnowledgeConfig;

const NOTION_API: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const MAX_BLOCK_CHARS: usize = 2000;

/// Notion REST client. Pages are created under the configured knowledge base page.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    knowledge_base_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

impl NotionClient {
    pub fn new(
        api_token: Option<String>,
        knowledge_base_id: Option<String>,
    ) -> Result<Self, KnowledgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: NOTION_API.to_string(),
            api_token,
            knowledge_base_id,
        })
    }

    pub fn from_config(config: &KnowledgeConfig) -> Result<Self, KnowledgeError> {
        Self::new(config.api_token.clone(), config.knowledge_base_id.clone())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, KnowledgeError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or(KnowledgeError::NotConfigured("NOTION_API_TOKEN"))?;

        Ok(self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION))
    }
}

#[async_trait]
impl KnowledgeBase for NotionClient {
    async fn search(&self, query: &KnowledgeQuery) -> Result<Vec<Value>, KnowledgeError> {
        let mut body = json!({
            "query": query.query,
            "page_size": query.page_size,
        });
        if let Some(filter) = query.filter {
            body["filter"] = json!({ "property": "object", "value": filter });
        }

        let response = self.post("search")?.json(&body).send().await?;
        if !response.status().is_success() {
            return Err(KnowledgeError::Status {
                operation: "search",
                status: response.status().as_u16(),
            });
        }

        let payload: SearchResponse = response.json().await?;
        debug!(query = %query.query, results = payload.results.len(), "knowledge search");
        Ok(payload.results)
    }

    async fn create_page(&self, page: &KnowledgePage) -> Result<String, KnowledgeError> {
        let parent = self
            .knowledge_base_id
            .as_deref()
            .ok_or(KnowledgeError::NotConfigured("NOTION_KNOWLEDGE_BASE_ID"))?;

        let body = json!({
            "parent": { "page_id": parent },
            "properties": {
                "title": { "title": [{ "text": { "content": page.title } }] },
            },
            "children": build_blocks(&page.content, &page.tags),
        });

        let response = self.post("pages")?.json(&body).send().await?;
        if !response.status().is_success() {
            return Err(KnowledgeError::Status {
                operation: "create page",
                status: response.status().as_u16(),
            });
        }

        let created: CreatedPage = response.json().await?;
        Ok(created.id)
    }
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Page body blocks: an optional tag callout, then one paragraph per blank-line separated
/// chunk of content, each at most 2000 characters.
pub fn build_blocks(content: &str, tags: &[String]) -> Vec<Value> {
    let mut blocks = Vec::new();

    if !tags.is_empty() {
        blocks.push(json!({
            "object": "block",
            "type": "callout",
            "callout": {
                "icon": { "type": "emoji", "emoji": "🏷️" },
                "rich_text": rich_text(&format!("Tags: {}", tags.join(", "))),
            },
        }));
    }

    for paragraph in content.split("\n\n").filter(|paragraph| !paragraph.is_empty()) {
        for chunk in chunk_text(paragraph, MAX_BLOCK_CHARS) {
            blocks.push(json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text(&chunk) },
            }));
        }
    }

    blocks
}

/// Splits on character boundaries into pieces of at most `max_chars` characters.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars || max_chars == 0 {
        return vec![text.to_string()];
    }
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
