use async_trait::async_trait;
use memo_types::{
    MemoError, MemoryChanges, MemoryEntry, MemoryInsert, Result, ScoredMemory, StorageBackend,
    VectorSearch,
};
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use reqwest::Method;

use crate::config::StoreConfig;
use crate::rest::{eq, is_no_rows, parse_content_range, RestClient, SINGLE_OBJECT};

const MEMORY_TABLE: &str = "memory_entries";
const SEARCH_PROCEDURE: &str = "rpc/search_memories";

/// 列表返回的列（不含 embedding）
const LIST_COLUMNS: &str =
    "id,title,content,category,tags,user_id,organization_id,topic_id,created_at,updated_at,access_count";

/// 基于 PostgREST 兼容 API 的远程记忆存储客户端
#[derive(Clone)]
pub struct RemoteStorageClient {
    rest: RestClient,
}

impl RemoteStorageClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn connect(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(RestClient::new(config)?))
    }
}

#[async_trait]
impl StorageBackend for RemoteStorageClient {
    async fn insert(&self, record: MemoryInsert) -> Result<MemoryEntry> {
        tracing::debug!(
            "Inserting memory '{}' ({}d vector)",
            record.memory.title,
            record.embedding.len()
        );

        let request = self
            .rest
            .request(Method::POST, MEMORY_TABLE)?
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&record);

        self.rest.send_json(request).await
    }

    async fn find_by_id(&self, id: &str, organization_id: &str) -> Result<Option<MemoryEntry>> {
        let request = self
            .rest
            .request(Method::GET, MEMORY_TABLE)?
            .query(&[
                ("id", eq(id)),
                ("organization_id", eq(organization_id)),
                ("select", "*".to_string()),
            ])
            .header(ACCEPT, SINGLE_OBJECT);

        match self.rest.send_json(request).await {
            Ok(entry) => Ok(Some(entry)),
            Err(err) if is_no_rows(&err) => {
                tracing::debug!("Memory {} not found in {}", id, organization_id);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, id: &str, changes: MemoryChanges) -> Result<MemoryEntry> {
        tracing::debug!(
            "Updating memory {} (new embedding: {})",
            id,
            changes.embedding.is_some()
        );

        let request = self
            .rest
            .request(Method::PATCH, MEMORY_TABLE)?
            .query(&[("id", eq(id)), ("select", "*".to_string())])
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&changes);

        self.rest.send_json(request).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self
            .rest
            .request(Method::DELETE, MEMORY_TABLE)?
            .query(&[("id", eq(id))]);

        self.rest.send(request).await?;
        Ok(())
    }

    async fn count(&self, organization_id: &str) -> Result<usize> {
        let request = self
            .rest
            .request(Method::HEAD, MEMORY_TABLE)?
            .query(&[
                ("organization_id", eq(organization_id)),
                ("select", "id".to_string()),
            ])
            .header("Prefer", "count=exact");

        let response = self.rest.send(request).await?;
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| MemoError::storage("Count response has no Content-Range header"))?;

        parse_content_range(range)
            .ok_or_else(|| MemoError::storage(format!("Unexpected Content-Range: {}", range)))
    }

    async fn search_by_vector(&self, search: VectorSearch) -> Result<Vec<ScoredMemory>> {
        tracing::debug!(
            "Similarity search in {}: threshold={}, limit={}",
            search.organization_id,
            search.match_threshold,
            search.match_count
        );

        let request = self
            .rest
            .request(Method::POST, SEARCH_PROCEDURE)?
            .json(&search);

        let results: Vec<ScoredMemory> = self.rest.send_json(request).await?;
        Ok(ScoredMemory::rank(results))
    }

    async fn list(&self, organization_id: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        let request = self
            .rest
            .request(Method::GET, MEMORY_TABLE)?
            .query(&[
                ("organization_id", eq(organization_id)),
                ("select", LIST_COLUMNS.to_string()),
                ("order", "updated_at.desc".to_string()),
                ("limit", limit.to_string()),
            ]);

        self.rest.send_json(request).await
    }
}
