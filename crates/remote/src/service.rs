//! 记忆操作：写入和搜索时生成 embedding，其余直接访问存储

use chrono::Utc;
use memo_types::{
    MemoError, MemoryChanges, MemoryEntry, MemoryInsert, MemoryPatch, NewMemory, Result,
    ScoredMemory, SearchOptions, StorageBackend, VectorSearch,
};
use model_provider::EmbedProvider;
use std::sync::Arc;

/// 组合 Embedding Provider 和存储后端的记忆客户端
#[derive(Clone)]
pub struct MemoryService {
    embedder: Arc<dyn EmbedProvider>,
    storage: Arc<dyn StorageBackend>,
}

impl MemoryService {
    pub fn new(embedder: Arc<dyn EmbedProvider>, storage: Arc<dyn StorageBackend>) -> Self {
        Self { embedder, storage }
    }

    pub fn embedder(&self) -> &dyn EmbedProvider {
        self.embedder.as_ref()
    }

    /// 生成内容的 embedding 并保存新记忆
    pub async fn create(&self, memory: NewMemory) -> Result<MemoryEntry> {
        memory.validate()?;

        let embedding = self
            .embedder
            .encode(&memory.content)
            .await
            .map_err(|e| MemoError::Embedding(e.to_string()))?;

        let entry = self.storage.insert(MemoryInsert { memory, embedding }).await?;
        tracing::info!("Created memory {}", entry.id);
        Ok(entry)
    }

    pub async fn get_by_id(&self, id: &str, organization_id: &str) -> Result<Option<MemoryEntry>> {
        self.storage.find_by_id(id, organization_id).await
    }

    /// 应用 patch，只有 patch 包含内容时才重新生成 embedding
    pub async fn update(&self, id: &str, patch: MemoryPatch) -> Result<MemoryEntry> {
        if patch.is_empty() {
            return Err(MemoError::Validation(format!(
                "Nothing to update for memory {}",
                id
            )));
        }

        let embedding = match patch.content.as_deref() {
            Some(content) => Some(
                self.embedder
                    .encode(content)
                    .await
                    .map_err(|e| MemoError::Embedding(e.to_string()))?,
            ),
            None => None,
        };

        let changes = MemoryChanges {
            patch,
            embedding,
            updated_at: Utc::now(),
        };

        self.storage.update(id, changes).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.storage.delete(id).await?;
        tracing::info!("Deleted memory {}", id);
        Ok(())
    }

    /// 租户内的语义搜索，最匹配的在前
    pub async fn search(
        &self,
        query: &str,
        organization_id: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredMemory>> {
        options
            .validate()
            .map_err(|e| MemoError::Search(e.message().to_string()))?;
        if query.trim().is_empty() {
            return Err(MemoError::Search("Query text is empty".to_string()));
        }

        let embedding = self
            .embedder
            .encode(query)
            .await
            .map_err(|e| MemoError::Search(format!("Failed to embed query: {}", e)))?;

        let results = self
            .storage
            .search_by_vector(VectorSearch::new(embedding, organization_id, options))
            .await
            .map_err(|e| MemoError::Search(e.to_string()))?;

        tracing::debug!("Search returned {} results", results.len());
        Ok(ScoredMemory::rank(results))
    }

    pub async fn count(&self, organization_id: &str) -> Result<usize> {
        self.storage.count(organization_id).await
    }

    pub async fn list(&self, organization_id: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        self.storage.list(organization_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use memo_types::MemoryCategory;
    use std::sync::Mutex;

    /// 记录每条要生成 embedding 的文本
    #[derive(Default)]
    struct RecordingEmbedder {
        inputs: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingEmbedder {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn inputs(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbedProvider for RecordingEmbedder {
        async fn encode(&self, text: &str) -> Result<Vec<f32>> {
            self.inputs.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(MemoError::Provider("quota exceeded".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.encode(text).await?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "test-embed"
        }
    }

    #[derive(Debug, Clone)]
    enum Call {
        Insert(Vec<f32>),
        Update(Option<Vec<f32>>, MemoryPatch),
        Search(VectorSearch),
        Delete(String),
    }

    /// 记录调用的内存后端
    #[derive(Default)]
    struct RecordingStorage {
        calls: Mutex<Vec<Call>>,
        hits: Vec<ScoredMemory>,
        fail_with: Option<String>,
    }

    impl RecordingStorage {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self) -> Result<()> {
            match &self.fail_with {
                Some(msg) => Err(MemoError::Storage {
                    status: Some(500),
                    code: None,
                    message: msg.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    fn stored(memory: &NewMemory, embedding: Option<Vec<f32>>) -> MemoryEntry {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        MemoryEntry {
            id: "m1".to_string(),
            title: memory.title.clone(),
            content: memory.content.clone(),
            category: memory.category,
            tags: memory.tags.clone(),
            embedding,
            user_id: memory.user_id.clone(),
            organization_id: memory.organization_id.clone(),
            topic_id: memory.topic_id.clone(),
            created_at: ts,
            updated_at: ts,
            access_count: 0,
        }
    }

    #[async_trait]
    impl StorageBackend for RecordingStorage {
        async fn insert(&self, record: MemoryInsert) -> Result<MemoryEntry> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Insert(record.embedding.clone()));
            self.check()?;
            Ok(stored(&record.memory, Some(record.embedding)))
        }

        async fn find_by_id(&self, _id: &str, _org: &str) -> Result<Option<MemoryEntry>> {
            self.check()?;
            Ok(None)
        }

        async fn update(&self, _id: &str, changes: MemoryChanges) -> Result<MemoryEntry> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(changes.embedding.clone(), changes.patch.clone()));
            self.check()?;
            let base = NewMemory::new("t", "c", "u1", "org1");
            Ok(stored(&base, changes.embedding))
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete(id.to_string()));
            self.check()
        }

        async fn count(&self, _org: &str) -> Result<usize> {
            self.check()?;
            Ok(self.hits.len())
        }

        async fn search_by_vector(&self, search: VectorSearch) -> Result<Vec<ScoredMemory>> {
            self.calls.lock().unwrap().push(Call::Search(search));
            self.check()?;
            Ok(self.hits.clone())
        }

        async fn list(&self, _org: &str, _limit: usize) -> Result<Vec<MemoryEntry>> {
            self.check()?;
            Ok(vec![])
        }
    }

    fn service(
        embedder: RecordingEmbedder,
        storage: RecordingStorage,
    ) -> (MemoryService, Arc<RecordingEmbedder>, Arc<RecordingStorage>) {
        let embedder = Arc::new(embedder);
        let storage = Arc::new(storage);
        (
            MemoryService::new(embedder.clone(), storage.clone()),
            embedder,
            storage,
        )
    }

    fn hit(id: &str, score: f32) -> ScoredMemory {
        ScoredMemory {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: format!("content of {}", id),
            category: Some(MemoryCategory::Knowledge),
            tags: vec![],
            updated_at: None,
            score,
        }
    }

    #[tokio::test]
    async fn test_create_embeds_content_once() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::default(), RecordingStorage::default());

        let entry = svc
            .create(NewMemory::new("t", "c", "u1", "org1"))
            .await
            .unwrap();

        assert_eq!(embedder.inputs(), vec!["c"]);
        match storage.calls().as_slice() {
            [Call::Insert(embedding)] => assert_eq!(embedding, &vec![1.0, 1.0]),
            other => panic!("unexpected calls: {:?}", other),
        }
        assert_eq!(entry.id, "m1");
        assert_eq!(entry.embedding, Some(vec![1.0, 1.0]));
    }

    #[tokio::test]
    async fn test_create_embedding_failure_skips_insert() {
        let (svc, _, storage) = service(RecordingEmbedder::failing(), RecordingStorage::default());

        let err = svc
            .create(NewMemory::new("t", "c", "u1", "org1"))
            .await
            .unwrap_err();

        assert!(matches!(err, MemoError::Embedding(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_storage_failure_is_storage_error() {
        let storage = RecordingStorage {
            fail_with: Some("insert rejected".to_string()),
            ..Default::default()
        };
        let (svc, _, _) = service(RecordingEmbedder::default(), storage);

        let err = svc
            .create(NewMemory::new("t", "c", "u1", "org1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_update_metadata_never_embeds() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::default(), RecordingStorage::default());

        let patch = MemoryPatch {
            title: Some("renamed".to_string()),
            tags: Some(vec!["x".to_string()]),
            ..Default::default()
        };
        svc.update("m1", patch).await.unwrap();

        assert!(embedder.inputs().is_empty());
        match storage.calls().as_slice() {
            [Call::Update(None, patch)] => assert_eq!(patch.title.as_deref(), Some("renamed")),
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_content_embeds_once_before_update() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::default(), RecordingStorage::default());

        let patch = MemoryPatch {
            content: Some("new body".to_string()),
            ..Default::default()
        };
        svc.update("m1", patch).await.unwrap();

        assert_eq!(embedder.inputs(), vec!["new body"]);
        match storage.calls().as_slice() {
            [Call::Update(Some(embedding), _)] => assert_eq!(embedding, &vec![8.0, 1.0]),
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::default(), RecordingStorage::default());

        let err = svc.update("m1", MemoryPatch::default()).await.unwrap_err();
        assert!(matches!(err, MemoError::Validation(_)));
        assert!(embedder.inputs().is_empty());
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_embedding_failure_skips_update() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::failing(), RecordingStorage::default());

        let patch = MemoryPatch {
            content: Some("new body".to_string()),
            ..Default::default()
        };
        let err = svc.update("m1", patch).await.unwrap_err();

        assert!(matches!(err, MemoError::Embedding(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(embedder.inputs(), vec!["new body"]);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_storage_failure_is_storage_error() {
        let storage = RecordingStorage {
            fail_with: Some("boom".to_string()),
            ..Default::default()
        };
        let (svc, _, _) = service(RecordingEmbedder::default(), storage);

        let patch = MemoryPatch {
            title: Some("renamed".to_string()),
            ..Default::default()
        };
        let err = svc.update("m1", patch).await.unwrap_err();

        assert!(matches!(err, MemoError::Storage { status: Some(500), .. }));
        assert_eq!(err.message(), "boom");
    }

    #[tokio::test]
    async fn test_search_sends_all_filters_and_sorts() {
        let storage = RecordingStorage {
            hits: vec![hit("a", 0.72), hit("b", 0.95), hit("c", 0.81)],
            ..Default::default()
        };
        let (svc, embedder, storage) = service(RecordingEmbedder::default(), storage);

        let options = SearchOptions {
            limit: 10,
            threshold: 0.7,
            ..Default::default()
        };
        let results = svc.search("find X", "org1", &options).await.unwrap();

        assert_eq!(embedder.inputs(), vec!["find X"]);
        match storage.calls().as_slice() {
            [Call::Search(search)] => {
                assert_eq!(search.query_embedding, vec![6.0, 1.0]);
                assert_eq!(search.match_threshold, 0.7);
                assert_eq!(search.match_count, 10);
                assert_eq!(search.organization_id, "org1");
                assert!(search.filter_categories.is_none());
                assert!(search.filter_tags.is_none());
                assert!(search.filter_topic_id.is_none());
                assert!(search.filter_user_id.is_none());
            }
            other => panic!("unexpected calls: {:?}", other),
        }

        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.95, 0.81, 0.72]);
    }

    #[tokio::test]
    async fn test_search_passes_filters() {
        let (svc, _, storage) = service(RecordingEmbedder::default(), RecordingStorage::default());

        let options = SearchOptions {
            categories: Some(vec![MemoryCategory::Project]),
            tags: Some(vec!["rust".to_string()]),
            topic_id: Some("t1".to_string()),
            user_id: Some("u1".to_string()),
            ..Default::default()
        };
        svc.search("q", "org1", &options).await.unwrap();

        match storage.calls().as_slice() {
            [Call::Search(search)] => {
                assert_eq!(search.filter_categories, Some(vec![MemoryCategory::Project]));
                assert_eq!(search.filter_tags, Some(vec!["rust".to_string()]));
                assert_eq!(search.filter_topic_id.as_deref(), Some("t1"));
                assert_eq!(search.filter_user_id.as_deref(), Some("u1"));
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_failures_are_search_errors() {
        let (svc, _, storage) = service(RecordingEmbedder::failing(), RecordingStorage::default());
        let err = svc
            .search("q", "org1", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::Search(_)));
        assert!(storage.calls().is_empty());

        let storage = RecordingStorage {
            fail_with: Some("function search_memories does not exist".to_string()),
            ..Default::default()
        };
        let (svc, _, _) = service(RecordingEmbedder::default(), storage);
        let err = svc
            .search("q", "org1", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::Search(_)));
        assert!(err.to_string().contains("search_memories does not exist"));
    }

    #[tokio::test]
    async fn test_invalid_search_options_are_search_errors() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::default(), RecordingStorage::default());

        let options = SearchOptions {
            limit: 0,
            ..Default::default()
        };
        let err = svc.search("q", "org1", &options).await.unwrap_err();
        assert!(matches!(err, MemoError::Search(_)));
        assert!(err.message().contains("at least 1"));

        let options = SearchOptions {
            threshold: 1.5,
            ..Default::default()
        };
        let err = svc.search("q", "org1", &options).await.unwrap_err();
        assert!(matches!(err, MemoError::Search(_)));

        assert!(embedder.inputs().is_empty());
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_count_failure_is_storage_error() {
        let storage = RecordingStorage {
            fail_with: Some("boom".to_string()),
            ..Default::default()
        };
        let (svc, _, _) = service(RecordingEmbedder::default(), storage);

        let err = svc.count("org1").await.unwrap_err();
        assert!(matches!(err, MemoError::Storage { status: Some(500), .. }));
        assert_eq!(err.message(), "boom");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_none() {
        let (svc, _, _) = service(RecordingEmbedder::default(), RecordingStorage::default());
        assert!(svc.get_by_id("nope", "org1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_propagates_storage_error() {
        let storage = RecordingStorage {
            fail_with: Some("row is locked".to_string()),
            ..Default::default()
        };
        let (svc, _, storage) = service(RecordingEmbedder::default(), storage);

        let err = svc.delete("m1").await.unwrap_err();
        assert!(matches!(err, MemoError::Storage { .. }));
        assert_eq!(err.message(), "row is locked");
        match storage.calls().as_slice() {
            [Call::Delete(id)] => assert_eq!(id, "m1"),
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_count_and_list_do_not_embed() {
        let storage = RecordingStorage {
            hits: vec![hit("a", 0.9), hit("b", 0.8)],
            ..Default::default()
        };
        let (svc, embedder, _) = service(RecordingEmbedder::default(), storage);

        assert_eq!(svc.count("org1").await.unwrap(), 2);
        assert!(svc.list("org1", 5).await.unwrap().is_empty());
        assert!(embedder.inputs().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_and_delete_do_not_embed() {
        let (svc, embedder, storage) =
            service(RecordingEmbedder::default(), RecordingStorage::default());

        assert!(svc.get_by_id("m1", "org1").await.unwrap().is_none());
        svc.delete("m1").await.unwrap();

        assert!(embedder.inputs().is_empty());
        match storage.calls().as_slice() {
            [Call::Delete(id)] => assert_eq!(id, "m1"),
            other => panic!("unexpected calls: {:?}", other),
        }
    }
}
