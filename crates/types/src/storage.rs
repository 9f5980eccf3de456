use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::Result;
use crate::models::{
    ApiKeyRecord, MemoryChanges, MemoryEntry, MemoryInsert, NewApiKey, ScoredMemory, VectorSearch,
};

/// 记忆存储后端的统一接口
///
/// 向量由调用方生成，后端只负责存储和查询
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// 插入记忆，返回带服务端 id 和时间戳的记录
    async fn insert(&self, record: MemoryInsert) -> Result<MemoryEntry>;

    /// 在租户内查找记录，不存在时返回 `None`
    async fn find_by_id(&self, id: &str, organization_id: &str) -> Result<Option<MemoryEntry>>;

    /// 更新记录并返回更新后的行
    async fn update(&self, id: &str, changes: MemoryChanges) -> Result<MemoryEntry>;

    /// 删除记录
    async fn delete(&self, id: &str) -> Result<()>;

    /// 租户内的记录数量
    async fn count(&self, organization_id: &str) -> Result<usize>;

    /// 用已计算好的查询向量做相似度检索
    async fn search_by_vector(&self, search: VectorSearch) -> Result<Vec<ScoredMemory>>;

    /// 租户内最新的记录（不含 embedding）
    async fn list(&self, organization_id: &str, limit: usize) -> Result<Vec<MemoryEntry>>;
}

/// 命名密钥和 API key 记录
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// 保存（或覆盖）命名密钥
    async fn put_secret(&self, organization_id: &str, name: &str, value: &SecretString)
        -> Result<()>;

    /// 读取命名密钥，未知名称返回 `NotFound`
    async fn get_secret(&self, organization_id: &str, name: &str) -> Result<SecretString>;

    /// 创建 API key 记录
    async fn create_api_key(&self, key: NewApiKey) -> Result<ApiKeyRecord>;

    /// 租户的 API key，最新的在前
    async fn list_api_keys(&self, organization_id: &str) -> Result<Vec<ApiKeyRecord>>;
}
