//! Provider Traits

use async_trait::async_trait;
use memo_types::Result;

/// Embedding Provider Trait
#[async_trait]
pub trait EmbedProvider: Send + Sync {
    /// 编码单条文本，文本原样发送
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// 一次请求编码多条文本，保持顺序
    async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// 向量维度
    fn dimension(&self) -> usize;

    /// 每次请求携带的模型标识
    fn model(&self) -> &str;
}
