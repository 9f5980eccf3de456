//! Ollama 本地 Embedding（OpenAI 兼容格式）
//!
//! Ollama 的向量维度由模型决定，因此不发送 `dimensions`

use memo_types::Result;

use crate::common::OpenaiCompatibleEmbed;
use crate::config::ProviderConfig;
use crate::traits::EmbedProvider;

pub fn create(config: &ProviderConfig, dimension: usize) -> Result<Box<dyn EmbedProvider>> {
    Ok(Box::new(
        OpenaiCompatibleEmbed::new(config, dimension)?.without_dimensions_param(),
    ))
}
