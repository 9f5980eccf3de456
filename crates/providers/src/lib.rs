mod common;
mod config;
mod traits;

// 各 Provider 模块（按 feature 启用）
#[cfg(feature = "aliyun")]
mod aliyun;
#[cfg(feature = "ollama")]
mod ollama;
#[cfg(feature = "openai")]
mod openai;
#[cfg(feature = "zhipu")]
mod zhipu;

pub use common::OpenaiCompatibleEmbed;
pub use config::ProviderConfig;
pub use traits::EmbedProvider;

use memo_types::{MemoError, Result};

/// 创建 Embedding Provider
pub fn create_embed_provider(config: &ProviderConfig) -> Result<Box<dyn EmbedProvider>> {
    let dimension = config.dimension.ok_or_else(|| {
        MemoError::Config("Missing 'dimension' for embed provider".to_string())
    })?;

    match config.provider_name.as_str() {
        #[cfg(feature = "aliyun")]
        "aliyun" => aliyun::embed::create(config, dimension),
        #[cfg(feature = "openai")]
        "openai" => openai::embed::create(config, dimension),
        #[cfg(feature = "ollama")]
        "ollama" => ollama::embed::create(config, dimension),
        #[cfg(feature = "zhipu")]
        "zhipu" => zhipu::embed::create(config, dimension),
        other => Err(MemoError::Config(format!(
            "Unknown or disabled embed provider: {}",
            other
        ))),
    }
}
