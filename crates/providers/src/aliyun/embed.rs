//! 阿里云 DashScope Embedding（OpenAI 兼容模式）

use memo_types::Result;

use crate::common::OpenaiCompatibleEmbed;
use crate::config::ProviderConfig;
use crate::traits::EmbedProvider;

pub fn create(config: &ProviderConfig, dimension: usize) -> Result<Box<dyn EmbedProvider>> {
    Ok(Box::new(OpenaiCompatibleEmbed::new(config, dimension)?))
}
