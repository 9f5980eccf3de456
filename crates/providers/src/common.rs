//! 各 Provider 共用的 OpenAI 兼容 Embedding 客户端

use async_trait::async_trait;
use memo_types::{MemoError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::traits::EmbedProvider;

/// OpenAI 兼容 Embed（OpenAI、Aliyun、Ollama、Zhipu 通用）
pub struct OpenaiCompatibleEmbed {
    client: Client,
    provider_name: String,
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    send_dimensions: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    Single(&'a str),
    Batch(&'a [&'a str]),
}

#[derive(Debug, Serialize)]
struct OpenaiEmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenaiEmbedResponse {
    #[serde(default)]
    data: Vec<OpenaiEmbedData>,
}

#[derive(Debug, Deserialize)]
struct OpenaiEmbedData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl OpenaiCompatibleEmbed {
    pub fn new(config: &ProviderConfig, dimension: usize) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| MemoError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            "Created {} embed provider: model={}, dimension={}, base_url={}",
            config.provider_name,
            config.model,
            dimension,
            config.base_url
        );

        Ok(Self {
            client,
            provider_name: config.provider_name.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dimension,
            send_dimensions: true,
        })
    }

    /// 不发送 `dimensions` 字段，用于不接受该字段的 API
    pub fn without_dimensions_param(mut self) -> Self {
        self.send_dimensions = false;
        self
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(MemoError::Provider(format!(
                "{} returned a {}-dimensional vector, expected {} for model {}",
                self.provider_name,
                embedding.len(),
                self.dimension,
                self.model
            )));
        }
        Ok(())
    }

    async fn request(&self, input: EmbedInput<'_>) -> Result<Vec<Vec<f32>>> {
        let request = OpenaiEmbedRequest {
            model: &self.model,
            input,
            dimensions: self.send_dimensions.then_some(self.dimension),
        };

        let url = format!("{}/embeddings", self.base_url);
        tracing::debug!(provider = %self.provider_name, model = %self.model, "POST {}", url);

        let mut req = self.client.post(&url).json(&request);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        let response = req.send().await.map_err(|e| {
            MemoError::Provider(format!("{} embed request failed: {}", self.provider_name, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "{} embed API error ({}): {}",
                self.provider_name,
                status,
                error_text
            );
            return Err(MemoError::Provider(format!(
                "{} embed API error ({}): {}",
                self.provider_name, status, error_text
            )));
        }

        let embed_response: OpenaiEmbedResponse = response.json().await.map_err(|e| {
            MemoError::Provider(format!(
                "Failed to parse {} embed response: {}",
                self.provider_name, e
            ))
        })?;

        let mut data = embed_response.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

fn ensure_not_empty(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(MemoError::Provider("Cannot embed empty text".to_string()));
    }
    Ok(())
}

#[async_trait]
impl EmbedProvider for OpenaiCompatibleEmbed {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        ensure_not_empty(text)?;

        let embedding = self
            .request(EmbedInput::Single(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                MemoError::Provider(format!("No embedding returned by {}", self.provider_name))
            })?;

        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            ensure_not_empty(text)?;
        }

        let embeddings = self.request(EmbedInput::Batch(texts)).await?;
        if embeddings.len() != texts.len() {
            return Err(MemoError::Provider(format!(
                "{} returned {} embeddings for {} inputs",
                self.provider_name,
                embeddings.len(),
                texts.len()
            )));
        }
        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}
