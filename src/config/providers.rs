use anyhow::{Context, Result};
use model_provider::ProviderConfig as EmbedConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 服务类型，目前只用到 embedding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Embed,
}

/// Provider 下的一个服务
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub base_url: String,
    pub model: String,
    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

/// providers.toml 中的一个 Provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEntry {
    pub name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(flatten)]
    pub services: HashMap<String, ServiceConfig>,
}

/// 所有已配置的 Provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(flatten)]
    providers: HashMap<String, ProviderEntry>,
}

impl ProvidersConfig {
    /// 加载 ~/.memo/providers.toml
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Providers configuration not found at: {}\nRun 'memo init' to create a template",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path).with_context(|| {
            format!("Failed to read providers config: {}", config_path.display())
        })?;

        let config: Self = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse providers config: {}",
                config_path.display()
            )
        })?;

        tracing::debug!("Loaded providers config from: {}", config_path.display());
        tracing::debug!(
            "Available providers: {:?}",
            config.providers.keys().collect::<Vec<_>>()
        );

        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".memo").join("providers.toml"))
    }

    /// 解析服务引用，例如 "openai.embed"
    pub fn get_service(&self, reference: &str) -> Result<ResolvedService> {
        let (provider_name, service_name) = reference.split_once('.').with_context(|| {
            format!(
                "Invalid service reference: '{}'. Expected format: 'provider.service' (e.g., 'openai.embed')",
                reference
            )
        })?;

        let provider = self
            .providers
            .get(provider_name)
            .with_context(|| format!("Provider '{}' not found in providers.toml", provider_name))?;

        let service = provider.services.get(service_name).with_context(|| {
            format!(
                "Service '{}' not found in provider '{}'",
                service_name, provider_name
            )
        })?;

        tracing::debug!(
            "Resolved {} to {} ({:?}, {})",
            reference,
            provider.name,
            service.service_type,
            service.model
        );

        Ok(ResolvedService {
            provider_name: provider_name.to_string(),
            api_key: provider.api_key.clone(),
            base_url: service.base_url.clone(),
            model: service.model.clone(),
            extra: service.extra.clone(),
        })
    }
}

/// providers.toml 不存在时 `memo init` 写入的模板
pub const PROVIDERS_TEMPLATE: &str = r#"# Embedding providers, referenced from config.toml as "<provider>.<service>"

[openai]
name = "OpenAI"
api_key = ""

  [openai.embed]
  type = "embed"
  base_url = "https://api.openai.com/v1"
  model = "text-embedding-3-small"
  dimension = 1536

[ollama]
name = "Ollama"

  [ollama.embed]
  type = "embed"
  base_url = "http://localhost:11434/v1"
  model = "nomic-embed-text"
  dimension = 768
"#;

/// 解析后的服务
#[derive(Debug, Clone)]
pub struct ResolvedService {
    pub provider_name: String,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub extra: HashMap<String, toml::Value>,
}

impl ResolvedService {
    /// 整数类型的额外参数
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.extra.get(key).and_then(|v| v.as_integer())
    }

    /// 转换为 `model_provider::create_embed_provider` 的参数
    pub fn to_provider_config(&self) -> Result<EmbedConfig> {
        let dimension = match self.get_int("dimension") {
            Some(d) if d > 0 => Some(d as usize),
            Some(d) => anyhow::bail!("Invalid embedding dimension: {}", d),
            None => None,
        };
        let timeout_secs = self
            .get_int("timeout_secs")
            .filter(|t| *t > 0)
            .map(|t| t as u64);

        Ok(EmbedConfig {
            provider_name: self.provider_name.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            dimension,
            timeout_secs,
        })
    }
}
