use anyhow::{Context as _, Result};
use std::sync::Arc;

use crate::cli::ScopeArgs;
use crate::config::{AppConfig, ProvidersConfig};
use memo_remote::{MemoryService, RemoteSecretStore, RemoteStorageClient, RestClient};
use memo_types::StorageBackend;
use model_provider::create_embed_provider;

/// 单个命令用到的配置和 REST 客户端
pub struct CommandContext {
    pub config: AppConfig,
    pub scope: &'static str,
    rest: RestClient,
}

impl CommandContext {
    pub fn load(scope: ScopeArgs) -> Result<Self> {
        let config = AppConfig::load_with_scope(scope.local, scope.global)?;
        let scope_name = AppConfig::get_scope_name(scope.local, scope.global);

        let store_config = config.store_config()?;
        if store_config.access_token.is_none() {
            tracing::warn!("No access token configured, using the anon key");
        }
        let rest = RestClient::new(&store_config).context("Failed to set up store client")?;

        Ok(Self {
            config,
            scope: scope_name,
            rest,
        })
    }

    pub fn organization_id(&self) -> &str {
        &self.config.store.organization_id
    }

    pub fn user_id(&self) -> &str {
        &self.config.store.user_id
    }

    pub fn secrets(&self) -> RemoteSecretStore {
        RemoteSecretStore::new(self.rest.clone())
    }

    /// 使用已配置 Embedding Provider 的记忆服务
    /// 所有记忆命令都经过它，因此 providers.toml 必须能解析
    pub fn memory_service(&self) -> Result<MemoryService> {
        let providers = ProvidersConfig::load()?;
        let resolved = self.config.resolve_embedding(&providers)?;
        let embed_config = resolved.to_provider_config()?;
        let embedder = create_embed_provider(&embed_config)
            .with_context(|| format!("Failed to create embedding provider: {}", self.config.embedding))?;

        let storage: Arc<dyn StorageBackend> = Arc::new(RemoteStorageClient::new(self.rest.clone()));
        Ok(MemoryService::new(Arc::from(embedder), storage))
    }
}
