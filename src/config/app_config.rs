use anyhow::{Context, Result};
use memo_remote::StoreConfig;
use memo_types::MemoryCategory;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::credentials::Credentials;
use super::providers::{ProvidersConfig, ResolvedService};

/// auto 模式下覆盖已保存 access token 的环境变量
pub const ACCESS_TOKEN_ENV: &str = "MEMO_ACCESS_TOKEN";

/// 配置作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Auto,
    Local,
    Global,
}

/// access token 的获取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// 使用 `MEMO_ACCESS_TOKEN` 或 `memo login` 保存的 token
    #[default]
    #[serde(alias = "automatic")]
    Auto,
    /// 使用 `[store].access_token` 中的 token
    Manual,
}

impl std::str::FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "automatic" => Ok(AuthMode::Auto),
            "manual" => Ok(AuthMode::Manual),
            other => anyhow::bail!("Unknown auth mode '{}', expected 'auto' or 'manual'", other),
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Auto => f.write_str("auto"),
            AuthMode::Manual => f.write_str("manual"),
        }
    }
}

/// 远程存储配置（`[store]` 表）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    /// 项目 URL，例如 https://abc.supabase.co
    pub url: String,

    /// 项目的公开 anon key
    pub anon_key: String,

    /// manual 认证模式下使用的 access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// 记忆和密钥所属的租户
    pub organization_id: String,

    /// 新记忆和 API key 的所有者
    pub user_id: String,

    /// 请求超时秒数（默认: 不限）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Embedding 服务引用（例如 "openai.embed"）
    pub embedding: String,

    /// 认证模式（默认: auto）
    #[serde(default)]
    pub auth_mode: AuthMode,

    /// 新记忆的默认分类（默认: context）
    #[serde(default)]
    pub default_category: MemoryCategory,

    /// 搜索结果数量上限（默认: 10）
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// 搜索结果的最低相似度（0.0-1.0，默认: 0.7）
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// 记忆视图的自动刷新间隔秒数（默认: 300）
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    pub store: StoreSettings,
}

fn default_search_limit() -> usize {
    memo_types::DEFAULT_SEARCH_LIMIT
}

fn default_similarity_threshold() -> f32 {
    memo_types::DEFAULT_SIMILARITY_THRESHOLD
}

fn default_refresh_interval() -> u64 {
    300
}

impl AppConfig {
    /// 全局 .memo 目录：~/.memo/
    pub fn global_memo_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".memo")
    }

    /// 本地 .memo 目录：./.memo/
    pub fn local_memo_dir() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".memo")
    }

    /// 是否存在本地配置
    /// 主目录本身不算本地
    pub fn has_local_config() -> bool {
        let current_dir = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return false,
        };

        let global_parent = Self::global_memo_dir().parent().map(|p| p.to_path_buf());

        if let Some(home) = global_parent {
            let current_canonical = current_dir.canonicalize().unwrap_or(current_dir.clone());
            let home_canonical = home.canonicalize().unwrap_or(home);

            if current_canonical == home_canonical {
                return false;
            }
        }

        Self::local_memo_dir().join("config.toml").exists()
    }

    /// 作用域参数互斥
    pub fn validate_scope_flags(local: bool, global: bool) -> Result<()> {
        if local && global {
            anyhow::bail!("Cannot specify both --local and --global, please choose one");
        }
        Ok(())
    }

    /// "local" 或 "global"
    pub fn get_scope_name(force_local: bool, force_global: bool) -> &'static str {
        if force_local {
            "local"
        } else if force_global {
            "global"
        } else if Self::has_local_config() {
            "local"
        } else {
            "global"
        }
    }

    pub fn get_memo_dir(local: bool) -> PathBuf {
        if local {
            Self::local_memo_dir()
        } else {
            Self::global_memo_dir()
        }
    }

    /// 参数对应的配置文件路径
    pub fn config_path(force_local: bool, force_global: bool) -> PathBuf {
        let local = Self::get_scope_name(force_local, force_global) == "local";
        Self::get_memo_dir(local).join("config.toml")
    }

    /// 加载配置：
    /// - local = true：只读本地配置
    /// - global = true：只读全局配置
    /// - 都不指定：先本地，再全局
    pub fn load_with_scope(force_local: bool, force_global: bool) -> Result<Self> {
        Self::validate_scope_flags(force_local, force_global)?;

        let scope = if force_local {
            ConfigScope::Local
        } else if force_global {
            ConfigScope::Global
        } else {
            ConfigScope::Auto
        };

        Self::load_with_scope_internal(scope)
    }

    fn load_with_scope_internal(scope: ConfigScope) -> Result<Self> {
        let path = match scope {
            ConfigScope::Auto => Self::config_path(false, false),
            ConfigScope::Local => Self::local_memo_dir().join("config.toml"),
            ConfigScope::Global => Self::global_memo_dir().join("config.toml"),
        };
        Self::load_from_path(&path)
    }

    /// 加载配置文件
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration not found at: {}\nRun 'memo init' to create one",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        tracing::debug!("Loaded app config from: {}", path.display());
        tracing::debug!("Embedding: {}", config.embedding);
        tracing::debug!("Store: {}", config.store.url);

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 只检查类型和取值范围
    pub fn validate(&self) -> Result<()> {
        if self.search_limit == 0 {
            anyhow::bail!("search_limit must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            anyhow::bail!(
                "similarity_threshold must be within 0.0-1.0, got {}",
                self.similarity_threshold
            );
        }
        if self.store.organization_id.trim().is_empty() {
            anyhow::bail!("store.organization_id is empty");
        }
        if self.store.user_id.trim().is_empty() {
            anyhow::bail!("store.user_id is empty");
        }
        Ok(())
    }

    /// 写入配置文件，必要时创建父目录
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// 解析 Embedding 服务
    pub fn resolve_embedding(&self, providers: &ProvidersConfig) -> Result<ResolvedService> {
        providers
            .get_service(&self.embedding)
            .with_context(|| format!("Failed to resolve embedding service: {}", self.embedding))
    }

    /// 按认证模式取 access token；`None` 表示匿名访问
    pub fn access_token(&self) -> Result<Option<String>> {
        match self.auth_mode {
            AuthMode::Manual => Ok(self
                .store
                .access_token
                .clone()
                .filter(|t| !t.trim().is_empty())),
            AuthMode::Auto => {
                if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
                    if !token.trim().is_empty() {
                        return Ok(Some(token));
                    }
                }
                Ok(Credentials::load()?.map(|c| c.access_token))
            }
        }
    }

    /// 远程存储的连接配置
    pub fn store_config(&self) -> Result<StoreConfig> {
        Ok(StoreConfig {
            url: self.store.url.clone(),
            anon_key: SecretString::new(self.store.anon_key.clone()),
            access_token: self.access_token()?.map(SecretString::new),
            timeout_secs: self.store.timeout_secs,
        })
    }
}
