use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `memo login` 保存的 access token（~/.memo/credentials.toml）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub access_token: String,
    pub saved_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            saved_at: Utc::now(),
        }
    }

    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".memo")
            .join("credentials.toml")
    }

    /// 已保存的凭据，未登录时为 `None`
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials: {}", path.display()))?;
        let credentials: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse credentials: {}", path.display()))?;

        if credentials.access_token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(credentials))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize credentials")?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open credentials: {}", path.display()))?;

        // mode() 只在新建文件时生效
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions: {}", path.display()))?;
        }

        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write credentials: {}", path.display()))?;

        tracing::debug!("Saved credentials to {}", path.display());
        Ok(())
    }

    /// 删除已保存的凭据，返回是否删除了文件
    pub fn remove() -> Result<bool> {
        Self::remove_at(&Self::path())
    }

    pub fn remove_at(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove credentials: {}", path.display()))?;
        Ok(true)
    }
}
