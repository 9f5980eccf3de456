//! 命名密钥和 API key 记录
//!
//! 值原样发送，静态加密由存储端负责

use async_trait::async_trait;
use memo_types::{ApiKeyRecord, MemoError, NewApiKey, Result, SecretBackend};
use reqwest::header::ACCEPT;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::rest::{eq, is_no_rows, RestClient, SINGLE_OBJECT};

const SECRETS_TABLE: &str = "secrets";
const API_KEYS_TABLE: &str = "api_keys";

/// `api_keys` 中允许返回的列
const API_KEY_COLUMNS: &str =
    "id,name,key_type,environment,project_id,tags,rotation_days,user_id,organization_id,created_at";

#[derive(Serialize)]
struct SecretRow<'a> {
    organization_id: &'a str,
    name: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
struct SecretValue {
    value: String,
}

#[derive(Serialize)]
struct ApiKeyInsert<'a> {
    name: &'a str,
    value: &'a str,
    key_type: &'a str,
    environment: &'a str,
    project_id: &'a str,
    tags: &'a [String],
    rotation_days: Option<u32>,
    user_id: &'a str,
    organization_id: &'a str,
}

/// 密钥存储客户端
#[derive(Clone)]
pub struct RemoteSecretStore {
    rest: RestClient,
}

impl RemoteSecretStore {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn connect(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(RestClient::new(config)?))
    }
}

#[async_trait]
impl SecretBackend for RemoteSecretStore {
    async fn put_secret(
        &self,
        organization_id: &str,
        name: &str,
        value: &SecretString,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(MemoError::Validation("Secret name is empty".to_string()));
        }

        tracing::debug!("Storing secret '{}' for {}", name, organization_id);

        let request = self
            .rest
            .request(Method::POST, SECRETS_TABLE)?
            .query(&[("on_conflict", "organization_id,name")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&SecretRow {
                organization_id,
                name,
                value: value.expose_secret(),
            });

        self.rest.send(request).await?;
        Ok(())
    }

    async fn get_secret(&self, organization_id: &str, name: &str) -> Result<SecretString> {
        let request = self
            .rest
            .request(Method::GET, SECRETS_TABLE)?
            .query(&[
                ("organization_id", eq(organization_id)),
                ("name", eq(name)),
                ("select", "value".to_string()),
            ])
            .header(ACCEPT, SINGLE_OBJECT);

        match self.rest.send_json::<SecretValue>(request).await {
            Ok(row) => Ok(SecretString::new(row.value)),
            Err(err) if is_no_rows(&err) => {
                Err(MemoError::NotFound(format!("Secret '{}'", name)))
            }
            Err(err) => Err(err),
        }
    }

    async fn create_api_key(&self, key: NewApiKey) -> Result<ApiKeyRecord> {
        key.validate()?;

        tracing::debug!(
            "Creating API key '{}' ({}, {}) for project {}",
            key.name,
            key.key_type,
            key.environment,
            key.project_id
        );

        let request = self
            .rest
            .request(Method::POST, API_KEYS_TABLE)?
            .query(&[("select", API_KEY_COLUMNS)])
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&ApiKeyInsert {
                name: &key.name,
                value: key.value.expose_secret(),
                key_type: &key.key_type,
                environment: &key.environment,
                project_id: &key.project_id,
                tags: &key.tags,
                rotation_days: key.rotation_days,
                user_id: &key.user_id,
                organization_id: &key.organization_id,
            });

        self.rest.send_json(request).await
    }

    async fn list_api_keys(&self, organization_id: &str) -> Result<Vec<ApiKeyRecord>> {
        let request = self
            .rest
            .request(Method::GET, API_KEYS_TABLE)?
            .query(&[
                ("organization_id", eq(organization_id)),
                ("select", API_KEY_COLUMNS.to_string()),
                ("order", "created_at.desc".to_string()),
            ]);

        self.rest.send_json(request).await
    }
}
