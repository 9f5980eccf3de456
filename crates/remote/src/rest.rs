//! 轻量 PostgREST 客户端：URL 拼接、认证头和错误解析

use memo_types::{MemoError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::StoreConfig;

/// 单对象请求没有匹配行时 PostgREST 返回的错误码
pub(crate) const NO_ROWS_CODE: &str = "PGRST116";

/// 要求返回单个 JSON 对象而不是数组的 `Accept` 值
pub(crate) const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST 返回的错误体
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// 共享的 REST 客户端，clone 开销很小
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestInner>,
}

struct RestInner {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| MemoError::Config(format!("Invalid store URL '{}': {}", config.url, e)))?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let base_url = base_url
            .join("rest/v1/")
            .map_err(|e| MemoError::Config(format!("Invalid store URL: {}", e)))?;

        let anon_key: &str = config.anon_key.expose_secret();
        if anon_key.trim().is_empty() {
            return Err(MemoError::Config("Store anon key is empty".to_string()));
        }
        let bearer = config
            .access_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .unwrap_or(anon_key);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("apikey", sensitive_header(anon_key)?);
        headers.insert(AUTHORIZATION, sensitive_header(&format!("Bearer {}", bearer))?);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("memo-remote/{}", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| MemoError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!("Remote store endpoint: {}", base_url);

        Ok(Self {
            inner: Arc::new(RestInner { http, base_url }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// 拼接表或 `rpc/<name>` 路径的 URL
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| MemoError::Config(format!("Invalid path '{}': {}", path, e)))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        tracing::debug!("{} {}", method, url);
        Ok(self.inner.http.request(method, url))
    }

    /// 发送请求，把传输失败和错误状态转为 `Storage` 错误
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MemoError::storage(format!("Request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(extract_error(response).await)
        }
    }

    /// 发送请求并解析 JSON 响应体
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| MemoError::storage(format!("Failed to decode response: {}", e)))
    }
}

fn sensitive_header(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| MemoError::Config("Credential contains invalid header characters".to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

/// 把错误响应转为携带远程信息的 `Storage` 错误
async fn extract_error(response: Response) -> MemoError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorResponse = serde_json::from_str(&body).unwrap_or_default();

    let mut message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.clone()
            }
        });
    if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
        message = format!("{} ({})", message, details);
    }
    if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
        message = format!("{}; hint: {}", message, hint);
    }

    if parsed.code.as_deref() != Some(NO_ROWS_CODE) {
        tracing::error!("Remote store error ({}): {}", status, message);
    }

    MemoError::Storage {
        status: Some(status.as_u16()),
        code: parsed.code,
        message,
    }
}

/// 错误是否表示单对象请求没有匹配
pub(crate) fn is_no_rows(err: &MemoError) -> bool {
    matches!(err, MemoError::Storage { code: Some(code), .. } if code == NO_ROWS_CODE)
}

/// 从 `Content-Range` 头取总数（`0-24/120` 或 `*/0`）
pub(crate) fn parse_content_range(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// PostgREST 等值过滤的值
pub(crate) fn eq(value: &str) -> String {
    format!("eq.{}", value)
}
