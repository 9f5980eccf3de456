//! 各 memo crate 共用的错误类型

use thiserror::Error;

/// Embedding、存储和密钥客户端产生的错误
#[derive(Debug, Error)]
pub enum MemoError {
    /// Embedding Provider 调用失败或没有返回可用向量
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// 远程存储拒绝或处理请求失败
    #[error("Storage error{}: {message}", fmt_status(.status, .code))]
    Storage {
        /// HTTP 状态码（错误来自响应时）
        status: Option<u16>,
        /// 存储返回的错误码（例如 `23505`、`PGRST116`）
        code: Option<String>,
        message: String,
    },

    /// 写入记录时生成 embedding 失败
    #[error("Failed to embed memory content: {0}")]
    Embedding(String),

    /// 查询向量生成或相似度检索失败
    #[error("Search failed: {0}")]
    Search(String),

    /// 按名称查找没有结果
    #[error("Not found: {0}")]
    NotFound(String),

    /// 发送请求前输入校验失败
    #[error("Invalid input: {0}")]
    Validation(String),

    /// 客户端配置不可用
    #[error("Configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>, code: &Option<String>) -> String {
    match (status, code) {
        (Some(s), Some(c)) => format!(" ({}, {})", s, c),
        (Some(s), None) => format!(" ({})", s),
        (None, Some(c)) => format!(" ({})", c),
        (None, None) => String::new(),
    }
}

impl MemoError {
    /// 不带响应信息的存储错误（传输失败、响应体无法解析）
    pub fn storage(message: impl Into<String>) -> Self {
        MemoError::Storage {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MemoError::NotFound(_))
    }

    /// 错误携带的远程消息，不含类型前缀
    pub fn message(&self) -> &str {
        match self {
            MemoError::Storage { message, .. } => message,
            MemoError::Provider(m)
            | MemoError::Embedding(m)
            | MemoError::Search(m)
            | MemoError::NotFound(m)
            | MemoError::Validation(m)
            | MemoError::Config(m) => m,
        }
    }
}

/// memo 客户端操作的 Result 类型
pub type Result<T> = std::result::Result<T, MemoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_display_includes_status_and_code() {
        let err = MemoError::Storage {
            status: Some(409),
            code: Some("23505".to_string()),
            message: "duplicate key".to_string(),
        };
        assert_eq!(err.to_string(), "Storage error (409, 23505): duplicate key");
        assert_eq!(err.message(), "duplicate key");
    }

    #[test]
    fn test_storage_display_without_details() {
        let err = MemoError::storage("connection reset");
        assert_eq!(err.to_string(), "Storage error: connection reset");
    }
}
