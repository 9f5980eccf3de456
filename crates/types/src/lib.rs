//! Memo Types - 共享数据模型和后端 trait
//!
//! Embedding Provider、远程存储客户端和 CLI 都使用这些类型

mod error;
mod models;
mod storage;
pub mod vector;

pub use error::{MemoError, Result};
pub use models::{
    derive_title, normalize_tags, ApiKeyRecord, MemoryCategory, MemoryChanges, MemoryEntry,
    MemoryInsert, MemoryPatch, NewApiKey, NewMemory, ScoredMemory, SearchOptions, VectorSearch,
    DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILARITY_THRESHOLD,
};
pub use storage::{SecretBackend, StorageBackend};

pub use secrecy::{ExposeSecret, SecretString};
