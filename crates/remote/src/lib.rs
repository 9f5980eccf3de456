//! Memo Remote - 远程存储后端
//!
//! 通过 PostgREST 兼容 API（例如 Supabase）访问记忆、
//! `search_memories` 相似度检索过程、密钥和 API key

mod client;
mod config;
mod rest;
mod service;
mod vault;

pub use client::RemoteStorageClient;
pub use config::StoreConfig;
pub use rest::RestClient;
pub use service::MemoryService;
pub use vault::RemoteSecretStore;
