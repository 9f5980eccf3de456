//! Embedding 向量解码
//!
//! PostgREST 返回的 pgvector 列是文本（`"[0.1,0.2]"`），
//! RPC 结果和测试数据通常是 JSON 数组，两种都接受。

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVector {
    Array(Vec<f32>),
    Text(String),
}

/// 解析 pgvector 文本格式 `[1,2,3]`
pub fn parse_vector_text(text: &str) -> Result<Vec<f32>, String> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| format!("Malformed vector literal: {}", text))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("Invalid vector component '{}': {}", v.trim(), e))
        })
        .collect()
}

/// `Option<Vec<f32>>` 字段的 `deserialize_with` 辅助函数
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Vec<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawVector>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawVector::Array(v)) => Ok(Some(v)),
        Some(RawVector::Text(t)) => parse_vector_text(&t).map(Some).map_err(de::Error::custom),
    }
}
