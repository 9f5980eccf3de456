use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MemoError, Result};
use crate::vector;

/// 默认搜索结果数量
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// 搜索结果的默认最低相似度
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// 从内容生成标题时的最大长度
const DERIVED_TITLE_MAX_CHARS: usize = 60;

/// 记忆分类（固定集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    #[default]
    Context,
    Project,
    Knowledge,
    Reference,
    Personal,
    Workflow,
}

impl MemoryCategory {
    pub const ALL: [MemoryCategory; 6] = [
        MemoryCategory::Context,
        MemoryCategory::Project,
        MemoryCategory::Knowledge,
        MemoryCategory::Reference,
        MemoryCategory::Personal,
        MemoryCategory::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::Context => "context",
            MemoryCategory::Project => "project",
            MemoryCategory::Knowledge => "knowledge",
            MemoryCategory::Reference => "reference",
            MemoryCategory::Personal => "personal",
            MemoryCategory::Workflow => "workflow",
        }
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryCategory {
    type Err = MemoError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                MemoError::Validation(format!(
                    "Unknown category '{}', expected one of: {}",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

/// 去掉标签首尾空白，丢弃空标签并去重（保留首次出现）
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// 取内容第一个非空行作为标题
pub fn derive_title(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    if line.chars().count() <= DERIVED_TITLE_MAX_CHARS {
        line.to_string()
    } else {
        let truncated: String = line.chars().take(DERIVED_TITLE_MAX_CHARS).collect();
        format!("{}...", truncated.trim_end())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 存储返回的记忆记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: MemoryCategory,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "vector::deserialize_opt"
    )]
    pub embedding: Option<Vec<f32>>,
    pub user_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub access_count: i64,
}

/// 服务端分配 id 和时间戳之前由调用方提供的字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub title: String,
    pub content: String,
    pub category: MemoryCategory,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    pub user_id: String,
    pub organization_id: String,
}

impl NewMemory {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        user_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: MemoryCategory::default(),
            tags: Vec::new(),
            topic_id: None,
            user_id: user_id.into(),
            organization_id: organization_id.into(),
        }
    }

    pub fn with_category(mut self, category: MemoryCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(MemoError::Validation("Memory content is empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(MemoError::Validation("Memory title is empty".to_string()));
        }
        if self.organization_id.trim().is_empty() {
            return Err(MemoError::Validation(
                "Memory organization is empty".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(MemoError::Validation("Memory owner is empty".to_string()));
        }
        Ok(())
    }
}

/// 插入请求：新记忆加上它的 embedding
#[derive(Debug, Clone, Serialize)]
pub struct MemoryInsert {
    #[serde(flatten)]
    pub memory: NewMemory,
    pub embedding: Vec<f32>,
}

/// 记忆的部分更新，`None` 表示不修改该字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MemoryCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

impl MemoryPatch {
    /// 只包含 `current` 与 `edited` 之间不同字段的 patch
    pub fn diff(current: &MemoryEntry, edited: &MemoryEntry) -> Self {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        Self {
            title: changed(&current.title, &edited.title),
            content: changed(&current.content, &edited.content),
            category: changed(&current.category, &edited.category),
            tags: changed(&current.tags, &edited.tags),
            topic_id: changed(&current.topic_id, &edited.topic_id).flatten(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.topic_id.is_none()
    }

    /// 应用该 patch 是否需要重新生成 embedding
    pub fn changes_content(&self) -> bool {
        self.content.is_some()
    }
}

/// 发给存储的更新内容
#[derive(Debug, Clone, Serialize)]
pub struct MemoryChanges {
    #[serde(flatten)]
    pub patch: MemoryPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub updated_at: DateTime<Utc>,
}

/// 调用方提供的搜索选项
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub limit: usize,
    pub threshold: f32,
    pub categories: Option<Vec<MemoryCategory>>,
    pub tags: Option<Vec<String>>,
    pub topic_id: Option<String>,
    pub user_id: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            categories: None,
            tags: None,
            topic_id: None,
            user_id: None,
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(MemoError::Validation(
                "Search limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MemoError::Validation(format!(
                "Similarity threshold must be within 0.0-1.0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// 远程相似度检索过程的参数
///
/// 所有过滤条件都会序列化，未设置的发送 `null`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSearch {
    pub query_embedding: Vec<f32>,
    pub match_threshold: f32,
    pub match_count: usize,
    pub organization_id: String,
    pub filter_categories: Option<Vec<MemoryCategory>>,
    pub filter_tags: Option<Vec<String>>,
    pub filter_topic_id: Option<String>,
    pub filter_user_id: Option<String>,
}

impl VectorSearch {
    pub fn new(query_embedding: Vec<f32>, organization_id: &str, options: &SearchOptions) -> Self {
        Self {
            query_embedding,
            match_threshold: options.threshold,
            match_count: options.limit,
            organization_id: organization_id.to_string(),
            filter_categories: options.categories.clone().filter(|c| !c.is_empty()),
            filter_tags: options
                .tags
                .as_ref()
                .map(normalize_tags)
                .filter(|t| !t.is_empty()),
            filter_topic_id: options.topic_id.clone().filter(|t| !t.is_empty()),
            filter_user_id: options.user_id.clone().filter(|u| !u.is_empty()),
        }
    }
}

/// 带相关度分数的搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMemory {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<MemoryCategory>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(alias = "similarity")]
    pub score: f32,
}

impl ScoredMemory {
    /// 把分数限制在 [0, 1]，按分数从高到低排序
    pub fn rank(mut results: Vec<ScoredMemory>) -> Vec<ScoredMemory> {
        for r in &mut results {
            r.score = if r.score.is_nan() {
                0.0
            } else {
                r.score.clamp(0.0, 1.0)
            };
        }
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }
}

/// 待创建的 API key
#[derive(Debug)]
pub struct NewApiKey {
    pub name: String,
    pub value: SecretString,
    pub key_type: String,
    pub environment: String,
    pub project_id: String,
    pub tags: Vec<String>,
    pub rotation_days: Option<u32>,
    pub user_id: String,
    pub organization_id: String,
}

impl NewApiKey {
    /// 检查必填字段，不评估密钥强度
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", self.name.as_str()),
            ("value", self.value.expose_secret().as_str()),
            ("type", self.key_type.as_str()),
            ("environment", self.environment.as_str()),
            ("project", self.project_id.as_str()),
            ("organization", self.organization_id.as_str()),
            ("user", self.user_id.as_str()),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();

        if !missing.is_empty() {
            return Err(MemoError::Validation(format!(
                "API key is missing required fields: {}",
                missing.join(", ")
            )));
        }

        if self.rotation_days == Some(0) {
            return Err(MemoError::Validation(
                "Rotation interval must be at least 1 day".to_string(),
            ));
        }

        Ok(())
    }
}

/// 已存储的 API key 元数据（列表中从不包含值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: String,
    pub name: String,
    pub key_type: String,
    pub environment: String,
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rotation_days: Option<u32>,
    pub user_id: String,
    pub organization_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> MemoryEntry {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        MemoryEntry {
            id: "m1".to_string(),
            title: "Build".to_string(),
            content: "cargo build --release".to_string(),
            category: MemoryCategory::Workflow,
            tags: vec!["rust".to_string()],
            embedding: Some(vec![0.1, 0.2]),
            user_id: "u1".to_string(),
            organization_id: "org1".to_string(),
            topic_id: None,
            created_at: ts,
            updated_at: ts,
            access_count: 3,
        }
    }

    #[test]
    fn test_category_parse_and_display() {
        assert_eq!(
            "Knowledge".parse::<MemoryCategory>().unwrap(),
            MemoryCategory::Knowledge
        );
        assert_eq!(MemoryCategory::Personal.to_string(), "personal");
        assert!("misc".parse::<MemoryCategory>().is_err());
        assert_eq!(MemoryCategory::default(), MemoryCategory::Context);
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags([" rust ", "", "cli", "rust"]);
        assert_eq!(tags, vec!["rust", "cli"]);
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("\n\n  First line  \nsecond"), "First line");
        let long = "x".repeat(80);
        let title = derive_title(&long);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 63);
    }

    #[test]
    fn test_diff_metadata_only() {
        let current = entry();
        let mut edited = current.clone();
        edited.title = "Release build".to_string();
        edited.tags = vec!["rust".to_string(), "ci".to_string()];

        let patch = MemoryPatch::diff(&current, &edited);
        assert_eq!(patch.title.as_deref(), Some("Release build"));
        assert_eq!(patch.tags, Some(vec!["rust".to_string(), "ci".to_string()]));
        assert!(patch.content.is_none());
        assert!(!patch.changes_content());
    }

    #[test]
    fn test_diff_content_change() {
        let current = entry();
        let mut edited = current.clone();
        edited.content = "cargo build".to_string();

        let patch = MemoryPatch::diff(&current, &edited);
        assert!(patch.changes_content());
        assert!(patch.title.is_none());
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let current = entry();
        assert!(MemoryPatch::diff(&current, &current.clone()).is_empty());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let changes = MemoryChanges {
            patch: MemoryPatch {
                tags: Some(vec!["a".to_string()]),
                ..Default::default()
            },
            embedding: None,
            updated_at: Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&changes).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("tags"));
        assert!(obj.contains_key("updated_at"));
    }

    #[test]
    fn test_vector_search_always_carries_all_filters() {
        let body =
            serde_json::to_value(VectorSearch::new(vec![0.5], "org1", &Default::default()))
                .unwrap();
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 8);
        for key in [
            "filter_categories",
            "filter_tags",
            "filter_topic_id",
            "filter_user_id",
        ] {
            assert!(obj[key].is_null(), "{} should be null", key);
        }
        assert_eq!(obj["match_count"], 10);
        assert_eq!(obj["organization_id"], "org1");
    }

    #[test]
    fn test_vector_search_empty_filters_become_null() {
        let options = SearchOptions {
            categories: Some(vec![]),
            tags: Some(vec![" ".to_string()]),
            ..Default::default()
        };
        let search = VectorSearch::new(vec![0.5], "org1", &options);
        assert!(search.filter_categories.is_none());
        assert!(search.filter_tags.is_none());
    }

    #[test]
    fn test_search_options_validate() {
        assert!(SearchOptions::default().validate().is_ok());
        let bad = SearchOptions {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = SearchOptions {
            limit: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_rank_sorts_and_clamps() {
        let hit = |id: &str, score: f32| ScoredMemory {
            id: id.to_string(),
            title: String::new(),
            content: String::new(),
            category: None,
            tags: vec![],
            updated_at: None,
            score,
        };
        let ranked = ScoredMemory::rank(vec![hit("a", 0.71), hit("b", 1.02), hit("c", 0.9)]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(ranked[0].score, 1.0);
    }

    #[test]
    fn test_scored_memory_from_rpc_row() {
        let row = r#"{"id":"m1","title":"t","content":"c","tags":null,"similarity":0.82}"#;
        let hit: ScoredMemory = serde_json::from_str(row).unwrap();
        assert_eq!(hit.score, 0.82);
        assert!(hit.tags.is_empty());
    }

    #[test]
    fn test_entry_from_store_row() {
        let row = r#"{
            "id": "m1", "title": "t", "content": "c", "category": "project",
            "tags": ["a"], "embedding": "[0.1,0.2]", "user_id": "u1",
            "organization_id": "org1", "topic_id": null,
            "created_at": "2024-05-01T12:00:00.123456+00:00",
            "updated_at": "2024-05-01T12:00:00+00:00", "access_count": 2
        }"#;
        let entry: MemoryEntry = serde_json::from_str(row).unwrap();
        assert_eq!(entry.category, MemoryCategory::Project);
        assert_eq!(entry.embedding, Some(vec![0.1, 0.2]));
        assert_eq!(entry.access_count, 2);
    }

    #[test]
    fn test_api_key_validation() {
        let key = NewApiKey {
            name: "stripe".to_string(),
            value: SecretString::new(String::new()),
            key_type: "payment".to_string(),
            environment: String::new(),
            project_id: "p1".to_string(),
            tags: vec![],
            rotation_days: None,
            user_id: "u1".to_string(),
            organization_id: "org1".to_string(),
        };
        let err = key.validate().unwrap_err();
        assert!(matches!(err, MemoError::Validation(_)));
        assert!(err.to_string().contains("value, environment"));
    }

    #[test]
    fn test_api_key_rotation_must_be_positive() {
        let key = NewApiKey {
            name: "stripe".to_string(),
            value: SecretString::new("sk_live".to_string()),
            key_type: "payment".to_string(),
            environment: "production".to_string(),
            project_id: "p1".to_string(),
            tags: vec![],
            rotation_days: Some(0),
            user_id: "u1".to_string(),
            organization_id: "org1".to_string(),
        };
        assert!(key.validate().is_err());
    }
}
