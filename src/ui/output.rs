use console::Style;
use memo_types::{ApiKeyRecord, MemoryEntry, ScoredMemory};
use std::path::Path;

/// Cargo 风格的终端输出
/// 状态行写到 stderr，结果写到 stdout
pub struct Output {
    green: Style,
    bold: Style,
    dim: Style,
}

impl Output {
    pub fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            bold: Style::new().bold(),
            dim: Style::new().dim(),
        }
    }

    /// "    Encoding query"（动词右对齐到 12 列）
    pub fn status(&self, action: &str, target: &str) {
        eprintln!("{:>12} {}", self.green.apply_to(action), target);
    }

    /// 前面带空行的状态行，用于提示之后开始的操作
    pub fn begin_operation(&self, action: &str, target: &str) {
        eprintln!();
        self.status(action, target);
    }

    /// "       Store https://abc.supabase.co (org1, 42 memories)"
    pub fn store_info(&self, url: &str, organization_id: &str, count: Option<usize>) {
        let detail = match count {
            Some(n) => format!("({}, {} memories)", organization_id, n),
            None => format!("({})", organization_id),
        };
        eprintln!(
            "{:>12} {} {}",
            self.green.apply_to("Store"),
            url,
            self.dim.apply_to(detail)
        );
        eprintln!();
    }

    /// "    Creating config at /path/to/config"
    pub fn resource_action(&self, action: &str, resource: &str, path: &Path) {
        eprintln!(
            "{:>12} {} at {}",
            self.green.apply_to(action),
            resource,
            path.display()
        );
    }

    pub fn finish(&self, action: &str, scope: &str) {
        eprintln!();
        eprintln!(
            "{:>12} {} for {} scope",
            self.green.apply_to("Finished"),
            action,
            scope
        );
    }

    pub fn finish_simple(&self, action: &str) {
        eprintln!("{:>12} {}", self.green.apply_to("Finished"), action);
    }

    pub fn note(&self, message: &str) {
        eprintln!("{:>12} {}", self.dim.apply_to("Note"), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!();
        eprintln!(
            "{:>12} {}",
            Style::new().yellow().bold().apply_to("Warning"),
            message
        );
        eprintln!();
    }

    pub fn error(&self, message: &str) {
        eprintln!(
            "{:>12} {}",
            Style::new().red().bold().apply_to("Error"),
            message
        );
    }

    pub fn info(&self, message: &str) {
        println!("{:>12} {}", "", message);
    }

    /// 配置视图里的 "key = value" 行
    pub fn field(&self, key: &str, value: &str) {
        println!("{:>24} {}", self.dim.apply_to(key), value);
    }

    /// 搜索结果和列表条目共用的标题行：
    /// "[1/5] 0.89 id title (date) [tag1, tag2]"
    #[allow(clippy::too_many_arguments)]
    fn item_header(
        &self,
        index: usize,
        total: usize,
        score: Option<f32>,
        id: &str,
        title: &str,
        date: Option<String>,
        tags: &[String],
    ) -> usize {
        let index_part = format!("{}/{}", index, total);

        let score_part = match score {
            Some(s) => format!(" {}", self.green.apply_to(format!("{:.2}", s))),
            None => String::new(),
        };

        let date_part = date
            .map(|d| format!(" {}", self.dim.apply_to(format!("({})", d))))
            .unwrap_or_default();

        let tags_part = if tags.is_empty() {
            String::new()
        } else {
            format!(" {}", self.dim.apply_to(format!("[{}]", tags.join(", "))))
        };

        println!(
            "[{}]{} {} {}{}{}",
            self.dim.apply_to(&index_part),
            score_part,
            self.bold.apply_to(id),
            title,
            date_part,
            tags_part
        );

        // " 0.89" 占 5 列
        let score_width = if score.is_some() { 5 } else { 0 };
        index_part.len() + 2 + score_width + 1
    }

    fn body(&self, indent_width: usize, content: &str) {
        let indent = " ".repeat(indent_width);
        for line in content.lines() {
            println!("{}{}", indent, line);
        }
    }

    /// 按分数排序的搜索结果，附完整内容
    pub fn search_results(&self, results: &[ScoredMemory]) {
        let total = results.len();
        for (i, result) in results.iter().enumerate() {
            let indent = self.item_header(
                i + 1,
                total,
                Some(result.score),
                &result.id,
                &result.title,
                result.updated_at.map(|d| format_date(&d)),
                &result.tags,
            );
            self.body(indent, &result.content);

            if i + 1 < total {
                println!();
            }
        }
    }

    /// 列表：每条一个标题行加内容首行
    pub fn list_items(&self, entries: &[MemoryEntry]) {
        let total = entries.len();
        for (i, entry) in entries.iter().enumerate() {
            let indent = self.item_header(
                i + 1,
                total,
                None,
                &entry.id,
                &entry.title,
                Some(format_date(&entry.updated_at)),
                &entry.tags,
            );
            if let Some(first) = entry.content.lines().find(|l| !l.trim().is_empty()) {
                self.body(indent, first);
            }

            if i + 1 < total {
                println!();
            }
        }
    }

    /// 记忆详情
    pub fn memory_detail(&self, entry: &MemoryEntry) {
        println!("{}", self.bold.apply_to(&entry.title));
        self.field("id", &entry.id);
        self.field("category", entry.category.as_str());
        if !entry.tags.is_empty() {
            self.field("tags", &entry.tags.join(", "));
        }
        if let Some(topic) = &entry.topic_id {
            self.field("topic", topic);
        }
        self.field("owner", &entry.user_id);
        self.field("created", &format_date(&entry.created_at));
        self.field("updated", &format_date(&entry.updated_at));
        self.field("accessed", &entry.access_count.to_string());
        println!();
        println!("{}", entry.content);
    }

    /// API key 列表（不含值）
    pub fn api_keys(&self, keys: &[ApiKeyRecord]) {
        for key in keys {
            let rotation = key
                .rotation_days
                .map(|d| format!("rotate every {}d", d))
                .unwrap_or_else(|| "no rotation".to_string());
            let tags = if key.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", key.tags.join(", "))
            };

            println!(
                "{} {} {}/{} project={}{} {}",
                self.bold.apply_to(&key.id),
                key.name,
                key.key_type,
                key.environment,
                key.project_id,
                self.dim.apply_to(tags),
                self.dim.apply_to(format!("({}, {})", format_date(&key.created_at), rotation))
            );
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

fn format_date(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// 只显示凭据开头几位
pub fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
