use anyhow::{Context, Result};
use std::path::Path;

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;
use memo_types::{derive_title, MemoryCategory, NewMemory};

pub struct AddOptions {
    pub input: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub topic: Option<String>,
}

pub async fn add(options: AddOptions, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let (content, source) = read_input(&options.input)?;

    let category = match options.category.as_deref() {
        Some(c) => c.parse::<MemoryCategory>()?,
        None => ctx.config.default_category,
    };
    let title = options
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| derive_title(&content));

    let mut memory = NewMemory::new(title, content, ctx.user_id(), ctx.organization_id())
        .with_category(category)
        .with_tags(options.tags.unwrap_or_default());
    if let Some(topic) = options.topic {
        memory = memory.with_topic(topic);
    }

    let service = ctx.memory_service()?;
    output.store_info(&ctx.config.store.url, ctx.organization_id(), None);

    output.status(
        "Encoding",
        &format!("{} ({}/{}d)", source, service.embedder().model(), service.embedder().dimension()),
    );
    let entry = service.create(memory).await?;

    output.status("Saved", &format!("memory {} \"{}\"", entry.id, entry.title));
    output.finish("add", ctx.scope);

    Ok(())
}

/// 文本或文件内容，以及状态输出用的标签
fn read_input(input: &str) -> Result<(String, String)> {
    let path = Path::new(input);
    if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Ok((content, path.display().to_string()))
    } else {
        Ok((input.to_string(), "text".to_string()))
    }
}
