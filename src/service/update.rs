use anyhow::{Context, Result};

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;
use memo_types::{normalize_tags, MemoryCategory, MemoryEntry, MemoryPatch};

#[derive(Default)]
pub struct UpdateArgs {
    pub title: Option<String>,
    pub content: Option<String>,
    pub file: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub topic: Option<String>,
}

pub async fn update(id: &str, args: UpdateArgs, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let service = ctx.memory_service()?;
    output.store_info(&ctx.config.store.url, ctx.organization_id(), None);

    let current = service
        .get_by_id(id, ctx.organization_id())
        .await?
        .with_context(|| format!("Memory {} not found in {}", id, ctx.organization_id()))?;

    let edited = apply_edits(&current, args)?;
    let patch = MemoryPatch::diff(&current, &edited);

    if patch.is_empty() {
        output.info("Nothing changed");
        return Ok(());
    }

    if patch.changes_content() {
        output.status("Encoding", "new content");
    }
    output.status("Updating", &format!("memory {}", id));
    let entry = service.update(id, patch).await?;

    output.status("Saved", &format!("memory {} \"{}\"", entry.id, entry.title));
    output.finish("update", ctx.scope);

    Ok(())
}

/// 应用编辑后的 `current` 副本
fn apply_edits(current: &MemoryEntry, args: UpdateArgs) -> Result<MemoryEntry> {
    let mut edited = current.clone();

    if let Some(title) = args.title {
        edited.title = title;
    }
    if let Some(path) = args.file {
        edited.content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path))?;
    } else if let Some(content) = args.content {
        edited.content = content;
    }
    if let Some(category) = args.category {
        edited.category = category.parse::<MemoryCategory>()?;
    }
    if let Some(tags) = args.tags {
        edited.tags = normalize_tags(tags);
    }
    if let Some(topic) = args.topic {
        edited.topic_id = Some(topic);
    }

    Ok(edited)
}
