use anyhow::Result;

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;

pub async fn list(limit: usize, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    if limit == 0 {
        anyhow::bail!("--limit must be at least 1");
    }

    let service = ctx.memory_service()?;
    let record_count = service.count(ctx.organization_id()).await?;
    output.store_info(&ctx.config.store.url, ctx.organization_id(), Some(record_count));

    if record_count == 0 {
        output.info("No memories found. Use 'memo add' to create one!");
        return Ok(());
    }

    let entries = service.list(ctx.organization_id(), limit).await?;
    output.list_items(&entries);

    if record_count > entries.len() {
        eprintln!();
        output.note(&format!(
            "showing {} of {}, use -n to see more",
            entries.len(),
            record_count
        ));
    }

    Ok(())
}

pub async fn count(scope: ScopeArgs) -> Result<()> {
    let ctx = CommandContext::load(scope)?;
    let total = ctx.memory_service()?.count(ctx.organization_id()).await?;
    println!("{}", total);
    Ok(())
}
