use anyhow::Result;

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;

pub async fn show(id: &str, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let service = ctx.memory_service()?;
    match service.get_by_id(id, ctx.organization_id()).await? {
        Some(entry) => output.memory_detail(&entry),
        None => anyhow::bail!("Memory {} not found in {}", id, ctx.organization_id()),
    }

    Ok(())
}
