use anyhow::Result;
use dialoguer::Confirm;

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;

pub async fn delete(id: &str, skip_confirm: bool, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let service = ctx.memory_service()?;
    output.store_info(&ctx.config.store.url, ctx.organization_id(), None);

    let entry = match service.get_by_id(id, ctx.organization_id()).await? {
        Some(entry) => entry,
        None => anyhow::bail!("Memory {} not found in {}", id, ctx.organization_id()),
    };

    output.warning(&format!(
        "this will permanently delete memory {} \"{}\"",
        entry.id, entry.title
    ));

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this memory?")
            .default(false)
            .interact()?;
        if !confirmed {
            output.info("Operation cancelled");
            return Ok(());
        }
    }

    output.begin_operation("Deleting", &format!("memory {}", id));
    service.delete(id).await?;

    output.finish("delete", ctx.scope);

    Ok(())
}
