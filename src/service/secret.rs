use anyhow::Result;
use dialoguer::Password;

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;
use memo_types::{normalize_tags, NewApiKey, SecretBackend};
use secrecy::{ExposeSecret, SecretString};

pub async fn set_secret(name: &str, value: Option<String>, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let value = match value {
        Some(v) => SecretString::new(v),
        None => prompt_secret(&format!("Value for '{}'", name))?,
    };

    output.status("Storing", &format!("secret '{}'", name));
    ctx.secrets()
        .put_secret(ctx.organization_id(), name, &value)
        .await?;
    output.finish_simple(&format!("secret '{}' saved", name));

    Ok(())
}

/// 原样输出到 stdout，方便管道使用
pub async fn get_secret(name: &str, scope: ScopeArgs) -> Result<()> {
    let ctx = CommandContext::load(scope)?;
    let value = ctx.secrets().get_secret(ctx.organization_id(), name).await?;
    println!("{}", value.expose_secret());
    Ok(())
}

pub struct KeyArgs {
    pub name: String,
    pub key_type: String,
    pub environment: String,
    pub project: String,
    pub value: Option<String>,
    pub tags: Option<Vec<String>>,
    pub rotation_days: Option<u32>,
}

pub async fn create_key(args: KeyArgs, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let value = match args.value {
        Some(v) => SecretString::new(v),
        None => prompt_secret(&format!("Value of API key '{}'", args.name))?,
    };

    let key = NewApiKey {
        name: args.name,
        value,
        key_type: args.key_type,
        environment: args.environment,
        project_id: args.project,
        tags: normalize_tags(args.tags.unwrap_or_default()),
        rotation_days: args.rotation_days,
        user_id: ctx.user_id().to_string(),
        organization_id: ctx.organization_id().to_string(),
    };

    output.status("Storing", &format!("API key '{}'", key.name));
    let record = ctx.secrets().create_api_key(key).await?;
    output.api_keys(std::slice::from_ref(&record));

    Ok(())
}

pub async fn list_keys(scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let keys = ctx.secrets().list_api_keys(ctx.organization_id()).await?;
    if keys.is_empty() {
        output.info("No API keys stored");
    } else {
        output.api_keys(&keys);
    }

    Ok(())
}

fn prompt_secret(prompt: &str) -> Result<SecretString> {
    let value = Password::new().with_prompt(prompt).interact()?;
    Ok(SecretString::new(value))
}
