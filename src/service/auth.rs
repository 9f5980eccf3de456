use anyhow::Result;
use dialoguer::Password;

use crate::cli::ScopeArgs;
use crate::config::{AppConfig, AuthMode, Credentials};
use crate::ui::Output;

pub fn login(token: Option<String>) -> Result<()> {
    let output = Output::new();

    let token = match token {
        Some(t) => t,
        None => Password::new().with_prompt("Access token").interact()?,
    };
    if token.trim().is_empty() {
        anyhow::bail!("Access token is empty");
    }

    let path = Credentials::new(token.trim()).save()?;
    output.resource_action("Saved", "access token", &path);
    output.note("Used when auth_mode = \"auto\"");

    Ok(())
}

pub fn logout() -> Result<()> {
    let output = Output::new();

    if Credentials::remove()? {
        output.finish_simple("logout");
    } else {
        output.info("Not logged in");
    }

    Ok(())
}

pub fn set_mode(mode: &str, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    AppConfig::validate_scope_flags(scope.local, scope.global)?;

    let mode: AuthMode = mode.parse()?;
    let path = AppConfig::config_path(scope.local, scope.global);

    let mut config = AppConfig::load_from_path(&path)?;
    config.auth_mode = mode;
    config.save_to(&path)?;

    output.status("Auth mode", &mode.to_string());
    if mode == AuthMode::Manual && config.store.access_token.is_none() {
        output.note("Set store.access_token in the config, requests use the anon key until then");
    }
    output.finish(
        "mode change",
        AppConfig::get_scope_name(scope.local, scope.global),
    );

    Ok(())
}

pub fn show_config(scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    AppConfig::validate_scope_flags(scope.local, scope.global)?;

    let path = AppConfig::config_path(scope.local, scope.global);
    let config = AppConfig::load_from_path(&path)?;

    output.field("file", &path.display().to_string());
    output.field("embedding", &config.embedding);
    output.field("auth_mode", &config.auth_mode.to_string());
    output.field("default_category", config.default_category.as_str());
    output.field("search_limit", &config.search_limit.to_string());
    output.field(
        "similarity_threshold",
        &format!("{:.2}", config.similarity_threshold),
    );
    output.field(
        "refresh_interval_secs",
        &config.refresh_interval_secs.to_string(),
    );
    output.field("store.url", &config.store.url);
    output.field("store.anon_key", &crate::ui::redact(&config.store.anon_key));
    output.field("store.organization_id", &config.store.organization_id);
    output.field("store.user_id", &config.store.user_id);

    let token = match config.access_token()? {
        Some(t) => crate::ui::redact(&t),
        None => "(none, anon key is used)".to_string(),
    };
    output.field("access_token", &token);

    Ok(())
}
