use anyhow::Result;

use crate::config::{AppConfig, ProvidersConfig, PROVIDERS_TEMPLATE};
use crate::ui::Output;

const CONFIG_TEMPLATE: &str = r#"# Embedding service, "<provider>.<service>" from providers.toml
embedding = "openai.embed"

# auto: token from MEMO_ACCESS_TOKEN or 'memo login'; manual: store.access_token
auth_mode = "auto"

default_category = "context"
search_limit = 10
similarity_threshold = 0.7
refresh_interval_secs = 300

[store]
url = "https://your-project.supabase.co"
anon_key = ""
organization_id = ""
user_id = ""
"#;

/// 写入配置模板，已有文件保持不变
pub async fn initialize(local: bool) -> Result<()> {
    let output = Output::new();
    let config_dir = AppConfig::get_memo_dir(local);
    let config_path = config_dir.join("config.toml");
    let providers_path = ProvidersConfig::config_path()?;
    let location = if local { "local" } else { "global" };

    std::fs::create_dir_all(&config_dir)?;

    // providers.toml 只放在全局目录
    if providers_path.exists() {
        output.resource_action("Found", "providers config", &providers_path);
    } else {
        if let Some(parent) = providers_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&providers_path, PROVIDERS_TEMPLATE)?;
        output.resource_action("Creating", "providers config", &providers_path);
        output.note("Fill in the api_key of the provider you use");
    }

    if config_path.exists() {
        output.resource_action("Found", "config", &config_path);
        if let Err(e) = AppConfig::load_from_path(&config_path) {
            output.warning(&format!("{:#}", e));
        }
    } else {
        std::fs::write(&config_path, CONFIG_TEMPLATE)?;
        output.resource_action("Creating", "config", &config_path);
        output.note("Set the store url, anon_key, organization_id and user_id");
    }

    output.finish("initialization", location);

    Ok(())
}
