mod app_config;
mod credentials;
mod providers;

pub use app_config::{AppConfig, AuthMode};
pub use credentials::Credentials;
pub use providers::{ProvidersConfig, PROVIDERS_TEMPLATE};
