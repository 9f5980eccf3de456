mod cli;
mod config;
mod service;
mod ui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, KeyAction, SecretAction};
use service::{add, auth, delete, init, list, search, secret, show, update};

/// 日志过滤变量，例如 MEMO_LOG=memo_remote=debug
const LOG_ENV: &str = "MEMO_LOG";

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run(Cli::parse()).await {
        ui::Output::new().error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { local } => init::initialize(local).await,

        Commands::Add {
            input,
            title,
            category,
            tags,
            topic,
            scope,
        } => {
            add::add(
                add::AddOptions {
                    input,
                    title,
                    category,
                    tags,
                    topic,
                },
                scope,
            )
            .await
        }

        Commands::Search {
            query,
            limit,
            threshold,
            category,
            tags,
            topic,
            user,
            scope,
        } => {
            search::search(
                search::SearchArgs {
                    query,
                    limit,
                    threshold,
                    categories: category,
                    tags,
                    topic,
                    user,
                },
                scope,
            )
            .await
        }

        Commands::Show { id, scope } => show::show(&id, scope).await,

        Commands::Update {
            id,
            title,
            content,
            file,
            category,
            tags,
            topic,
            scope,
        } => {
            update::update(
                &id,
                update::UpdateArgs {
                    title,
                    content,
                    file,
                    category,
                    tags,
                    topic,
                },
                scope,
            )
            .await
        }

        Commands::Delete { id, force, scope } => delete::delete(&id, force, scope).await,

        Commands::List { limit, scope } => list::list(limit, scope).await,

        Commands::Count { scope } => list::count(scope).await,

        Commands::Secret { action } => match action {
            SecretAction::Set { name, value, scope } => {
                secret::set_secret(&name, value, scope).await
            }
            SecretAction::Get { name, scope } => secret::get_secret(&name, scope).await,
        },

        Commands::Key { action } => match action {
            KeyAction::Create {
                name,
                key_type,
                environment,
                project,
                value,
                tags,
                rotation_days,
                scope,
            } => {
                secret::create_key(
                    secret::KeyArgs {
                        name,
                        key_type,
                        environment,
                        project,
                        value,
                        tags,
                        rotation_days,
                    },
                    scope,
                )
                .await
            }
            KeyAction::List { scope } => secret::list_keys(scope).await,
        },

        Commands::Login { token } => auth::login(token),

        Commands::Logout => auth::logout(),

        Commands::Mode { mode, scope } => auth::set_mode(&mode, scope),

        Commands::Config { scope } => auth::show_config(scope),
    }
}
