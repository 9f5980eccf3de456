use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memo")]
#[command(version, about = "Cloud memo client with semantic search and secret storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Which config.toml to use
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ScopeArgs {
    /// Use local config (./.memo/config.toml)
    #[arg(short, long)]
    pub local: bool,

    /// Use global config (~/.memo/config.toml)
    #[arg(short, long)]
    pub global: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create config templates")]
    Init {
        /// Initialize in local directory (./.memo) instead of global (~/.memo)
        #[arg(short, long)]
        local: bool,
    },

    #[command(about = "Save a memory from text or a file")]
    Add {
        /// Text string or file path
        input: String,

        /// Title (default: first line of the content)
        #[arg(long)]
        title: Option<String>,

        /// Category (context, project, knowledge, reference, personal, workflow)
        #[arg(short = 'c', long)]
        category: Option<String>,

        /// Tags (comma-separated, e.g., "rust,cli,important")
        #[arg(short = 't', long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Topic the memory belongs to
        #[arg(long)]
        topic: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Search memories by semantic similarity")]
    Search {
        query: String,

        /// Maximum number of results (default: search_limit from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Minimum similarity 0.0-1.0 (default: similarity_threshold from config)
        #[arg(short = 't', long)]
        threshold: Option<f32>,

        /// Only these categories (comma-separated)
        #[arg(long, value_delimiter = ',')]
        category: Option<Vec<String>>,

        /// Only memories carrying these tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Only this topic
        #[arg(long)]
        topic: Option<String>,

        /// Only memories of this user
        #[arg(long)]
        user: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Show one memory")]
    Show {
        id: String,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Edit a memory (content changes are re-embedded)")]
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// New content text
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Read new content from a file
        #[arg(long)]
        file: Option<String>,

        #[arg(short = 'c', long)]
        category: Option<String>,

        /// Replace tags (comma-separated)
        #[arg(short = 't', long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        #[arg(long)]
        topic: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Delete a memory")]
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "List recent memories")]
    List {
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Count memories of the organization")]
    Count {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Store and read named secrets")]
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    #[command(about = "Manage API key records")]
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    #[command(about = "Save an access token for auto auth mode")]
    Login {
        /// Access token (prompted when omitted)
        #[arg(long, env = "MEMO_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    #[command(about = "Remove the saved access token")]
    Logout,

    #[command(about = "Set the authentication mode")]
    Mode {
        /// auto or manual
        mode: String,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Show the active configuration")]
    Config {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Subcommand)]
pub enum SecretAction {
    #[command(about = "Create or replace a secret")]
    Set {
        name: String,

        /// Secret value (prompted when omitted)
        value: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "Print a secret value")]
    Get {
        name: String,

        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Subcommand)]
pub enum KeyAction {
    #[command(about = "Store a new API key")]
    Create {
        name: String,

        /// Key type, e.g. "payment"
        #[arg(long = "type")]
        key_type: String,

        /// Environment, e.g. "production"
        #[arg(long)]
        environment: String,

        /// Owning project id
        #[arg(long)]
        project: String,

        /// Key value (prompted when omitted)
        #[arg(long)]
        value: Option<String>,

        #[arg(short = 't', long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Rotation interval in days
        #[arg(long)]
        rotation_days: Option<u32>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    #[command(about = "List API keys (values are never shown)")]
    List {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}
