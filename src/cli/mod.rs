//! Command-line interface.

pub mod completions;
pub mod context;
pub mod info;
pub mod output;
pub mod rotate;
pub mod run;
pub mod secrets;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::constants;
use crate::error::Result;

pub use context::Context;

/// Kryptos - a versioned, encrypted store for environment secrets.
#[derive(Parser)]
#[command(
    name = "kryptos",
    about = "A versioned, encrypted store for environment secrets",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to the store database
    #[arg(long, global = true, env = constants::ENV_DATABASE, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Project id to use instead of detecting it from the working directory
    #[arg(long, global = true, env = constants::ENV_PROJECT, value_name = "ID")]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Store a new version of a secret
    Set {
        /// Secret key (e.g., DATABASE_URL)
        key: String,
        /// Secret value
        value: String,
        /// Store in the global scope instead of the current project
        #[arg(short, long)]
        global: bool,
    },

    /// Remove old versions of a secret
    Rm {
        /// Secret key
        key: String,
        /// Also remove the current version, promoting the previous one
        #[arg(short, long)]
        all: bool,
        /// Act on the global scope instead of the current project
        #[arg(short, long)]
        global: bool,
    },

    /// Print the effective value of a secret
    Grep {
        /// Secret key
        key: String,
    },

    /// Re-encrypt every secret under a new key
    Rotate {
        /// New key (AGE-SECRET-KEY-1...); generated if omitted
        #[arg(
            short,
            long,
            env = "KRYPTOS_NEW_ENCRYPTION_KEY",
            hide_env_values = true,
            value_name = "KEY"
        )]
        encryption_key: Option<String>,
    },

    /// Print every effective secret for the current project
    Cat {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write every effective secret to an env file
    Dump {
        /// Target file
        #[arg(short, long, default_value = constants::ENV_FILE)]
        output: PathBuf,
    },

    /// Delete old versions of every secret in a scope
    Prune {
        /// Number of most recent old versions to keep
        #[arg(default_value_t = 0)]
        offset: usize,
        /// Also remove the current versions, promoting the previous ones
        #[arg(short, long)]
        all: bool,
        /// Act on the global scope instead of the current project
        #[arg(short, long)]
        global: bool,
    },

    /// Show store metadata
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the versions of a secret
    History {
        /// Secret key
        key: String,
        /// Show the global scope instead of the current project
        #[arg(short, long)]
        global: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a command with secrets injected as env vars
    Run {
        /// Command and arguments to run
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let ctx = Context::new(cli.database, cli.project);

    match cli.command {
        Set { key, value, global } => secrets::set(&ctx, &key, &value, global),
        Rm { key, all, global } => secrets::rm(&ctx, &key, all, global),
        Grep { key } => secrets::grep(&ctx, &key),
        Rotate { encryption_key } => rotate::execute(&ctx, encryption_key),
        Cat { json } => secrets::cat(&ctx, json),
        Dump { output } => secrets::dump(&ctx, &output),
        Prune { offset, all, global } => secrets::prune(&ctx, offset, all, global),
        Info { json } => info::execute(&ctx, json),
        History { key, global, json } => secrets::history(&ctx, &key, global, json),
        Run { command } => run::execute(&ctx, &command),
        Completions { shell } => completions::execute(shell),
    }
}
