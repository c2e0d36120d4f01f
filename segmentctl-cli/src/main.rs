//! segmentctl - users, segments and membership reconciliation over HTTP
//!
//! Subcommands:
//! - `serve`: run the HTTP API (PostgreSQL or in-memory store)
//! - `migrate`: apply schema migrations
//! - `config`: show where configuration comes from and what it resolves to
//! - `completions`: generate shell completion scripts

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use segmentctl_core::SegmentctlConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "segmentctl",
    author,
    version,
    about = "User segment membership service",
    long_about = "Manage users and segments, and reconcile a user's segment memberships \
                  atomically through a JSON HTTP API backed by PostgreSQL."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: $SEGMENTCTL_CONFIG or ~/.segmentctl/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply pending database migrations and exit
    Migrate(commands::migrate::MigrateArgs),
    /// Inspect configuration (path, show)
    Config(commands::config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init_tracing(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => {
            let (_, config) = load_config(cli.config)?;
            commands::run_serve(args, config).await?
        }
        Commands::Migrate(args) => {
            let (_, config) = load_config(cli.config)?;
            commands::run_migrate(args, config).await?
        }
        Commands::Config(args) => {
            let (path, config) = load_config(cli.config)?;
            commands::run_config(args, &path, &config)?
        }
        Commands::Completions(args) => run_completions(args)?,
    }

    Ok(())
}

/// Resolve the config file path and load it with environment overrides
fn load_config(explicit: Option<PathBuf>) -> Result<(PathBuf, SegmentctlConfig)> {
    let path = explicit.clone().unwrap_or_else(SegmentctlConfig::config_path);
    let config = match explicit {
        Some(path) => SegmentctlConfig::load_from(&path),
        None => SegmentctlConfig::load(),
    }
    .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((path, config))
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
