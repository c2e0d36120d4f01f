//! Apply schema migrations without starting the server

use anyhow::{Context, Result};
use clap::Parser;

use segmentctl_core::config::redact_url;
use segmentctl_core::SegmentctlConfig;
use segmentctl_server::db::{create_pool, run_migrations};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config: SegmentctlConfig) -> Result<()> {
    let url = args.database_url.unwrap_or(config.database.url);
    tracing::info!(database = %redact_url(&url), "Migrating");

    let pool = create_pool(&url)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    pool.close().await;
    Ok(())
}
