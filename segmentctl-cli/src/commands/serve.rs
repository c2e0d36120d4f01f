//! HTTP server command

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use segmentctl_core::config::redact_url;
use segmentctl_core::SegmentctlConfig;
use segmentctl_server::db::{create_pool_with_options, run_migrations};
use segmentctl_server::{run_server, MemoryStore, PgStore, ServerConfig, Store};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config; default 127.0.0.1:8080)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pool connections (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_connections: Option<u32>,

    /// Keep everything in process memory instead of PostgreSQL (database flags are ignored)
    #[arg(long)]
    pub in_memory: bool,

    /// Skip running migrations at startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: SegmentctlConfig) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if args.cors_permissive {
        config.server.cors_permissive = true;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    if let Some(max) = args.max_connections {
        config.database.max_connections = max;
    }

    let pg_store = if args.in_memory {
        tracing::warn!("Using in-memory store; data is lost on shutdown");
        None
    } else {
        tracing::info!(database = %redact_url(&config.database.url), "Connecting to database");
        let pool = create_pool_with_options(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to create database pool")?;

        if !args.skip_migrations {
            run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
        }
        Some(PgStore::new(pool))
    };

    let store: Arc<dyn Store> = match &pg_store {
        Some(pg) => Arc::new(pg.clone()),
        None => Arc::new(MemoryStore::new()),
    };

    tracing::info!("Starting segmentctl server on {}", config.server.bind);

    run_server(store, ServerConfig::from(&config))
        .await
        .context("Server error")?;

    if let Some(pg) = pg_store {
        pg.pool().close().await;
        tracing::info!("Database pool closed");
    }

    Ok(())
}
