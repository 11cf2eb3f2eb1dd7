//! rangepage listing server
//!
//! Serves filtered, cursor-paginated listings of products and orders out of
//! a SQLite-backed partition store.
//!
//! Usage:
//!   rangepage-server --port 4100 --database listings.db

use anyhow::{Context, Result};
use clap::Parser;
use rangepage_server::{
    AppState, ServerConfig, StaticCredentials, build_router, orders_schema, products_schema,
};
use rangepage_store::{PartitionStore, SqliteStore, TableSchema};
use std::{path::PathBuf, sync::Arc};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rangepage-server")]
#[command(about = "Filtered, cursor-paginated listings over a partition store")]
struct Args {
    /// HTTP port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long, env = "RANGEPAGE_DATABASE")]
    database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn open_store(config: &ServerConfig, schema: TableSchema) -> Result<Arc<dyn PartitionStore>> {
    let name = schema.name.clone();
    let store = match &config.database {
        Some(path) => SqliteStore::open(path, schema)
            .with_context(|| format!("opening table {name} in {}", path.display()))?,
        None => SqliteStore::open_in_memory(schema)
            .with_context(|| format!("opening in-memory table {name}"))?,
    };
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database = Some(database);
    }

    info!("rangepage server starting...");
    if config.database.is_none() {
        warn!("No database configured, listings are served from an empty in-memory store");
    }

    let products = open_store(&config, products_schema(&config.products_table))?;
    let orders = open_store(&config, orders_schema(&config.orders_table))?;
    let credentials = StaticCredentials::new(config.credentials.clone());
    if credentials.is_empty() {
        warn!("No credentials configured, order history will reject every request");
    }

    let state = Arc::new(AppState::new(
        products,
        orders,
        Arc::new(credentials),
        &config,
    ));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding HTTP port {}", config.port))?;
    info!("HTTP listings listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;
    Ok(())
}
