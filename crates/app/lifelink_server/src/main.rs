//! Lifelink API server binary.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use lifelink_api::{AppState, config::ApiConfig};
use lifelink_core::store::cache::ConnectionCache;
use lifelink_core::store::postgres::PgConnector;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "lifelink_server", about = "Lifelink API server")]
struct Args {
    /// Address to bind (overrides BIND_ADDR).
    #[arg(long)]
    bind: Option<String>,

    /// Resource store connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "")]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,lifelink_api=debug,lifelink_core=debug".parse().unwrap()
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.database_url = args.database_url;

    // Signing and verification key material is loaded once here and never
    // mutated afterwards.
    let verifier = Arc::new(config.identity_verifier()?);

    let cache = Arc::new(ConnectionCache::new(
        PgConnector::new(config.database_url.clone()).with_max_connections(args.max_connections),
    ));

    // Warm the store handle so migrations run before traffic arrives. Not
    // fatal: the cache retries on the first request that needs the store.
    if let Err(e) = cache.acquire().await {
        warn!(error = %e, "resource store not reachable yet; will retry per request");
    }

    let state = AppState {
        store: cache,
        verifier,
        config: config.clone(),
    };
    let app = lifelink_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        version = lifelink_core::version(),
        "Lifelink API listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
