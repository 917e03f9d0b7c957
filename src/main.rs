use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use users_api::config::Config;
use users_api::{Server, app, pool};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.debug)?;

    let pool = pool::create_pool_with_options(&config.database_url, config.max_connections)
        .await
        .context("failed to connect to database")?;
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("failed to ping database")?;
    info!(max_connections = config.max_connections, "database pool ready");

    let served = Server::bind(config.addr)
        .grace_period(config.shutdown_grace())
        .header_read_timeout(config.header_read_timeout())
        .serve(app(pool.clone()))
        .await;

    pool.close().await;
    info!("database pool closed");

    served.context("server failed")
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
