use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bcr_api::{build_router, database, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bcr_api=debug,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = database::create_connection_pool(&config)
        .await
        .context("failed to connect to the database")?;

    // Run database migrations
    database::run_migrations(&pool)
        .await
        .context("failed to prepare the database schema")?;

    let app = build_router(AppState::from_pool(pool, &config));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("{} API listening on http://{}", config.service_name, addr);

    axum::serve(listener, app).await?;

    Ok(())
}
