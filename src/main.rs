use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod tracking;
mod ws;

#[cfg(test)]
mod test;

use config::Config;
use handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chargement_server=info,tower_http=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let pool = db::init_db_pool(&config.database_url, config.max_connections).await?;
    if config.seed_sample_data {
        db::seed_sample_data(&pool).await?;
    }

    let app = handlers::router(AppState::new(pool)).layer(TraceLayer::new_for_http());

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Shipment server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
