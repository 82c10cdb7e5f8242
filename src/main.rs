use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use cinema_booking::config::AppConfig;
use cinema_booking::db;
use cinema_booking::handlers;
use cinema_booking::services::expiry;
use cinema_booking::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.seed_demo_data {
        let demo = db::seed::seed_demo(&conn).context("failed to seed demo data")?;
        tracing::info!(
            schedule_id = %demo.schedule.id,
            customer_token = %demo.customer.token,
            admin_token = %demo.admin.token,
            "seeded demo catalog"
        );
    }

    let state = Arc::new(AppState::new(conn, config.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = expiry::spawn_sweeper(Arc::clone(&state), shutdown_rx);

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "expiry sweep task failed");
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
