//! # BugTrail API Server
//!
//! REST backend for the BugTrail bug tracker: email+OTP registration,
//! JWT sessions, projects with member teams, tickets, and comments.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p bugtrail-api
//! ```

use bugtrail_api::{app, config::Config};
use bugtrail_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bugtrail_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "BugTrail API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    migrations::ensure_database_exists(&config.database.url).await?;

    let db_config = pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    };
    let db = pool::create_pool(db_config).await?;

    migrations::run_migrations(&db).await?;

    let state = app::AppState::new(db, config.clone());
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received, draining...");
}
