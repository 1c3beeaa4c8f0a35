use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salonbook::cli::{Cli, Commands};
use salonbook::config::Config;
use salonbook::engine::{spawn_cleanup_task, BookingCleanup};
use salonbook::payment::PaymentClient;
use salonbook::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize database
    let db = salonbook::db::init(&config.database).await?;

    match cli.command() {
        Commands::Cleanup => {
            let cleanup = BookingCleanup::new(db, config.cleanup.clone());
            let removed = cleanup.run_cleanup(chrono::Local::now().date_naive()).await?;
            println!("Removed {} expired booking(s)", removed);
            Ok(())
        }
        Commands::Serve => serve(config, db).await,
    }
}

async fn serve(config: Config, db: salonbook::DbPool) -> Result<()> {
    tracing::info!("Starting Salonbook v{}", env!("CARGO_PKG_VERSION"));

    salonbook::db::seed_services(&db).await?;
    salonbook::db::ensure_admin_user(
        &db,
        &config.auth.admin_email,
        config.auth.admin_password.as_deref(),
    )
    .await?;

    let payments = PaymentClient::new(&config.payment)?;
    if !payments.is_configured() {
        tracing::warn!("No payment secret key configured, /api/payment will return 503");
    }

    let state = Arc::new(AppState::new(config.clone(), db.clone(), payments));

    // Background tasks
    spawn_cleanup_task(db, config.cleanup.clone())?;
    if config.rate_limit.enabled {
        salonbook::api::rate_limit::spawn_cleanup_task(
            state.rate_limiter.clone(),
            config.rate_limit.cleanup_interval,
        );
    }

    let app = salonbook::api::create_router(state);

    let api_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;

    tracing::info!("API server listening on http://{}", api_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
