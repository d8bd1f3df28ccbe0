//! Asset lending tracker HTTP server.

use asset_lending_server::config::{Config, DEFAULT_LOG_FILTER, DEV_JWT_SECRET};
use asset_lending_server::{build_state, connect_store};
use asset_lending_web::build_router;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting asset lending server");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env file");
    }
    info!(
        database_max_connections = config.database.max_connections,
        run_migrations = config.database.run_migrations,
        "Configuration loaded"
    );
    if config.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("AUTH_JWT_SECRET is not set; using the development secret");
    }

    info!("Connecting to database...");
    let store = connect_store(&config.database).await?;
    info!("Database connected");

    let app = build_router(build_state(store, &config.auth));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown, bounded by the shutdown timeout
    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = stop_tx.send(true);
            })
            .await
    };
    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    let drain_deadline = async move {
        if stop_rx.wait_for(|stopping| *stopping).await.is_ok() {
            tokio::time::sleep(timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        () = drain_deadline => {
            warn!(timeout_secs = timeout.as_secs(), "Shutdown timeout elapsed, dropping open connections");
        },
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
