//! Asset lending tracker server.
//!
//! Wires configuration, the `PostgreSQL` store, the lending service and the
//! HTTP router together. The binary in `main.rs` is a thin shell over this.

pub mod config;

use anyhow::Context;
use asset_lending_core::environment::SystemClock;
use asset_lending_core::service::LendingService;
use asset_lending_postgres::PostgresLendingStore;
use asset_lending_web::{AppState, JwtAuthenticator};
use config::{AuthConfig, DatabaseConfig};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Open the connection pool and, when configured, run migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_store(config: &DatabaseConfig) -> anyhow::Result<PostgresLendingStore> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.url)
        .await
        .context("failed to connect to the database")?;

    let store = PostgresLendingStore::new(pool);
    if config.run_migrations {
        store.migrate().await.context("failed to run migrations")?;
        tracing::info!("Migrations applied");
    }
    Ok(store)
}

/// Build the handler state over a store.
#[must_use]
pub fn build_state(store: PostgresLendingStore, auth: &AuthConfig) -> AppState {
    let service = LendingService::new(Arc::new(store), Arc::new(SystemClock));
    let authenticator =
        JwtAuthenticator::new(&auth.jwt_secret, Duration::from_secs(auth.token_ttl));
    AppState::new(service, Arc::new(authenticator))
}
