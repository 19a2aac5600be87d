//! # kanban-board
//!
//! Server entry point: loads settings, connects and migrates Postgres, wires
//! the adapters into the services and serves the router until Ctrl-C.

#[cfg(not(all(feature = "web-axum", feature = "db-postgres")))]
compile_error!("kanban-board needs the `web-axum` and `db-postgres` features");

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use api_adapters::i18n::StaticCatalog;
use api_adapters::AppState;
use auth_adapters::{AuthMode, TokenAuthProvider};
use configs::{LogSettings, Settings};
use services::KanbanServices;
use storage_adapters::{ImageResizer, PoolSettings, PostgresStore};

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn auth_mode(mode: configs::AuthMode) -> AuthMode {
    match mode {
        configs::AuthMode::Gateway => AuthMode::Gateway,
        configs::AuthMode::Local => AuthMode::Local,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    // 1. Storage
    let pool = PoolSettings {
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        acquire_timeout: Duration::from_secs(settings.database.acquire_timeout_secs),
    };
    let store = PostgresStore::connect(settings.database.url.expose_secret(), &pool)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;
    let store = Arc::new(store);

    // 2. Auth
    let secret = settings
        .auth
        .token_secret
        .as_ref()
        .map(|s| s.expose_secret().as_bytes().to_vec())
        .unwrap_or_default();
    let auth = Arc::new(TokenAuthProvider::new(auth_mode(settings.auth.mode), &secret, settings.auth.token_ttl_hours));
    if auth.mode() == AuthMode::Local {
        tracing::warn!("local auth mode: bearer tokens are trusted as user ids");
    }
    if !settings.auth.trust_user_header {
        tracing::info!("x-user-id is ignored, callers must send a bearer token");
    }

    // 3. Services and HTTP state
    let services = KanbanServices::new(store.clone(), Arc::new(ImageResizer::default()), auth.clone());
    let state = AppState::new(services, store, auth, Arc::new(StaticCatalog))
        .with_default_lang(settings.i18n.default_lang.clone())
        .with_user_header(settings.auth.trust_user_header)
        .with_environment(&settings.server.environment);

    let address = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(%address, environment = %settings.server.environment, "kanban api listening");

    axum::serve(listener, api_adapters::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;
    Ok(())
}
