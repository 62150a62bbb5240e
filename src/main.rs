// SPDX-License-Identifier: MIT

//! Trainboard API Server
//!
//! Personal training-planning dashboard: weekly session scheduling,
//! activity-import reconciliation, calendar export and coach prompts.

use std::sync::Arc;
use trainboard::{
    config::Config,
    db::{FileCache, RemoteStore},
    services::{CalendarConnector, SessionStore, SettingsStore, StravaConnector},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Trainboard API");

    // Local cache and remote persistence
    let cache = FileCache::new(config.cache_path.clone());
    let remote = RemoteStore::new(&config.persist_url, &config.persist_api_key);

    // Hydrate stores: cache first for instant availability, then remote
    let store = SessionStore::new(cache.clone(), remote.clone());
    store.initialize().await;
    let settings = SettingsStore::new(cache.clone(), remote);
    settings.initialize().await;

    // Provider connectors (each hydrates its tokens from the cache)
    let strava = StravaConnector::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
        cache.clone(),
    );
    let calendar = CalendarConnector::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.calendar_id.clone(),
        cache,
    );
    tracing::info!(
        strava_connected = strava.tokens.is_connected().await,
        calendar_connected = calendar.tokens.is_connected().await,
        "Provider connectors initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        settings,
        strava,
        calendar,
    });

    // Build router
    let app = trainboard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trainboard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
