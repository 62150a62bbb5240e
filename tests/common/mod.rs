// SPDX-License-Identifier: MIT

use std::sync::Arc;
use trainboard::config::Config;
use trainboard::db::{FileCache, RemoteStore};
use trainboard::models::{Origin, Session, SessionTemplate, Sport};
use trainboard::services::{CalendarConnector, SessionStore, SettingsStore, StravaConnector};
use trainboard::AppState;

/// Fresh cache file under the OS temp dir.
#[allow(dead_code)]
pub fn temp_cache() -> FileCache {
    FileCache::new(std::env::temp_dir().join(format!(
        "trainboard_it_{}.json",
        uuid::Uuid::new_v4().simple()
    )))
}

/// Session store with a fresh cache and an offline (mock) remote.
///
/// Remote propagation is best-effort, so every local-first behavior is
/// testable against the erroring mock.
#[allow(dead_code)]
pub fn test_store() -> SessionStore {
    SessionStore::new(temp_cache(), RemoteStore::new_mock())
}

#[allow(dead_code)]
pub fn template(title: &str, sport: Sport) -> SessionTemplate {
    SessionTemplate {
        date: None,
        sport,
        session_type: "endurance".to_string(),
        title: title.to_string(),
        description: "as planned".to_string(),
        duration_min: 60,
        steps: vec![],
        distance_km: None,
        elevation_m: None,
    }
}

/// Planned session on `date`.
#[allow(dead_code)]
pub fn planned(title: &str, sport: Sport, date: &str) -> Session {
    template(title, sport).into_session(date.parse().unwrap())
}

/// Imported (actual) session on `date`.
#[allow(dead_code)]
pub fn actual(title: &str, sport: Sport, date: &str) -> Session {
    let mut session = planned(title, sport, date);
    session.origin = Origin::Actual;
    session.external_id = Some(42);
    session.distance_km = Some(30.0);
    session
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let cache = FileCache::new(config.cache_path.clone());
    let remote = RemoteStore::new_mock();

    let store = SessionStore::new(cache.clone(), remote.clone());
    let settings = SettingsStore::new(cache.clone(), remote);

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

    let state = Arc::new(AppState {
        config,
        store,
        settings,
        strava,
        calendar,
    });

    (trainboard::routes::create_router(state.clone()), state)
}
