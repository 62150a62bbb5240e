// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; there is no hot reload. Provider
//! client secrets come from the environment (or a `.env` file in dev).

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Server port
    pub port: u16,
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,

    // --- Activity import (Strava) ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,

    // --- Calendar export (Google Calendar) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Target calendar for planned-session export
    pub calendar_id: String,

    // --- Remote persistence ---
    /// Base URL of the persistence service (PostgREST-style)
    pub persist_url: String,
    /// API key for the persistence service
    pub persist_api_key: String,

    // --- Local cache ---
    /// Path of the local JSON cache snapshot
    pub cache_path: PathBuf,

    // --- OAuth state signing ---
    /// HMAC key protecting the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,

            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            calendar_id: env::var("CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),

            persist_url: env::var("PERSIST_URL").map_err(|_| ConfigError::Missing("PERSIST_URL"))?,
            persist_api_key: env::var("PERSIST_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PERSIST_API_KEY"))?,

            cache_path: env::var("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/trainboard_cache.json")),

            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            google_client_id: "test_google_id".to_string(),
            google_client_secret: "test_google_secret".to_string(),
            calendar_id: "primary".to_string(),
            persist_url: "http://localhost:54321".to_string(),
            persist_api_key: "test_api_key".to_string(),
            cache_path: std::env::temp_dir().join(format!(
                "trainboard_test_cache_{}.json",
                uuid::Uuid::new_v4().simple()
            )),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
