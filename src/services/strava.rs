// SPDX-License-Identifier: MIT

//! Strava import adapter: fetches completed activities and shapes them
//! into candidate sessions for reconciliation.
//!
//! Handles:
//! - Recent-activity listing within a trailing window
//! - Per-activity detail (lap) enrichment with per-item fallback
//! - Sport classification against the closed category lists
//! - Token refresh when expired (via [`TokenManager`])

use crate::db::FileCache;
use crate::error::AppError;
use crate::models::{Lap, Origin, Session, Sport};
use crate::services::tokens::{TokenExchange, TokenManager, TokenSet};
use crate::time_utils::local_day;
use serde::Deserialize;
use uuid::Uuid;

pub const PROVIDER: &str = "strava";

/// Activity types imported as cycling sessions.
const CYCLING_TYPES: &[&str] = &[
    "Ride",
    "VirtualRide",
    "GravelRide",
    "MountainBikeRide",
    "EBikeRide",
];
/// Activity types imported as running sessions.
const RUNNING_TYPES: &[&str] = &["Run", "TrailRun", "VirtualRun"];
/// Activity types imported as strength sessions.
const STRENGTH_TYPES: &[&str] = &["WeightTraining", "Workout", "Crossfit"];

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.strava.com/api/v3".to_string(),
            client_id,
            client_secret,
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// List activities after a Unix timestamp (paginated).
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RawActivity>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        check_response_json(response).await
    }

    /// Get a detailed activity by ID (includes laps).
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<RawActivity, AppError> {
        let url = format!("{}/activities/{}", self.base_url, activity_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        check_response_json(response).await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, AppError> {
        let response = self
            .http
            .post("https://www.strava.com/oauth/token")
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, format!("Token request failed: {}", e)))?;

        check_response_json(response).await
    }
}

impl TokenExchange for StravaClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Strava rate limit hit (429)");
            return Err(AppError::provider_api(PROVIDER, AppError::RATE_LIMIT));
        }

        if status.as_u16() == 401 {
            return Err(AppError::provider_api(PROVIDER, AppError::TOKEN_ERROR));
        }

        return Err(AppError::provider_api(
            PROVIDER,
            format!("HTTP {}: {}", status, body),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::provider_api(PROVIDER, format!("JSON parse error: {}", e)))
}

/// Raw Strava activity. The list endpoint omits `laps`; the detail
/// endpoint fills it in.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActivity {
    pub id: u64,
    pub name: String,
    pub sport_type: String,
    /// Start timestamp in the athlete's timezone.
    pub start_date_local: String,
    /// Meters.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub moving_time: u32,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub max_watts: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub laps: Vec<RawLap>,
}

/// Raw lap record from the activity detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLap {
    #[serde(default)]
    pub name: String,
    pub elapsed_time: u32,
    pub moving_time: u32,
    pub distance: f64,
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
}

/// Classify a provider activity type into a sport category.
///
/// Unrecognized types return `None` and are silently excluded from
/// import.
pub fn map_sport(sport_type: &str) -> Option<Sport> {
    if CYCLING_TYPES.contains(&sport_type) {
        Some(Sport::Cycling)
    } else if RUNNING_TYPES.contains(&sport_type) {
        Some(Sport::Running)
    } else if STRENGTH_TYPES.contains(&sport_type) {
        Some(Sport::Strength)
    } else {
        None
    }
}

/// Build a candidate actual session from a raw activity.
///
/// Returns `None` when the sport cannot be classified or the local start
/// timestamp has no parsable day.
pub fn to_candidate(activity: &RawActivity) -> Option<Session> {
    let sport = map_sport(&activity.sport_type)?;
    let date = match local_day(&activity.start_date_local) {
        Some(date) => date,
        None => {
            tracing::warn!(
                activity_id = activity.id,
                start = %activity.start_date_local,
                "Skipping activity with unparsable start date"
            );
            return None;
        }
    };

    let laps = activity
        .laps
        .iter()
        .map(|lap| Lap {
            name: lap.name.clone(),
            elapsed_s: lap.elapsed_time,
            moving_s: lap.moving_time,
            distance_m: lap.distance,
            avg_speed: lap.average_speed,
            max_speed: lap.max_speed,
            avg_hr: lap.average_heartrate,
            avg_power: lap.average_watts,
            avg_cadence: lap.average_cadence,
            elevation_m: lap.total_elevation_gain,
        })
        .collect();

    Some(Session {
        id: Uuid::new_v4(),
        date,
        sport,
        session_type: activity.sport_type.clone(),
        title: activity.name.clone(),
        description: activity.description.clone().unwrap_or_default(),
        duration_min: activity.moving_time.div_ceil(60),
        steps: Vec::new(),
        origin: Origin::Actual,
        external_id: Some(activity.id),
        distance_km: (activity.distance > 0.0).then(|| activity.distance / 1000.0),
        elevation_m: activity.total_elevation_gain,
        avg_hr: activity.average_heartrate,
        max_hr: activity.max_heartrate,
        avg_power: activity.average_watts,
        max_power: activity.max_watts,
        avg_cadence: activity.average_cadence,
        laps,
        coach_feedback: None,
        replaced_title: None,
        replaced_description: None,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaConnector - High-level adapter with token management
// ─────────────────────────────────────────────────────────────────────────────

/// High-level import adapter owning the Strava token lifecycle.
pub struct StravaConnector {
    client: StravaClient,
    pub tokens: TokenManager<StravaClient>,
}

impl StravaConnector {
    pub fn new(client_id: String, client_secret: String, cache: FileCache) -> Self {
        let client = StravaClient::new(client_id, client_secret);
        let tokens = TokenManager::new(PROVIDER, cache, client.clone());
        Self { client, tokens }
    }

    /// Fetch raw activities within a trailing window of `days`.
    pub async fn fetch_recent(&self, days: u32) -> Result<Vec<RawActivity>, AppError> {
        let access_token = self.tokens.get_valid_token().await?;
        let after = (chrono::Utc::now() - chrono::Duration::days(i64::from(days))).timestamp();

        let activities = self
            .client
            .list_activities(&access_token, after, 1, 100)
            .await?;

        tracing::info!(days, count = activities.len(), "Fetched recent activities");
        Ok(activities)
    }

    /// Enrich activities with lap-level detail, one call per item.
    ///
    /// Detail fetches fail per item: on failure the coarse record is kept
    /// and the batch continues.
    pub async fn fetch_details(
        &self,
        activities: Vec<RawActivity>,
    ) -> Result<Vec<RawActivity>, AppError> {
        let access_token = self.tokens.get_valid_token().await?;

        let mut detailed = Vec::with_capacity(activities.len());
        for activity in activities {
            match self.client.get_activity(&access_token, activity.id).await {
                Ok(full) => detailed.push(full),
                Err(e) => {
                    tracing::warn!(
                        activity_id = activity.id,
                        error = %e,
                        "Detail fetch failed, keeping coarse record"
                    );
                    detailed.push(activity);
                }
            }
        }
        Ok(detailed)
    }

    /// Shape raw activities into candidate sessions, dropping the ones
    /// that map to no sport category.
    pub fn candidates(activities: &[RawActivity]) -> Vec<Session> {
        activities.iter().filter_map(to_candidate).collect()
    }
}
