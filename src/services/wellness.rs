// SPDX-License-Identifier: MIT

//! Wellness analytics adapter (read-only).
//!
//! Fetches daily physiological load metrics from the analytics provider
//! and derives the dashboard's readiness summary locally: the
//! load-balance figure (chronic minus acute load) and a qualitative
//! form bucket.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::plan::WellnessCredentials;

pub const PROVIDER: &str = "wellness";

/// One day of physiological load metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyWellness {
    /// Calendar day the metrics belong to.
    #[serde(rename = "id")]
    pub date: NaiveDate,
    /// Chronic training load (fitness).
    #[serde(default)]
    pub ctl: Option<f64>,
    /// Acute training load (fatigue).
    #[serde(default)]
    pub atl: Option<f64>,
    /// Heart-rate variability.
    #[serde(default)]
    pub hrv: Option<f64>,
    #[serde(default, rename = "restingHR")]
    pub resting_hr: Option<f64>,
}

/// Qualitative form bucket derived from the load balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Fresh,
    Neutral,
    Optimal,
    HighStrain,
    Unknown,
}

impl FormStatus {
    /// Bucket a load-balance figure (chronic minus acute).
    pub fn from_balance(balance: Option<f64>) -> Self {
        match balance {
            None => FormStatus::Unknown,
            Some(b) if b > 5.0 => FormStatus::Fresh,
            Some(b) if b >= -10.0 => FormStatus::Neutral,
            Some(b) if b >= -30.0 => FormStatus::Optimal,
            Some(_) => FormStatus::HighStrain,
        }
    }
}

/// Readiness summary for the dashboard header.
#[derive(Debug, Clone, Serialize)]
pub struct WellnessSummary {
    pub today: Option<DailyWellness>,
    /// Chronic minus acute load for the most recent day.
    pub load_balance: Option<f64>,
    pub form: FormStatus,
}

/// Derive the readiness summary from a fetched range.
pub fn summarize(range: &[DailyWellness]) -> WellnessSummary {
    let today = range.iter().max_by_key(|d| d.date).cloned();
    let load_balance = today
        .as_ref()
        .and_then(|d| Some(d.ctl? - d.atl?));

    WellnessSummary {
        form: FormStatus::from_balance(load_balance),
        today,
        load_balance,
    }
}

/// Wellness analytics API client.
#[derive(Clone)]
pub struct WellnessClient {
    http: reqwest::Client,
    base_url: String,
    credentials: WellnessCredentials,
}

impl WellnessClient {
    pub fn new(credentials: WellnessCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://intervals.icu".to_string(),
            credentials,
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch daily metrics for a trailing window of `days`.
    pub async fn fetch_range(&self, days: u32) -> Result<Vec<DailyWellness>, AppError> {
        let newest = Utc::now().date_naive();
        let oldest = newest - Duration::days(i64::from(days));
        let url = format!(
            "{}/api/v1/athlete/{}/wellness",
            self.base_url, self.credentials.athlete_id
        );

        let response = self
            .http
            .get(&url)
            .basic_auth("API_KEY", Some(&self.credentials.api_key))
            .query(&[("oldest", oldest.to_string()), ("newest", newest.to_string())])
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::provider_api(PROVIDER, AppError::TOKEN_ERROR));
            }
            let body = response.text().await.unwrap_or_default();
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
}
