// SPDX-License-Identifier: MIT

//! Calendar export adapter: mirrors the displayed week's sessions into
//! an external Google-style calendar.
//!
//! Event identifiers are derived deterministically from session
//! identifiers, so a re-sync updates events in place instead of
//! duplicating them. Every managed event carries a marker string in its
//! description so `delete_all_managed` can find and remove them later.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::FileCache;
use crate::error::AppError;
use crate::models::Session;
use crate::services::tokens::{TokenExchange, TokenManager, TokenSet};
use crate::time_utils::in_week;

pub const PROVIDER: &str = "calendar";

/// Marker identifying events managed by this app.
pub const MANAGED_MARKER: &str = "[trainboard]";

/// Counts returned by a week sync.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CalendarSyncOutcome {
    pub created: u32,
    pub updated: u32,
}

/// All-day event payload (Google Calendar v3 shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    summary: String,
    #[serde(default)]
    description: String,
    start: EventDate,
    end: EventDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventDate {
    date: String,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// Google Calendar API client.
#[derive(Clone)]
pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    calendar_id: String,
}

impl CalendarClient {
    pub fn new(client_id: String, client_secret: String, calendar_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            client_id,
            client_secret,
            calendar_id,
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// Update an event in place. `Ok(false)` means the event does not
    /// exist yet (HTTP 404) and should be created instead.
    async fn update_event(
        &self,
        access_token: &str,
        event: &CalendarEvent,
    ) -> Result<bool, AppError> {
        let event_id = event.id.as_deref().unwrap_or_default();
        let url = format!("{}/{}", self.events_url(), event_id);

        let response = self
            .http
            .put(&url)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        check_status(response).await?;
        Ok(true)
    }

    /// Create an event carrying its pre-derived identifier.
    async fn insert_event(
        &self,
        access_token: &str,
        event: &CalendarEvent,
    ) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        check_status(response).await
    }

    /// List events whose text matches `query`.
    async fn search_events(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(access_token)
            .query(&[("q", query), ("maxResults", "2500")])
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        let list: EventList = check_json(response).await?;
        Ok(list.items)
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError> {
        let url = format!("{}/{}", self.events_url(), event_id);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, e.to_string()))?;

        check_status(response).await
    }
}

impl TokenExchange for CalendarClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AppError> {
        #[derive(Deserialize)]
        struct GoogleTokens {
            access_token: String,
            #[serde(default)]
            refresh_token: Option<String>,
            expires_in: i64,
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, format!("Token request failed: {}", e)))?;

        let tokens: GoogleTokens = check_json(response).await?;
        Ok(TokenSet {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or_default(),
            expires_at: chrono::Utc::now().timestamp() + tokens.expires_in,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AppError> {
        #[derive(Deserialize)]
        struct GoogleRefresh {
            access_token: String,
            expires_in: i64,
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::provider_api(PROVIDER, format!("Token refresh failed: {}", e)))?;

        let tokens: GoogleRefresh = check_json(response).await?;
        // Google does not rotate the refresh token on refresh.
        Ok(TokenSet {
            access_token: tokens.access_token,
            refresh_token: refresh_token.to_string(),
            expires_at: chrono::Utc::now().timestamp() + tokens.expires_in,
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 401 {
        return Err(AppError::provider_api(PROVIDER, AppError::TOKEN_ERROR));
    }
    Err(AppError::provider_api(
        PROVIDER,
        format!("HTTP {}: {}", status, body),
    ))
}

async fn check_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
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

/// Stable external event id for a session.
///
/// Google event ids are base32hex (`[a-v0-9]`); a hex-encoded UUID is a
/// valid subset, so the derivation is just a prefix plus the simple
/// form.
pub fn event_id_for(session_id: Uuid) -> String {
    format!("tb{}", session_id.simple())
}

/// Build the all-day event for a session.
fn event_for(session: &Session) -> CalendarEvent {
    let end = session.date + Duration::days(1);
    let mut description = format!(
        "{} {} — {} min",
        MANAGED_MARKER,
        session.sport.as_str(),
        session.duration_min
    );
    if !session.description.is_empty() {
        description.push_str("\n\n");
        description.push_str(&session.description);
    }

    CalendarEvent {
        id: Some(event_id_for(session.id)),
        summary: session.title.clone(),
        description,
        start: EventDate {
            date: session.date.to_string(),
        },
        end: EventDate {
            date: end.to_string(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CalendarConnector - High-level adapter with token management
// ─────────────────────────────────────────────────────────────────────────────

/// High-level export adapter owning the calendar token lifecycle.
pub struct CalendarConnector {
    client: CalendarClient,
    pub tokens: TokenManager<CalendarClient>,
}

impl CalendarConnector {
    pub fn new(
        client_id: String,
        client_secret: String,
        calendar_id: String,
        cache: FileCache,
    ) -> Self {
        let client = CalendarClient::new(client_id, client_secret, calendar_id);
        let tokens = TokenManager::new(PROVIDER, cache, client.clone());
        Self { client, tokens }
    }

    /// Mirror the displayed week's sessions to the external calendar.
    ///
    /// Update-in-place first, create on 404. Per-event failures are
    /// logged and skipped so one bad event cannot abort the week.
    pub async fn sync_week(
        &self,
        sessions: &[Session],
        week_start: NaiveDate,
    ) -> Result<CalendarSyncOutcome, AppError> {
        let access_token = self.tokens.get_valid_token().await?;
        let mut outcome = CalendarSyncOutcome::default();

        for session in sessions.iter().filter(|s| in_week(s.date, week_start)) {
            let event = event_for(session);
            let result = match self.client.update_event(&access_token, &event).await {
                Ok(true) => {
                    outcome.updated += 1;
                    Ok(())
                }
                Ok(false) => self
                    .client
                    .insert_event(&access_token, &event)
                    .await
                    .map(|()| outcome.created += 1),
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                if e.is_token_error() {
                    return Err(e);
                }
                tracing::warn!(
                    session_id = %session.id,
                    error = %e,
                    "Calendar event sync failed, skipping"
                );
            }
        }

        tracing::info!(
            created = outcome.created,
            updated = outcome.updated,
            week = %week_start,
            "Calendar week synced"
        );
        Ok(outcome)
    }

    /// Delete every event carrying the managed marker. Individual delete
    /// failures are skipped; returns the number actually removed.
    pub async fn delete_all_managed(&self) -> Result<u32, AppError> {
        let access_token = self.tokens.get_valid_token().await?;

        let managed: Vec<CalendarEvent> = self
            .client
            .search_events(&access_token, MANAGED_MARKER)
            .await?
            .into_iter()
            .filter(|e| e.description.contains(MANAGED_MARKER))
            .collect();

        let mut deleted = 0u32;
        for event in managed {
            let Some(id) = event.id.as_deref() else {
                continue;
            };
            match self.client.delete_event(&access_token, id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(event_id = id, error = %e, "Event delete failed, skipping");
                }
            }
        }

        tracing::info!(deleted, "Managed calendar events removed");
        Ok(deleted)
    }
}
