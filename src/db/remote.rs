// SPDX-License-Identifier: MIT

//! Remote persistence client with typed operations.
//!
//! Speaks a PostgREST-style row interface:
//! - `sessions` — one row per session, keyed by id
//! - `settings` — a single row, id "default"
//!
//! The remote is the source of truth at startup only; while the app is
//! running every call here is a downstream mirror of in-memory state.

use crate::db::tables;
use crate::error::AppError;
use crate::models::{Session, Settings};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_CONCURRENT_DB_OPS: usize = 10;

/// Remote persistence client.
#[derive(Clone)]
pub struct RemoteStore {
    client: Option<reqwest::Client>,
    base_url: String,
    api_key: String,
}

/// Settings row wrapper; the table holds exactly one row.
#[derive(Debug, Serialize, Deserialize)]
struct SettingsRow {
    id: String,
    #[serde(flatten)]
    settings: Settings,
}

impl RemoteStore {
    /// Create a new client for the persistence service.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Some(reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All operations return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            base_url: String::new(),
            api_key: String::new(),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&reqwest::Client, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Persistence not connected (offline mode)".to_string()))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key).bearer_auth(&self.api_key)
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Fetch the full session list.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        let client = self.get_client()?;
        let req = client
            .get(self.table_url(tables::SESSIONS))
            .query(&[("select", "*")]);

        let response = self
            .with_auth(req)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_json(response).await
    }

    /// Create or update one session row.
    pub async fn upsert_session(&self, session: &Session) -> Result<(), AppError> {
        self.upsert_sessions(std::slice::from_ref(session)).await
    }

    /// Create or update a batch of session rows in one call.
    pub async fn upsert_sessions(&self, sessions: &[Session]) -> Result<(), AppError> {
        if sessions.is_empty() {
            return Ok(());
        }
        let client = self.get_client()?;
        let req = client
            .post(self.table_url(tables::SESSIONS))
            .header("Prefer", "resolution=merge-duplicates")
            .json(sessions);

        let response = self
            .with_auth(req)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_status(response).await
    }

    /// Delete one session row.
    pub async fn delete_session(&self, id: Uuid) -> Result<(), AppError> {
        let client = self.get_client()?;
        let req = client
            .delete(self.table_url(tables::SESSIONS))
            .query(&[("id", format!("eq.{id}"))]);

        let response = self
            .with_auth(req)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_status(response).await
    }

    /// Delete many session rows with bounded concurrency.
    ///
    /// Per-row failures are logged and skipped; the returned count is the
    /// number of rows actually deleted.
    pub async fn delete_sessions(&self, ids: &[Uuid]) -> Result<usize, AppError> {
        self.get_client()?;

        let deleted = stream::iter(ids.to_vec())
            .map(|id| async move {
                match self.delete_session(id).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(session_id = %id, error = %e, "Remote delete failed, skipping");
                        false
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<bool>>()
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();

        Ok(deleted)
    }

    // ─── Settings Operations ─────────────────────────────────────

    /// Fetch the settings record, if one has been stored.
    pub async fn get_settings(&self) -> Result<Option<Settings>, AppError> {
        let client = self.get_client()?;
        let req = client
            .get(self.table_url(tables::SETTINGS))
            .query(&[("id", "eq.default"), ("select", "*")]);

        let response = self
            .with_auth(req)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rows: Vec<SettingsRow> = check_json(response).await?;
        Ok(rows.into_iter().next().map(|row| row.settings))
    }

    /// Store the settings record (single row, id "default").
    pub async fn set_settings(&self, settings: &Settings) -> Result<(), AppError> {
        let client = self.get_client()?;
        let row = SettingsRow {
            id: "default".to_string(),
            settings: settings.clone(),
        };
        let req = client
            .post(self.table_url(tables::SETTINGS))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&std::slice::from_ref(&row));

        let response = self
            .with_auth(req)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_status(response).await
    }
}

/// Check response status and return error if not successful.
async fn check_status(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Database(format!("HTTP {}: {}", status, body)))
}

/// Check response and parse JSON body.
async fn check_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Database(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
}
