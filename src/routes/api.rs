// SPDX-License-Identifier: MIT

//! API routes for the dashboard.

use crate::error::{AppError, Result};
use crate::models::{current_phase, Session, SessionTemplate, Settings, WeeklyStats};
use crate::services::reconcile::{self, DuplicatePolicy, ImportSummary};
use crate::services::strava::StravaConnector;
use crate::services::wellness::{summarize, WellnessClient, WellnessSummary};
use crate::services::workout::workout_file;
use crate::services::{parse_import_document, prompts, BulkImportSummary, ImportDocument};
use crate::time_utils::week_start;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", get(get_sessions).post(create_session))
        .route("/api/sessions/batch", post(create_sessions_batch))
        .route("/api/sessions/import", post(import_sessions))
        .route("/api/sessions/export", get(export_sessions))
        .route("/api/sessions/reset", post(reset_sessions))
        .route("/api/sessions/{id}", put(update_session).delete(delete_session))
        .route("/api/sessions/{id}/date", put(update_session_date))
        .route("/api/sessions/{id}/feedback", put(update_session_feedback))
        .route("/api/sessions/{id}/workout-file", get(get_workout_file))
        .route("/api/sync/activities", post(sync_activities))
        .route("/api/sync/calendar", post(sync_calendar).delete(unsync_calendar))
        .route("/api/stats/week", get(get_weekly_stats))
        .route("/api/wellness", get(get_wellness))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/prompts/session/{id}", get(get_session_prompt))
        .route("/api/prompts/week", get(get_week_prompt))
}

// ─── Sessions ────────────────────────────────────────────────

#[derive(Deserialize)]
struct WeekQuery {
    /// Any date inside the requested week; defaults to today.
    week: Option<NaiveDate>,
}

impl WeekQuery {
    fn start(&self) -> NaiveDate {
        week_start(self.week.unwrap_or_else(|| chrono::Utc::now().date_naive()))
    }
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
    /// Set when the last remote resync failed and the list may be stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

/// Sessions of one displayed week.
async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeekQuery>,
) -> Result<Json<SessionsResponse>> {
    let sessions = state.store.for_week(params.start()).await;
    Ok(Json(SessionsResponse {
        sessions,
        sync_error: state.store.sync_error().await,
    }))
}

#[derive(Deserialize, Validate)]
struct CreateSessionRequest {
    date: NaiveDate,
    #[serde(flatten)]
    #[validate(nested)]
    template: SessionTemplate,
}

/// Manual session entry.
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<Session>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = state.store.create(payload.template, payload.date).await;
    tracing::info!(session_id = %session.id, date = %session.date, "Session created");
    Ok(Json(session))
}

#[derive(Deserialize, Validate)]
struct CreateBatchRequest {
    date: NaiveDate,
    #[validate(nested)]
    templates: Vec<SessionTemplate>,
}

/// Batched creation (template import). One remote call covers the batch.
async fn create_sessions_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<Json<Vec<Session>>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let created = state.store.create_many(payload.templates, payload.date).await;
    tracing::info!(count = created.len(), "Session batch created");
    Ok(Json(created))
}

#[derive(Deserialize)]
struct UpdateSessionRequest {
    title: String,
    #[serde(default)]
    description: String,
}

/// Relabel a session (title/description). This is the one edit allowed
/// on imported sessions.
async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<Session>> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    if !state
        .store
        .update_editable_fields(id, payload.title, payload.description)
        .await
    {
        return Err(AppError::NotFound(format!("Session {}", id)));
    }
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;
    Ok(Json(session))
}

#[derive(Deserialize)]
struct UpdateDateRequest {
    date: NaiveDate,
}

/// Drag-to-reschedule. Only planned sessions move; a completed activity
/// happened on the day it happened.
async fn update_session_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDateRequest>,
) -> Result<Json<Session>> {
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;

    if session.is_actual() {
        return Err(AppError::BadRequest(
            "completed sessions cannot be rescheduled".to_string(),
        ));
    }

    state.store.update_date(id, payload.date).await;
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;
    Ok(Json(session))
}

#[derive(Deserialize)]
struct UpdateFeedbackRequest {
    feedback: Option<String>,
}

async fn update_session_feedback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFeedbackRequest>,
) -> Result<Json<Session>> {
    if !state.store.update_feedback(id, payload.feedback).await {
        return Err(AppError::NotFound(format!("Session {}", id)));
    }
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;
    Ok(Json(session))
}

/// Delete a planned session.
///
/// Imported (actual) sessions are refused here: they represent completed
/// real-world events and only reconciliation may replace them. The store
/// primitive underneath does not enforce this; the policy lives at this
/// caller layer.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;

    if session.is_actual() {
        return Err(AppError::BadRequest(
            "completed sessions cannot be deleted".to_string(),
        ));
    }

    state.store.remove(id).await;
    tracing::info!(session_id = %id, "Session deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ─── Bulk Import / Export ────────────────────────────────────

#[derive(Deserialize)]
struct ImportRequest {
    /// Raw pasted document (JSON, possibly fenced or duplicated).
    text: String,
    #[serde(default)]
    replace_existing: bool,
}

#[derive(Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub summary: BulkImportSummary,
    /// Name of the training phase materialized from the document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Bulk JSON/template import (AI plan paste or export restore).
async fn import_sessions(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let document = parse_import_document(&payload.text)?;

    let mut phase_name = None;
    let items = match document {
        ImportDocument::Plan { phase, sessions } => {
            let dates: Vec<NaiveDate> = sessions.iter().filter_map(|i| i.date()).collect();
            if let Some(materialized) = phase.materialize(&dates) {
                phase_name = Some(materialized.name.clone());
                state.settings.upsert_phase(materialized).await;
            }
            sessions
        }
        ImportDocument::Sessions(items) => items,
    };

    let summary = state.store.import_bulk(items, payload.replace_existing).await;
    Ok(Json(ImportResponse {
        summary,
        phase: phase_name,
    }))
}

/// Export all planned sessions as a portable document.
async fn export_sessions(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Session>>> {
    Ok(Json(state.store.export_planned().await))
}

/// Full data wipe.
async fn reset_sessions(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    state.store.reset().await;
    Ok(Json(serde_json::json!({ "reset": true })))
}

// ─── Activity Sync ───────────────────────────────────────────

#[derive(Deserialize)]
struct SyncActivitiesRequest {
    #[serde(default = "default_sync_days")]
    days: u32,
    /// Duplicate handling; the regular sync path skips.
    #[serde(default = "default_policy")]
    on_duplicate: DuplicatePolicy,
}

fn default_sync_days() -> u32 {
    14
}

fn default_policy() -> DuplicatePolicy {
    DuplicatePolicy::Skip
}

/// Import recent completed activities and reconcile them into the
/// schedule.
async fn sync_activities(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SyncActivitiesRequest>,
) -> Result<Json<ImportSummary>> {
    let mut raw = state.strava.fetch_recent(payload.days).await?;
    // Unclassifiable activity types never reach reconciliation; dropping
    // them before the per-item detail calls also saves API quota.
    raw.retain(|a| crate::services::strava::map_sport(&a.sport_type).is_some());

    let detailed = state.strava.fetch_details(raw).await?;
    let candidates = StravaConnector::candidates(&detailed);

    let summary = reconcile::import_activities(&state.store, candidates, payload.on_duplicate).await;
    Ok(Json(summary))
}

// ─── Calendar Sync ───────────────────────────────────────────

/// Mirror the displayed week to the external calendar.
async fn sync_calendar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeekQuery>,
) -> Result<Json<crate::services::CalendarSyncOutcome>> {
    let start = params.start();
    let sessions = state.store.for_week(start).await;
    let outcome = state.calendar.sync_week(&sessions, start).await?;
    Ok(Json(outcome))
}

/// Remove every calendar event this app manages.
async fn unsync_calendar(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let deleted = state.calendar.delete_all_managed().await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

// ─── Stats / Wellness ────────────────────────────────────────

#[derive(Deserialize)]
struct StatsQuery {
    start: Option<NaiveDate>,
}

/// Weekly volume stats, recomputed from current store contents.
async fn get_weekly_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<WeeklyStats>> {
    let start = week_start(params.start.unwrap_or_else(|| chrono::Utc::now().date_naive()));
    let sessions = state.store.all().await;
    Ok(Json(WeeklyStats::compute(&sessions, start)))
}

#[derive(Deserialize)]
struct WellnessQuery {
    #[serde(default = "default_wellness_days")]
    days: u32,
}

fn default_wellness_days() -> u32 {
    42
}

/// Readiness summary from the wellness provider.
async fn get_wellness(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WellnessQuery>,
) -> Result<Json<WellnessSummary>> {
    let settings = state.settings.current().await;
    let credentials = settings
        .wellness
        .ok_or(AppError::NotConnected("wellness"))?;

    let client = WellnessClient::new(credentials);
    let range = client.fetch_range(params.days).await?;
    Ok(Json(summarize(&range)))
}

// ─── Settings ────────────────────────────────────────────────

async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>> {
    Ok(Json(state.settings.current().await))
}

async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>> {
    state.settings.update(settings.clone()).await;
    Ok(Json(settings))
}

// ─── Coach Prompts ───────────────────────────────────────────

#[derive(Serialize)]
pub struct PromptResponse {
    pub prompt: String,
}

/// Analysis prompt for one session.
async fn get_session_prompt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PromptResponse>> {
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;

    let settings = state.settings.current().await;
    let phase = current_phase(&settings.phases, session.date);
    let prompt = prompts::session_analysis_prompt(&session, phase, &settings.objectives);
    Ok(Json(PromptResponse { prompt }))
}

/// Weekly review prompt covering the displayed week.
async fn get_week_prompt(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<PromptResponse>> {
    let start = week_start(params.start.unwrap_or_else(|| chrono::Utc::now().date_naive()));
    let sessions = state.store.for_week(start).await;

    let settings = state.settings.current().await;
    let phase = current_phase(&settings.phases, start);
    let prompt = prompts::weekly_review_prompt(start, &sessions, phase, &settings.objectives);
    Ok(Json(PromptResponse { prompt }))
}

// ─── Workout Export ──────────────────────────────────────────

/// Structured-workout XML for a cycling session.
async fn get_workout_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;

    let xml = workout_file(&session).ok_or_else(|| {
        AppError::BadRequest("only structured cycling sessions export a workout file".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}
