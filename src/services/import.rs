// SPDX-License-Identifier: MIT

//! Bulk import document parsing.
//!
//! Accepts the JSON a user pastes back from the coaching AI (or restores
//! from an export): a flat array of session templates / full sessions,
//! or a `{ phase, sessions }` plan object. Replies from chat models are
//! messy, so the parser runs an ordered list of shape matchers over a
//! normalized payload instead of regex repair:
//!
//! 1. strip a wrapping markdown code fence
//! 2. recover the first complete JSON value from concatenated output
//! 3. match plan object / flat array / array-of-arrays concatenation
//!
//! Each matcher returns a typed result or no-match and the next one
//! runs; anything left over is a parse error at the input boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::models::{Session, SessionTemplate, TrainingPhase};
use crate::time_utils::week_start;

/// One item of a bulk import batch: either a full session record
/// (restore path, trusted as-is) or a template to materialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportItem {
    Full(Session),
    Template(SessionTemplate),
}

impl ImportItem {
    /// The day this item schedules itself on, if it carries one.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ImportItem::Full(session) => Some(session.date),
            ImportItem::Template(template) => template.date,
        }
    }

    /// Turn the item into a session on `date`. Full records keep their
    /// identifier and origin; templates become fresh planned sessions.
    pub fn into_session(self, date: NaiveDate) -> Session {
        match self {
            ImportItem::Full(mut session) => {
                session.date = date;
                session
            }
            ImportItem::Template(template) => template.into_session(date),
        }
    }
}

/// Periodization metadata carried by a plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    pub name: String,
    /// 1-based index of the imported week within the phase.
    pub week: u32,
    pub total_weeks: u32,
    #[serde(default)]
    pub description: String,
}

impl PhasePlan {
    /// Materialize a training phase spanning `total_weeks`, positioned so
    /// that the earliest imported session falls in week `week`.
    pub fn materialize(&self, session_dates: &[NaiveDate]) -> Option<TrainingPhase> {
        let first = session_dates.iter().min()?;
        let offset_weeks = i64::from(self.week.max(1)) - 1;
        let start = week_start(*first) - chrono::Duration::weeks(offset_weeks);
        let end = start + chrono::Duration::weeks(i64::from(self.total_weeks.max(1))) - chrono::Duration::days(1);
        Some(TrainingPhase {
            name: self.name.clone(),
            start,
            end,
            description: self.description.clone(),
            goal: String::new(),
        })
    }
}

/// Parsed bulk import document.
#[derive(Debug, Clone)]
pub enum ImportDocument {
    Sessions(Vec<ImportItem>),
    Plan {
        phase: PhasePlan,
        sessions: Vec<ImportItem>,
    },
}

impl ImportDocument {
    pub fn items(self) -> Vec<ImportItem> {
        match self {
            ImportDocument::Sessions(items) => items,
            ImportDocument::Plan { sessions, .. } => sessions,
        }
    }
}

/// Import document parse failures, surfaced inline at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON value found in input")]
    Empty,
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("item {index} is not a session or template: {message}")]
    BadItem { index: usize, message: String },
    #[error("unrecognized document shape")]
    UnrecognizedShape,
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// Parse a pasted bulk import document.
pub fn parse_import_document(input: &str) -> Result<ImportDocument, ParseError> {
    let stripped = strip_markdown_fence(input);
    let value = first_json_value(stripped)?;

    if let Some(doc) = match_plan_document(&value)? {
        return Ok(doc);
    }
    if let Some(doc) = match_session_array(&value)? {
        return Ok(doc);
    }
    Err(ParseError::UnrecognizedShape)
}

/// Strip a wrapping ```/```json markdown fence, if present.
fn strip_markdown_fence(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Recover the first complete top-level JSON value.
///
/// Chat models sometimes emit the same object or array twice
/// back-to-back; a streaming deserializer stops cleanly after the first.
fn first_json_value(input: &str) -> Result<Value, ParseError> {
    let mut stream = serde_json::Deserializer::from_str(input).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ParseError::Json(e)),
        None => Err(ParseError::Empty),
    }
}

/// Matcher: `{ "phase": {...}, "sessions": [...] }` plan object. The
/// phase key is optional; a bare `{ "sessions": [...] }` matches too.
fn match_plan_document(value: &Value) -> Result<Option<ImportDocument>, ParseError> {
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let Some(sessions_value) = map.get("sessions") else {
        return Ok(None);
    };

    let items = parse_items(sessions_value)?;
    match map.get("phase") {
        Some(phase_value) => {
            let phase: PhasePlan = serde_json::from_value(phase_value.clone())?;
            Ok(Some(ImportDocument::Plan {
                phase,
                sessions: items,
            }))
        }
        None => Ok(Some(ImportDocument::Sessions(items))),
    }
}

/// Matcher: flat array of items, tolerating the array-of-arrays
/// concatenation artifact (`[[...], [...]]` flattens one level).
fn match_session_array(value: &Value) -> Result<Option<ImportDocument>, ParseError> {
    let Value::Array(entries) = value else {
        return Ok(None);
    };

    let flattened: Vec<Value> = if entries.iter().all(|e| e.is_array()) && !entries.is_empty() {
        entries
            .iter()
            .flat_map(|e| e.as_array().cloned().unwrap_or_default())
            .collect()
    } else {
        entries.clone()
    };

    let items = parse_items(&Value::Array(flattened))?;
    Ok(Some(ImportDocument::Sessions(items)))
}

fn parse_items(value: &Value) -> Result<Vec<ImportItem>, ParseError> {
    let Value::Array(entries) = value else {
        return Err(ParseError::UnrecognizedShape);
    };
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry.clone()).map_err(|e| ParseError::BadItem {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
