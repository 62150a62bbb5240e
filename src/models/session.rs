// SPDX-License-Identifier: MIT

//! The scheduled-session model.
//!
//! A [`Session`] is either planned (user- or AI-authored, fully editable)
//! or actual (imported from the activity provider, largely immutable).
//! The discriminator is the explicit [`Origin`] tag set at creation time,
//! never inferred from which optional fields happen to be present.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of sport categories the planner schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Cycling,
    Running,
    Strength,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cycling => "cycling",
            Sport::Running => "running",
            Sport::Strength => "strength",
        }
    }
}

/// Provenance of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Authored locally (manual entry, template import, AI plan). Editable
    /// and deletable.
    Planned,
    /// Imported from a completed real-world activity. Only title,
    /// description and coach feedback may change after creation.
    Actual,
}

/// Reference threshold an intensity band is expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Ftp,
    MaxHr,
}

/// Target-intensity band as a percentage range of a reference threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRange {
    pub low_pct: u16,
    pub high_pct: u16,
    pub reference: Threshold,
}

/// One phase of a structured plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Phase duration in minutes.
    pub minutes: u32,
    /// Repeat count; absent means the phase runs once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,
    /// Target intensity; absent means free effort.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<IntensityRange>,
}

/// Lap/interval record carried by imported sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub name: String,
    pub elapsed_s: u32,
    pub moving_s: u32,
    pub distance_m: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

/// A scheduled workout session, planned or completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable identifier, generated locally on every creation path.
    pub id: Uuid,
    /// Calendar day (no time-of-day).
    pub date: NaiveDate,
    pub sport: Sport,
    /// Free-form session-type tag ("endurance", "intervals", ...).
    #[serde(default)]
    pub session_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Planned duration for planned sessions, recorded duration for
    /// imported ones. Minutes.
    pub duration_min: u32,
    /// Structured plan; empty for unstructured sessions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<PlannedStep>,
    pub origin: Origin,

    /// Source activity identifier for imported sessions. Unique natural key
    /// at the persistence layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<u64>,

    // Outcome / target figures. Targets on planned sessions, recorded
    // values on actual ones; the source activity may lack any of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub laps: Vec<Lap>,

    /// User-entered or AI-pasted coaching feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_feedback: Option<String>,
    /// Title of the planned session this actual session displaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_title: Option<String>,
    /// Description of the planned session this actual session displaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_description: Option<String>,
}

impl Session {
    pub fn is_planned(&self) -> bool {
        self.origin == Origin::Planned
    }

    pub fn is_actual(&self) -> bool {
        self.origin == Origin::Actual
    }

    /// Duplicate-detection key for reconciliation.
    pub fn dedup_key(&self) -> (&str, NaiveDate) {
        (self.title.as_str(), self.date)
    }

    pub fn hours(&self) -> f64 {
        f64::from(self.duration_min) / 60.0
    }
}

/// Template for creating a planned session (manual entry or bulk import).
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct SessionTemplate {
    /// Target day; bulk-import items carry it, manual creation passes it
    /// separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub sport: Sport,
    #[serde(default)]
    pub session_type: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, max = 1440, message = "duration must be 1..=1440 minutes"))]
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<PlannedStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

impl SessionTemplate {
    /// Materialize a planned session on `date` with a fresh identifier.
    pub fn into_session(self, date: NaiveDate) -> Session {
        Session {
            id: Uuid::new_v4(),
            date,
            sport: self.sport,
            session_type: self.session_type,
            title: self.title,
            description: self.description,
            duration_min: self.duration_min,
            steps: self.steps,
            origin: Origin::Planned,
            external_id: None,
            distance_km: self.distance_km,
            elevation_m: self.elevation_m,
            avg_hr: None,
            max_hr: None,
            avg_power: None,
            max_power: None,
            avg_cadence: None,
            laps: Vec::new(),
            coach_feedback: None,
            replaced_title: None,
            replaced_description: None,
        }
    }
}
