// SPDX-License-Identifier: MIT

//! Periodization context: training phases, objectives and user settings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named macro-cycle period ("Base", "Build", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPhase {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: String,
}

impl TrainingPhase {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// First phase whose range contains `date`. Overlapping phases are not
/// deduplicated; the first match wins.
pub fn current_phase(phases: &[TrainingPhase], date: NaiveDate) -> Option<&TrainingPhase> {
    phases.iter().find(|p| p.contains(date))
}

/// Race surface of a training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Trail,
    Road,
}

/// Priority rank of a target event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    A,
    B,
    C,
}

/// A target event used to enrich coach-facing prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingObjective {
    pub name: String,
    pub kind: ObjectiveKind,
    pub priority: Priority,
    pub date: NaiveDate,
    pub distance_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_loss_m: Option<f64>,
}

/// Credentials for the wellness-analytics provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessCredentials {
    pub athlete_id: String,
    pub api_key: String,
}

/// Process-wide user configuration, persisted as a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wellness: Option<WellnessCredentials>,
    #[serde(default)]
    pub phases: Vec<TrainingPhase>,
    #[serde(default)]
    pub objectives: Vec<TrainingObjective>,
}

fn default_theme() -> String {
    "system".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            wellness: None,
            phases: Vec::new(),
            objectives: Vec::new(),
        }
    }
}
