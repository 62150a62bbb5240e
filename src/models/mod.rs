// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod plan;
pub mod session;
pub mod stats;

pub use plan::{current_phase, ObjectiveKind, Priority, Settings, TrainingObjective, TrainingPhase};
pub use session::{
    IntensityRange, Lap, Origin, PlannedStep, Session, SessionTemplate, Sport, Threshold,
};
pub use stats::{SportTotals, WeeklyStats};
