// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod calendar;
pub mod import;
pub mod prompts;
pub mod reconcile;
pub mod settings;
pub mod store;
pub mod strava;
pub mod tokens;
pub mod wellness;
pub mod workout;

pub use calendar::{CalendarConnector, CalendarSyncOutcome};
pub use import::{parse_import_document, ImportDocument, ImportItem};
pub use reconcile::{DuplicatePolicy, ImportSummary};
pub use settings::SettingsStore;
pub use store::{BulkImportSummary, SessionStore};
pub use strava::StravaConnector;
pub use tokens::{TokenManager, TokenSet};
pub use wellness::{WellnessClient, WellnessSummary};
