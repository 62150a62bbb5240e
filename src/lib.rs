// SPDX-License-Identifier: MIT

//! Trainboard: personal training-planning dashboard backend
//!
//! This crate schedules workout sessions on a weekly calendar,
//! reconciles imported activity-tracker data with the plan, mirrors the
//! week to an external calendar, and generates coach-facing prompts.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{CalendarConnector, SessionStore, SettingsStore, StravaConnector};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: SessionStore,
    pub settings: SettingsStore,
    pub strava: StravaConnector,
    pub calendar: CalendarConnector,
}
