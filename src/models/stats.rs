// SPDX-License-Identifier: MIT

//! Weekly volume statistics derived from the session store.
//!
//! These are recomputed on demand from the store's current contents;
//! nothing here is persisted.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Session, Sport};
use crate::time_utils::in_week;
use chrono::NaiveDate;

/// Planned vs accomplished totals for one sport within a week.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SportTotals {
    pub planned_hours: f64,
    pub accomplished_hours: f64,
    pub planned_km: f64,
    pub accomplished_km: f64,
    pub planned_elevation_m: f64,
    pub accomplished_elevation_m: f64,
}

/// Per-sport and grand-total volume for one displayed week.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyStats {
    /// Monday of the displayed week.
    pub week_start: NaiveDate,
    pub by_sport: BTreeMap<Sport, SportTotals>,
    pub total_sessions: u32,
    pub total_hours: f64,
}

impl WeeklyStats {
    /// Aggregate all sessions falling in the week starting at `week_start`.
    pub fn compute(sessions: &[Session], week_start: NaiveDate) -> Self {
        let mut by_sport: BTreeMap<Sport, SportTotals> = BTreeMap::new();
        let mut total_sessions = 0u32;
        let mut total_hours = 0f64;

        for session in sessions.iter().filter(|s| in_week(s.date, week_start)) {
            let totals = by_sport.entry(session.sport).or_default();
            let hours = session.hours();
            let km = session.distance_km.unwrap_or(0.0);
            let elevation = session.elevation_m.unwrap_or(0.0);

            if session.is_actual() {
                totals.accomplished_hours += hours;
                totals.accomplished_km += km;
                totals.accomplished_elevation_m += elevation;
            } else {
                totals.planned_hours += hours;
                totals.planned_km += km;
                totals.planned_elevation_m += elevation;
            }

            total_sessions += 1;
            total_hours += hours;
        }

        Self {
            week_start,
            by_sport,
            total_sessions,
            total_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, Session};
    use uuid::Uuid;

    fn make_session(
        sport: Sport,
        origin: Origin,
        date: &str,
        duration_min: u32,
        distance_km: Option<f64>,
    ) -> Session {
        Session {
            id: Uuid::new_v4(),
            date: date.parse().unwrap(),
            sport,
            session_type: String::new(),
            title: "Test".to_string(),
            description: String::new(),
            duration_min,
            steps: vec![],
            origin,
            external_id: None,
            distance_km,
            elevation_m: None,
            avg_hr: None,
            max_hr: None,
            avg_power: None,
            max_power: None,
            avg_cadence: None,
            laps: vec![],
            coach_feedback: None,
            replaced_title: None,
            replaced_description: None,
        }
    }

    #[test]
    fn test_planned_and_accomplished_split() {
        let week = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let sessions = vec![
            make_session(Sport::Cycling, Origin::Actual, "2025-03-10", 120, Some(60.0)),
            make_session(Sport::Cycling, Origin::Planned, "2025-03-12", 60, None),
            make_session(Sport::Running, Origin::Actual, "2025-03-13", 60, Some(12.0)),
        ];

        let stats = WeeklyStats::compute(&sessions, week);

        let cycling = &stats.by_sport[&Sport::Cycling];
        assert_eq!(cycling.accomplished_hours, 2.0);
        assert_eq!(cycling.planned_hours, 1.0);
        assert_eq!(cycling.accomplished_km, 60.0);

        let running = &stats.by_sport[&Sport::Running];
        assert_eq!(running.accomplished_hours, 1.0);
        assert_eq!(running.planned_hours, 0.0);

        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_hours, 4.0);
    }

    #[test]
    fn test_sessions_outside_week_excluded() {
        let week = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let sessions = vec![
            make_session(Sport::Cycling, Origin::Planned, "2025-03-09", 60, None),
            make_session(Sport::Cycling, Origin::Planned, "2025-03-16", 60, None),
            make_session(Sport::Cycling, Origin::Planned, "2025-03-17", 60, None),
        ];

        let stats = WeeklyStats::compute(&sessions, week);

        // Only the Sunday (03-16) of the displayed week counts.
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.by_sport[&Sport::Cycling].planned_hours, 1.0);
    }

    #[test]
    fn test_empty_store_yields_empty_stats() {
        let week = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let stats = WeeklyStats::compute(&[], week);
        assert!(stats.by_sport.is_empty());
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_hours, 0.0);
    }

    #[test]
    fn test_elevation_accumulates_per_bucket() {
        let week = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut planned = make_session(Sport::Running, Origin::Planned, "2025-03-11", 45, None);
        planned.elevation_m = Some(400.0);
        let mut actual = make_session(Sport::Running, Origin::Actual, "2025-03-12", 50, None);
        actual.elevation_m = Some(520.0);

        let stats = WeeklyStats::compute(&[planned, actual], week);
        let running = &stats.by_sport[&Sport::Running];
        assert_eq!(running.planned_elevation_m, 400.0);
        assert_eq!(running.accomplished_elevation_m, 520.0);
    }
}
