// SPDX-License-Identifier: MIT

//! Reconciliation of imported activities into the session store.
//!
//! Each candidate actual session is classified against the current store
//! contents and gets exactly one outcome: skipped/updated as a duplicate
//! of an already-imported session, inserted in place of a same-day
//! same-sport planned session (displacement), or inserted as new.
//! Processing is sequential in input order; the spotlight is the most
//! recent insertion of the batch.

use uuid::Uuid;

use crate::models::Session;
use crate::services::store::SessionStore;

/// What to do when an incoming activity matches an already-imported
/// actual session by (title, date).
///
/// The regular activity-sync path uses `Skip`; `Update` is the
/// forced-refresh path that rewrites provider-sourced fields in place
/// while keeping the original identifier and local annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    Skip,
    Update,
}

/// Counters reported to the user after an import batch.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ImportSummary {
    pub inserted: u32,
    pub displaced: u32,
    pub duplicates: u32,
    /// Most recently inserted session of the batch, for the UI
    /// spotlight.
    pub spotlight: Option<Uuid>,
}

/// Outcome decided for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Same (title, date) as an existing actual session.
    Duplicate { existing: Uuid },
    /// Displaces the first planned session on the same day and sport.
    Displaces { planned: Uuid },
    New,
}

/// Classify one candidate against the current session list.
///
/// When several planned sessions share the candidate's day and sport,
/// only the first in list order is displaced (documented limitation).
pub fn classify(existing: &[Session], candidate: &Session) -> Outcome {
    if let Some(dup) = existing
        .iter()
        .find(|s| s.is_actual() && s.dedup_key() == candidate.dedup_key())
    {
        return Outcome::Duplicate { existing: dup.id };
    }

    if let Some(planned) = existing
        .iter()
        .find(|s| s.is_planned() && s.date == candidate.date && s.sport == candidate.sport)
    {
        return Outcome::Displaces {
            planned: planned.id,
        };
    }

    Outcome::New
}

/// Merge a batch of candidate actual sessions into the store.
pub async fn import_activities(
    store: &SessionStore,
    candidates: Vec<Session>,
    policy: DuplicatePolicy,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for mut candidate in candidates {
        // Re-read per candidate: earlier outcomes in the batch change
        // what later candidates match against.
        let current = store.all().await;

        match classify(&current, &candidate) {
            Outcome::Duplicate { existing } => {
                summary.duplicates += 1;
                match policy {
                    DuplicatePolicy::Skip => {
                        tracing::debug!(title = %candidate.title, "Already imported, skipping");
                    }
                    DuplicatePolicy::Update => {
                        // Keep local annotations; only provider-sourced
                        // fields are refreshed.
                        if let Some(prior) = store.get(existing).await {
                            candidate.coach_feedback = prior.coach_feedback;
                            candidate.replaced_title = prior.replaced_title;
                            candidate.replaced_description = prior.replaced_description;
                        }
                        store.overwrite(existing, candidate).await;
                        tracing::debug!(session_id = %existing, "Already imported, updated in place");
                    }
                }
            }
            Outcome::Displaces { planned } => {
                if let Some(displaced) = store.get(planned).await {
                    candidate.replaced_title = Some(displaced.title);
                    candidate.replaced_description = Some(displaced.description);
                }
                store.remove(planned).await;
                summary.spotlight = Some(candidate.id);
                summary.inserted += 1;
                summary.displaced += 1;
                tracing::info!(
                    title = %candidate.title,
                    date = %candidate.date,
                    "Imported activity displaced planned session"
                );
                store.insert(candidate).await;
            }
            Outcome::New => {
                summary.spotlight = Some(candidate.id);
                summary.inserted += 1;
                tracing::info!(title = %candidate.title, date = %candidate.date, "Imported new activity");
                store.insert(candidate).await;
            }
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        displaced = summary.displaced,
        duplicates = summary.duplicates,
        "Activity import reconciled"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, SessionTemplate, Sport};
    use chrono::NaiveDate;

    fn planned(title: &str, sport: Sport, date: &str) -> Session {
        SessionTemplate {
            date: None,
            sport,
            session_type: String::new(),
            title: title.to_string(),
            description: "as planned".to_string(),
            duration_min: 60,
            steps: vec![],
            distance_km: None,
            elevation_m: None,
        }
        .into_session(date.parse().unwrap())
    }

    fn actual(title: &str, sport: Sport, date: &str) -> Session {
        let mut session = planned(title, sport, date);
        session.origin = Origin::Actual;
        session.external_id = Some(7);
        session
    }

    #[test]
    fn test_classify_duplicate_by_title_and_date() {
        let existing = vec![actual("Morning Ride", Sport::Cycling, "2025-03-10")];
        let candidate = actual("Morning Ride", Sport::Cycling, "2025-03-10");

        assert_eq!(
            classify(&existing, &candidate),
            Outcome::Duplicate {
                existing: existing[0].id
            }
        );
    }

    #[test]
    fn test_classify_planned_does_not_count_as_duplicate() {
        // A planned session with the same title+date is a displacement
        // target, not a duplicate.
        let existing = vec![planned("Morning Ride", Sport::Cycling, "2025-03-10")];
        let candidate = actual("Morning Ride", Sport::Cycling, "2025-03-10");

        assert_eq!(
            classify(&existing, &candidate),
            Outcome::Displaces {
                planned: existing[0].id
            }
        );
    }

    #[test]
    fn test_classify_displacement_same_day_same_sport() {
        let existing = vec![planned("Planned intervals", Sport::Cycling, "2025-03-10")];
        let candidate = actual("Lunch spin", Sport::Cycling, "2025-03-10");

        assert_eq!(
            classify(&existing, &candidate),
            Outcome::Displaces {
                planned: existing[0].id
            }
        );
    }

    #[test]
    fn test_classify_no_displacement_across_sport() {
        let existing = vec![planned("Leg day", Sport::Strength, "2025-03-10")];
        let candidate = actual("Lunch spin", Sport::Cycling, "2025-03-10");

        assert_eq!(classify(&existing, &candidate), Outcome::New);
    }

    #[test]
    fn test_classify_first_match_displaced() {
        let first = planned("AM ride", Sport::Cycling, "2025-03-10");
        let second = planned("PM ride", Sport::Cycling, "2025-03-10");
        let existing = vec![first.clone(), second];
        let candidate = actual("Recorded ride", Sport::Cycling, "2025-03-10");

        // Only the first in list order is displaced.
        assert_eq!(
            classify(&existing, &candidate),
            Outcome::Displaces { planned: first.id }
        );
    }
}
