// SPDX-License-Identifier: MIT

//! Coach-facing prompt generation.
//!
//! Builds the copy-paste text documents the user hands to a
//! conversational AI: a single-session analysis request and a weekly
//! review request. The weekly prompt ends with a strict output-format
//! instruction so the AI's reply round-trips through the bulk-import
//! parser (`services::import`).

use chrono::NaiveDate;

use crate::models::{Session, TrainingObjective, TrainingPhase};
use crate::time_utils::week_end;

/// Output-format contract appended to plan-requesting prompts.
const OUTPUT_FORMAT_INSTRUCTION: &str = "\
Reply with a single JSON object and nothing else (no markdown fence, no prose):\n\
{\n\
  \"phase\": {\"name\": \"...\", \"week\": 1, \"total_weeks\": 4, \"description\": \"...\"},\n\
  \"sessions\": [\n\
    {\"date\": \"YYYY-MM-DD\", \"sport\": \"cycling|running|strength\", \"session_type\": \"...\",\n\
     \"title\": \"...\", \"description\": \"...\", \"duration_min\": 60}\n\
  ]\n\
}";

fn push_context(
    out: &mut String,
    phase: Option<&TrainingPhase>,
    objectives: &[TrainingObjective],
) {
    if let Some(phase) = phase {
        out.push_str(&format!(
            "Current training phase: {} ({} to {})",
            phase.name, phase.start, phase.end
        ));
        if !phase.goal.is_empty() {
            out.push_str(&format!(" — goal: {}", phase.goal));
        }
        out.push('\n');
    }

    if !objectives.is_empty() {
        out.push_str("Upcoming objectives:\n");
        for objective in objectives {
            out.push_str(&format!(
                "- [{:?}] {} on {}: {:.0} km",
                objective.priority, objective.name, objective.date, objective.distance_km
            ));
            if let Some(gain) = objective.elevation_gain_m {
                out.push_str(&format!(", {:.0} m+", gain));
            }
            out.push('\n');
        }
    }
}

fn push_session_line(out: &mut String, session: &Session) {
    out.push_str(&format!(
        "- {} | {} | {} | {} min",
        session.date,
        session.sport.as_str(),
        session.title,
        session.duration_min
    ));
    if let Some(km) = session.distance_km {
        out.push_str(&format!(" | {:.1} km", km));
    }
    if let Some(elevation) = session.elevation_m {
        out.push_str(&format!(" | {:.0} m+", elevation));
    }
    if let Some(hr) = session.avg_hr {
        out.push_str(&format!(" | avg HR {:.0}", hr));
    }
    if let Some(power) = session.avg_power {
        out.push_str(&format!(" | avg {:.0} W", power));
    }
    out.push('\n');
}

/// Free-text analysis request for a single completed session.
pub fn session_analysis_prompt(
    session: &Session,
    phase: Option<&TrainingPhase>,
    objectives: &[TrainingObjective],
) -> String {
    let mut out = String::new();
    out.push_str("You are my endurance coach. Analyze this training session.\n\n");
    push_context(&mut out, phase, objectives);

    out.push_str(&format!(
        "\nSession ({}, {}):\n",
        session.date,
        session.sport.as_str()
    ));
    push_session_line(&mut out, session);

    if !session.description.is_empty() {
        out.push_str(&format!("Notes: {}\n", session.description));
    }
    if let Some(planned_title) = &session.replaced_title {
        out.push_str(&format!("This replaced the planned session: {}", planned_title));
        if let Some(planned_description) = &session.replaced_description {
            if !planned_description.is_empty() {
                out.push_str(&format!(" — {}", planned_description));
            }
        }
        out.push('\n');
    }

    if !session.laps.is_empty() {
        out.push_str("Laps:\n");
        for lap in &session.laps {
            out.push_str(&format!(
                "- {}: {} s moving, {:.2} km",
                lap.name,
                lap.moving_s,
                lap.distance_m / 1000.0
            ));
            if let Some(hr) = lap.avg_hr {
                out.push_str(&format!(", avg HR {:.0}", hr));
            }
            if let Some(power) = lap.avg_power {
                out.push_str(&format!(", avg {:.0} W", power));
            }
            out.push('\n');
        }
    }

    out.push_str(
        "\nGive me: effort assessment, what went well, what to watch, \
         and one concrete suggestion for the next comparable session.\n",
    );
    out
}

/// Weekly review request covering the week's accomplished sessions,
/// ending with the strict output-format instruction for the next plan.
pub fn weekly_review_prompt(
    week_start: NaiveDate,
    sessions: &[Session],
    phase: Option<&TrainingPhase>,
    objectives: &[TrainingObjective],
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "You are my endurance coach. Review my training week {} to {}.\n\n",
        week_start,
        week_end(week_start)
    ));
    push_context(&mut out, phase, objectives);

    let accomplished: Vec<&Session> = sessions.iter().filter(|s| s.is_actual()).collect();
    if accomplished.is_empty() {
        out.push_str("\nNo sessions were completed this week.\n");
    } else {
        out.push_str("\nCompleted sessions:\n");
        for session in &accomplished {
            push_session_line(&mut out, session);
            if let Some(feedback) = &session.coach_feedback {
                out.push_str(&format!("  Previous feedback: {}\n", feedback));
            }
        }
    }

    let planned_only: Vec<&Session> = sessions.iter().filter(|s| s.is_planned()).collect();
    if !planned_only.is_empty() {
        out.push_str("\nPlanned but not completed:\n");
        for session in &planned_only {
            push_session_line(&mut out, session);
        }
    }

    out.push_str(
        "\nGive me a short review of the week, then propose next week's plan.\n\n",
    );
    out.push_str(OUTPUT_FORMAT_INSTRUCTION);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, SessionTemplate, Sport};
    use crate::services::import::parse_import_document;

    fn session(title: &str, origin: Origin, date: &str) -> Session {
        let mut s = SessionTemplate {
            date: None,
            sport: Sport::Cycling,
            session_type: "endurance".to_string(),
            title: title.to_string(),
            description: String::new(),
            duration_min: 90,
            steps: vec![],
            distance_km: None,
            elevation_m: None,
        }
        .into_session(date.parse().unwrap());
        s.origin = origin;
        s
    }

    #[test]
    fn test_session_prompt_mentions_replaced_plan() {
        let mut s = session("Morning Ride", Origin::Actual, "2025-03-10");
        s.replaced_title = Some("Planned intervals".to_string());
        s.replaced_description = Some("4x8 min threshold".to_string());

        let prompt = session_analysis_prompt(&s, None, &[]);
        assert!(prompt.contains("Morning Ride"));
        assert!(prompt.contains("Planned intervals"));
        assert!(prompt.contains("4x8 min threshold"));
    }

    #[test]
    fn test_weekly_prompt_separates_accomplished_and_planned() {
        let week = "2025-03-10".parse().unwrap();
        let sessions = vec![
            session("Done ride", Origin::Actual, "2025-03-10"),
            session("Skipped ride", Origin::Planned, "2025-03-12"),
        ];

        let prompt = weekly_review_prompt(week, &sessions, None, &[]);
        let completed_at = prompt.find("Completed sessions:").unwrap();
        let planned_at = prompt.find("Planned but not completed:").unwrap();
        assert!(completed_at < planned_at);
        assert!(prompt.contains("Done ride"));
        assert!(prompt.contains("Skipped ride"));
    }

    #[test]
    fn test_weekly_prompt_ends_with_output_contract() {
        let week = "2025-03-10".parse().unwrap();
        let prompt = weekly_review_prompt(week, &[], None, &[]);
        assert!(prompt.trim_end().ends_with('}'));
        assert!(prompt.contains("single JSON object"));
    }

    #[test]
    fn test_output_contract_example_parses_as_import_document() {
        // The format the prompt demands must be the format the import
        // parser accepts, otherwise the round trip breaks.
        let example = r#"{
            "phase": {"name": "Build", "week": 1, "total_weeks": 4, "description": ""},
            "sessions": [
                {"date": "2025-03-17", "sport": "cycling", "session_type": "endurance",
                 "title": "Z2 ride", "description": "", "duration_min": 120}
            ]
        }"#;
        assert!(parse_import_document(example).is_ok());
    }
}
