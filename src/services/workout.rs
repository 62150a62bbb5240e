// SPDX-License-Identifier: MIT

//! Structured-workout file export.
//!
//! Generates an interval-trainer workout document (ZWO-style XML) for
//! structured cycling sessions: the first step becomes a warmup ramp,
//! the last a cooldown ramp, and everything between steady-state blocks
//! (repeats expand to consecutive blocks). Power targets are emitted as
//! fractions of the rider's FTP.

use crate::models::{IntensityRange, PlannedStep, Session, Sport, Threshold};

/// Default power band when a step carries no intensity target.
const FREE_RIDE_LOW: f64 = 0.5;
const FREE_RIDE_HIGH: f64 = 0.65;

/// Render a session as an interval-trainer workout file.
///
/// Only structured cycling sessions export; anything else returns
/// `None`.
pub fn workout_file(session: &Session) -> Option<String> {
    if session.sport != Sport::Cycling || session.steps.is_empty() {
        return None;
    }

    let mut blocks = String::new();
    let last = session.steps.len() - 1;
    for (index, step) in session.steps.iter().enumerate() {
        let (low, high) = power_band(step.intensity.as_ref());
        let seconds = u64::from(step.minutes) * 60;
        let repeat = step.repeat.unwrap_or(1).max(1);

        if index == 0 {
            blocks.push_str(&format!(
                "        <Warmup Duration=\"{}\" PowerLow=\"{:.2}\" PowerHigh=\"{:.2}\"/>\n",
                seconds * u64::from(repeat),
                low,
                high
            ));
        } else if index == last && last > 0 {
            blocks.push_str(&format!(
                "        <Cooldown Duration=\"{}\" PowerLow=\"{:.2}\" PowerHigh=\"{:.2}\"/>\n",
                seconds * u64::from(repeat),
                high,
                low
            ));
        } else {
            for _ in 0..repeat {
                blocks.push_str(&format!(
                    "        <SteadyState Duration=\"{}\" Power=\"{:.2}\"/>\n",
                    seconds,
                    (low + high) / 2.0
                ));
            }
        }
    }

    Some(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <workout_file>\n\
         \x20   <author>trainboard</author>\n\
         \x20   <name>{}</name>\n\
         \x20   <description>{}</description>\n\
         \x20   <sportType>bike</sportType>\n\
         \x20   <workout>\n\
         {}\
         \x20   </workout>\n\
         </workout_file>\n",
        escape_xml(&session.title),
        escape_xml(&session.description),
        blocks
    ))
}

/// Power band of a step as FTP fractions.
///
/// Heart-rate-referenced bands have no meaningful power equivalent, so
/// they fall back to the free-ride band.
fn power_band(intensity: Option<&IntensityRange>) -> (f64, f64) {
    match intensity {
        Some(range) if range.reference == Threshold::Ftp => (
            f64::from(range.low_pct) / 100.0,
            f64::from(range.high_pct) / 100.0,
        ),
        _ => (FREE_RIDE_LOW, FREE_RIDE_HIGH),
    }
}

/// Expanded total duration of a structured plan, in minutes.
pub fn plan_minutes(steps: &[PlannedStep]) -> u32 {
    steps
        .iter()
        .map(|s| s.minutes * s.repeat.unwrap_or(1).max(1))
        .sum()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
