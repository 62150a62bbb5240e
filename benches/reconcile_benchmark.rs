use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trainboard::models::{Origin, Session, SessionTemplate, Sport};
use trainboard::services::reconcile::classify;

fn make_session(index: u32, origin: Origin) -> Session {
    let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(i64::from(index % 365));
    let sport = match index % 3 {
        0 => Sport::Cycling,
        1 => Sport::Running,
        _ => Sport::Strength,
    };
    let mut session = SessionTemplate {
        date: None,
        sport,
        session_type: "endurance".to_string(),
        title: format!("Session {}", index),
        description: String::new(),
        duration_min: 60,
        steps: vec![],
        distance_km: None,
        elevation_m: None,
    }
    .into_session(date);
    session.origin = origin;
    session
}

fn benchmark_classify(c: &mut Criterion) {
    // A year of mixed planned/actual sessions
    let existing: Vec<Session> = (0..1000)
        .map(|i| {
            make_session(
                i,
                if i % 2 == 0 { Origin::Actual } else { Origin::Planned },
            )
        })
        .collect();

    // Candidate matching nothing (worst case: full scan)
    let mut miss = make_session(2000, Origin::Actual);
    miss.title = "Unseen ride".to_string();
    miss.date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

    // Candidate duplicating an early actual session (best case)
    let hit = existing[0].clone();

    let mut group = c.benchmark_group("reconcile_classify");

    group.bench_function("full_scan_no_match", |b| {
        b.iter(|| classify(black_box(&existing), black_box(&miss)))
    });

    group.bench_function("early_duplicate_hit", |b| {
        b.iter(|| classify(black_box(&existing), black_box(&hit)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_classify);
criterion_main!(benches);
