// SPDX-License-Identifier: MIT

//! Caller-contract policies enforced at the HTTP layer.
//!
//! The store primitives deliberately allow anything (reconciliation
//! needs them to); these tests verify that the route layer refuses what
//! the UI must never do, deleting or rescheduling completed sessions in
//! particular.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;
use trainboard::models::Sport;

mod common;
use common::{actual, create_test_app, planned};

#[tokio::test]
async fn test_delete_actual_session_refused() {
    let (app, state) = create_test_app();
    let completed = actual("Morning Ride", Sport::Cycling, "2025-03-10");
    let id = completed.id;
    state.store.insert(completed).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // The session is still there: the refusal happened before the store.
    assert!(state.store.get(id).await.is_some());
}

#[tokio::test]
async fn test_delete_planned_session_allowed() {
    let (app, state) = create_test_app();
    let session = planned("Planned ride", Sport::Cycling, "2025-03-10");
    let id = session.id;
    state.store.insert(session).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.store.get(id).await.is_none());
}

#[tokio::test]
async fn test_delete_unknown_session_is_404() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reschedule_actual_session_refused() {
    let (app, state) = create_test_app();
    let completed = actual("Morning Ride", Sport::Cycling, "2025-03-10");
    let id = completed.id;
    state.store.insert(completed).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/sessions/{}/date", id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"date": "2025-03-14"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let kept = state.store.get(id).await.unwrap();
    assert_eq!(kept.date.to_string(), "2025-03-10");
}

#[tokio::test]
async fn test_relabel_actual_session_allowed() {
    // Title/description is the one edit an imported session accepts.
    let (app, state) = create_test_app();
    let completed = actual("Afternoon Activity", Sport::Cycling, "2025-03-10");
    let id = completed.id;
    state.store.insert(completed).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/sessions/{}", id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"title": "Col du Tourmalet", "description": "big day"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let relabeled = state.store.get(id).await.unwrap();
    assert_eq!(relabeled.title, "Col du Tourmalet");
}

#[tokio::test]
async fn test_create_session_rejects_invalid_input() {
    let (app, state) = create_test_app();

    // Empty title fails boundary validation and never reaches the store.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"date": "2025-03-10", "sport": "cycling", "title": "", "duration_min": 60}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.is_empty().await);
}

#[tokio::test]
async fn test_create_session_happy_path() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"date": "2025-03-10", "sport": "cycling", "session_type": "endurance",
                        "title": "Z2 ride", "duration_min": 120}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.store.len().await, 1);
}

#[tokio::test]
async fn test_wellness_requires_credentials() {
    // No wellness credentials in settings: the endpoint short-circuits
    // with a single clear not-connected error.
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/wellness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_calendar_sync_requires_connection() {
    let (app, state) = create_test_app();
    state
        .store
        .insert(planned("Planned ride", Sport::Cycling, "2025-03-10"))
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sync/calendar?week=2025-03-10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Not connected: refused before any partial work.
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_activity_sync_requires_connection() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sync/activities")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"days": 7}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/sessions")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
