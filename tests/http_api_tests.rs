#![cfg(feature = "http_api")]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use tower::util::ServiceExt;
use work_trace::{FixedClock, ScheduleType, WorkSettings, http_api};

fn new_router() -> axum::Router {
    // Monday 2025-03-03, mid-shift
    let now = NaiveDate::from_ymd_opt(2025, 3, 3)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let state = http_api::AppState::with_clock(WorkSettings::default(), Arc::new(FixedClock(now)));
    http_api::router(state)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send_json(app: &axum::Router, method: &str, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn workday_endpoint_uses_current_settings() {
    let app = new_router();
    let (status, body) = get_json(&app, "/workday/2025-03-08").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weekday"], 7);
    assert_eq!(body["is_workday"], false);

    let mut settings = WorkSettings::default();
    settings.set_schedule_type(ScheduleType::SingleWeekend);
    let (status, _) = send_json(&app, "PUT", "/settings", serde_json::to_value(&settings).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app, "/workday/2025-03-08").await;
    assert_eq!(body["is_workday"], true);

    let (status, body) = get_json(&app, "/workday/not-a-date").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let app = new_router();
    let payload = json!({
        "company_name": "Acme",
        "schedule": {
            "schedule_type": "double_weekend",
            "start_time": "17:00",
            "end_time": "09:00"
        }
    });
    let (status, body) = send_json(&app, "PUT", "/settings", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("must be after"));

    let (_, current) = get_json(&app, "/settings").await;
    assert_eq!(current["schedule"]["start_time"], "09:00");
}

#[tokio::test]
async fn classify_tags_images_and_audio() {
    let app = new_router();
    let (status, body) = send_json(
        &app,
        "POST",
        "/classify",
        json!({ "timestamp": "2025-03-03T16:45:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"], "check_out");
    assert_eq!(body["title"], "03-03 16:45-Check-out");

    let (_, body) = send_json(
        &app,
        "POST",
        "/classify",
        json!({ "timestamp": "2025-03-03T16:45:00", "file_type": "audio" }),
    )
    .await;
    assert_eq!(body["tag"], "audio");
}

#[tokio::test]
async fn reminders_follow_injected_clock() {
    let app = new_router();
    let (status, body) = get_json(&app, "/reminders/next").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["at"], "2025-03-03T17:00:00");
    assert_eq!(body["kind"], "check_out");

    let (_, plan) = get_json(&app, "/reminders/plan").await;
    assert_eq!(plan.as_array().unwrap().len(), 10);
    assert_eq!(plan[0]["identifier"], "work-start-2");
    assert_eq!(plan[0]["time"], "09:00");

    let mut settings = WorkSettings::default();
    settings.set_schedule_type(ScheduleType::Custom);
    settings.set_rest_days(1..=7).unwrap();
    send_json(&app, "PUT", "/settings", serde_json::to_value(&settings).unwrap()).await;
    let (status, body) = get_json(&app, "/reminders/next").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn next_reminder_agrees_with_workday_across_rollover() {
    // Friday evening, one week after the long week was switched on
    let now = NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap();
    let mut settings = WorkSettings::default();
    settings.set_schedule_type(ScheduleType::AlternatingWeekend);
    settings.set_long_week(true, NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
    let state = http_api::AppState::with_clock(settings, Arc::new(FixedClock(now)));
    let app = http_api::router(state);

    let (_, saturday) = get_json(&app, "/workday/2025-03-15").await;
    assert_eq!(saturday["is_workday"], false);

    let (status, next) = get_json(&app, "/reminders/next").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["at"], "2025-03-17T09:00:00");
    assert_eq!(next["kind"], "check_in");
}
