use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ArtifactTag, Clock, NextReminder, ReminderSlot, SystemClock, WorkArtifact,
    WorkSettings, artifact::FileType, calendar, reminder,
};

#[derive(Clone)]
pub struct AppState {
    settings: Arc<RwLock<WorkSettings>>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(settings: WorkSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: WorkSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            clock,
        }
    }

    pub fn with_shared(settings: Arc<RwLock<WorkSettings>>, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    fn settings(&self) -> Arc<RwLock<WorkSettings>> {
        self.settings.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkdayResponse {
    pub date: NaiveDate,
    pub weekday: u8,
    pub is_workday: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub timestamp: NaiveDateTime,
    #[serde(default = "default_file_type")]
    pub file_type: FileType,
}

fn default_file_type() -> FileType {
    FileType::Image
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub tag: ArtifactTag,
    pub title: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/workday/:date", get(workday))
        .route("/classify", post(classify))
        .route("/reminders/next", get(next_reminder))
        .route("/reminders/plan", get(reminder_plan))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, settings: WorkSettings) -> std::io::Result<()> {
    let state = AppState::new(settings);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_settings(State(state): State<AppState>) -> Json<WorkSettings> {
    let settings = state.settings();
    let current = settings.read().clone();
    Json(current)
}

async fn update_settings(
    State(state): State<AppState>,
    Json(incoming): Json<WorkSettings>,
) -> Result<Json<WorkSettings>, ApiError> {
    incoming
        .validate()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    let settings = state.settings();
    {
        let mut guard = settings.write();
        *guard = incoming;
    }
    tracing::info!("settings replaced via http api");
    let current = settings.read().clone();
    Ok(Json(current))
}

async fn workday(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<WorkdayResponse>, ApiError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid(format!("invalid date '{date}' (YYYY-MM-DD)")))?;
    let is_workday = state.settings().read().is_workday(date);
    Ok(Json(WorkdayResponse {
        date,
        weekday: calendar::weekday_number(&date),
        is_workday,
    }))
}

async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Json<ClassifyResponse> {
    let artifact = {
        let settings = state.settings();
        let guard = settings.read();
        let config = guard.resolved_config(request.timestamp.date());
        WorkArtifact::capture(
            0,
            request.file_type,
            request.timestamp,
            None,
            guard.company_name.clone(),
            &config,
        )
    };
    Json(ClassifyResponse {
        tag: artifact.tag,
        title: artifact.title(),
    })
}

async fn next_reminder(State(state): State<AppState>) -> Json<Option<NextReminder>> {
    let now = state.clock.now();
    Json(state.settings().read().next_reminder(now))
}

async fn reminder_plan(State(state): State<AppState>) -> Json<Vec<ReminderSlot>> {
    let today = state.clock.now().date();
    let config = state.settings().read().resolved_config(today);
    Json(reminder::weekly_plan(&config))
}
