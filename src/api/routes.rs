use crate::analyzer::{self, Window, YearScope, report};
use crate::config::Config;
use crate::db::{self, ActivityRecord, Database, NewActivity, User};
use crate::error::TrackerError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/users", get(user_list).post(user_create))
        .route(
            "/api/v1/users/:username/activities",
            get(activity_list).post(activity_create),
        )
        .route("/api/v1/users/:username/insights", get(insights))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    username: String,
}

#[derive(Debug, Deserialize)]
struct LogActivityPayload {
    date: Option<String>,
    workout: bool,
    junk_food: bool,
    yoga: bool,
}

#[derive(Debug, Deserialize)]
struct InsightsQuery {
    window: Option<String>,
    today: Option<String>,
    match_year: Option<bool>,
}

#[derive(Debug, Serialize)]
struct UsersPayload {
    users: Vec<User>,
}

#[derive(Debug, Serialize)]
struct ActivitiesPayload {
    username: String,
    count: usize,
    activities: Vec<ActivityRecord>,
}

async fn user_list(State(state): State<ApiState>) -> ApiResult<Json<UsersPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let users = database.list_users()?;

    Ok(Json(UsersPayload { users }))
}

async fn user_create(
    State(state): State<ApiState>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(payload) = payload?;
    let username = db::normalize_username(&payload.username)?.to_string();

    let database = Database::open(&state.config.db_path)?;
    let id = database.add_user(&username)?;
    info!(user = %username, id, "user added via API");

    Ok((StatusCode::CREATED, Json(User { id, username })))
}

async fn activity_list(
    State(state): State<ApiState>,
    Path(username): Path<String>,
) -> ApiResult<Json<ActivitiesPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let user_id = database.resolve_user_id(&username)?;
    let activities = database.fetch_activities(user_id)?;

    Ok(Json(ActivitiesPayload {
        username,
        count: activities.len(),
        activities,
    }))
}

async fn activity_create(
    State(state): State<ApiState>,
    Path(username): Path<String>,
    payload: Result<Json<LogActivityPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(payload) = payload?;
    let date = payload
        .date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Local::now().date_naive());

    let database = Database::open(&state.config.db_path)?;
    let user_id = database.resolve_user_id(&username)?;
    if database.count_activities_on(user_id, date)? > 0 {
        warn!(user = %username, %date, "day already has a record; logging another one");
    }

    let entry = NewActivity {
        date,
        workout: payload.workout,
        junk_food: payload.junk_food,
        yoga: payload.yoga,
    };
    let id = database.insert_activity(user_id, &entry)?;
    info!(user = %username, %date, id, "activity logged via API");

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn insights(
    State(state): State<ApiState>,
    Path(username): Path<String>,
    query: Result<Query<InsightsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let window = query
        .window
        .as_deref()
        .map(str::parse::<Window>)
        .transpose()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?
        .unwrap_or(state.config.default_window);
    let today = query
        .today
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Local::now().date_naive());
    let scope = query
        .match_year
        .map(YearScope::from_flag)
        .unwrap_or_else(|| state.config.year_scope());

    let database = Database::open(&state.config.db_path)?;
    let user_id = database.resolve_user_id(&username)?;
    let records = database.fetch_activities(user_id)?;
    let summary = analyzer::summarize(&records, window, today, scope);

    Ok(Json(report::to_json(&username, &summary)))
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date format: {input}. Example: 2024-06-10"))
    })
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl From<TrackerError> for ApiError {
    fn from(value: TrackerError) -> Self {
        match value {
            TrackerError::DuplicateUser(_) => Self::Conflict(value.to_string()),
            TrackerError::UserNotFound(_) => Self::NotFound(value.to_string()),
            TrackerError::InvalidUsername | TrackerError::UnknownUserId(_) => {
                Self::BadRequest(value.to_string())
            }
            TrackerError::Database(_) | TrackerError::Io(_) => Self::Internal(value.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
