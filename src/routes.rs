use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequestParts, Query, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::auth::{AuthError, AuthService, SigninRequest, SignupRequest};
use crate::db::{self, Pool};
use crate::error::AppError;
use crate::ingest;
use crate::model::Workout;
use crate::stats;
use crate::store::{SqliteWorkoutStore, WorkoutStore};

/// Shared handler state: the pool for reads, the auth service and the
/// workout store used for ingestion.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub auth: Arc<AuthService>,
    pub store: Arc<dyn WorkoutStore>,
}

impl AppState {
    pub fn new(pool: Pool, auth: AuthService) -> Self {
        let store = Arc::new(SqliteWorkoutStore::new(pool.clone()));
        Self::with_store(pool, auth, store)
    }

    pub fn with_store(pool: Pool, auth: AuthService, store: Arc<dyn WorkoutStore>) -> Self {
        Self {
            pool,
            auth: Arc::new(auth),
            store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/user/signup", post(signup_handler))
        .route("/api/user/signin", post(signin_handler))
        .route("/api/user/dashboard", get(dashboard_handler))
        .route(
            "/api/user/workout",
            get(workouts_by_date_handler).post(add_workout_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Owner id taken from a valid `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        Ok(AuthUser(state.auth.verify_token(token)?))
    }
}

pub async fn signup_handler(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let session = state.auth.register(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn signin_handler(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let session = state.auth.login(&state.pool, request).await?;
    Ok((StatusCode::OK, Json(session)))
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    if db::find_user_by_id(&state.pool, user_id).await?.is_none() {
        return Err(AuthError::UserNotFound.into());
    }
    let summary = stats::dashboard(&state.pool, user_id, Utc::now().date_naive()).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

pub async fn workouts_by_date_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let day = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_day(raw)?,
        None => Utc::now().date_naive(),
    };
    let daily = stats::workouts_on(&state.pool, user_id, day).await?;
    Ok(Json(daily))
}

/// `YYYY-MM-DD`, limited to days whose UTC window is representable.
fn parse_day(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .filter(|day| stats::day_bounds(*day).is_some())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", raw)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AddWorkoutRequest {
    #[serde(rename = "workoutString", default)]
    pub workout_string: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddWorkoutResponse {
    pub message: &'static str,
    pub workouts: Vec<Workout>,
}

pub async fn add_workout_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // An absent body reads as an empty request so it reaches the
    // missing-workout check.
    let request: AddWorkoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AddWorkoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::BadRequest(format!("Invalid request body: {}", err)))?
    };
    let workouts = ingest::add_workouts(
        state.store.as_ref(),
        user_id,
        request.workout_string.as_deref(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(AddWorkoutResponse {
            message: "Workouts added successfully",
            workouts,
        }),
    ))
}
