use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use stagelink_db::models::JobRow;
use stagelink_types::api::{Claims, CreateJobRequest, JobResponse, UpdateJobRequest};
use stagelink_types::models::JobStatus;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_enum, parse_id};

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub status: Option<JobStatus>,
    pub genre: Option<String>,
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<impl IntoResponse> {
    for (field, value) in [
        ("title", &req.title),
        ("description", &req.description),
        ("genre", &req.genre),
        ("event_date", &req.event_date),
        ("location", &req.location),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{} must not be empty", field)));
        }
    }

    let me = claims.sub.to_string();
    let row = state
        .db
        .create_job(&Uuid::new_v4().to_string(), &me, &me, &req)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Json<Vec<JobResponse>>> {
    // Run blocking board query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.list_jobs(query.status, query.genre.as_deref())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal()
    })??;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobResponse>> {
    let row = state
        .db
        .get_job(&id.to_string())?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(to_response(row)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateJobRequest>,
) -> ApiResult<Json<JobResponse>> {
    let row = state
        .db
        .update_job(&claims.sub.to_string(), &id.to_string(), &req)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    state
        .db
        .delete_job(&claims.sub.to_string(), &id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn to_response(row: JobRow) -> JobResponse {
    JobResponse {
        id: parse_id(&row.id, "job"),
        venue_id: parse_id(&row.venue_id, "profile"),
        status: parse_enum(&row.status, "job status", JobStatus::Open),
        created_at: parse_created_at(&row.created_at, "job", &row.id),
        title: row.title,
        description: row.description,
        genre: row.genre,
        event_date: row.event_date,
        location: row.location,
        pay_range: row.pay_range,
        requirements: row.requirements,
        contact_info: row.contact_info,
    }
}
