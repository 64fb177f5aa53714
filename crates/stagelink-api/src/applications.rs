use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::error;
use uuid::Uuid;

use stagelink_db::models::{ApplicationRow, GroupApplicationRow};
use stagelink_types::api::{
    ApplicationResponse, ApplyRequest, Claims, DecideRequest, GroupApplicationResponse,
    GroupApplyRequest, JobApplicationsResponse,
};
use stagelink_types::models::ApplicationStatus;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_enum, parse_id};

pub async fn apply_to_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyRequest>,
) -> ApiResult<impl IntoResponse> {
    let me = claims.sub.to_string();
    let row = state.db.apply_to_job(
        &Uuid::new_v4().to_string(),
        &me,
        &job_id.to_string(),
        &me,
        req.message.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// The owning venue's review screen: solo and group applications together.
pub async fn applications_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<JobApplicationsResponse>> {
    let db = state.clone();
    let me = claims.sub.to_string();
    let jid = job_id.to_string();

    let (solo, group) = tokio::task::spawn_blocking(move || {
        let solo = db.db.applications_for_job(&me, &jid)?;
        let group = db.db.group_applications_for_job(&me, &jid)?;
        Ok::<_, stagelink_db::StoreError>((solo, group))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal()
    })??;

    Ok(Json(JobApplicationsResponse {
        applications: solo.into_iter().map(to_response).collect(),
        group_applications: group.into_iter().map(to_group_response).collect(),
    }))
}

pub async fn my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ApplicationResponse>>> {
    let rows = state.db.my_applications(&claims.sub.to_string())?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn decide_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DecideRequest>,
) -> ApiResult<Json<ApplicationResponse>> {
    let row = state.db.decide_application(
        &claims.sub.to_string(),
        &application_id.to_string(),
        req.status,
    )?;
    Ok(Json(to_response(row)))
}

pub async fn apply_as_group(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GroupApplyRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = state.db.apply_as_group(
        &Uuid::new_v4().to_string(),
        &claims.sub.to_string(),
        &job_id.to_string(),
        &req.group_id.to_string(),
        req.message.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(to_group_response(row))))
}

pub async fn applications_for_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<GroupApplicationResponse>>> {
    let rows = state
        .db
        .applications_for_group(&claims.sub.to_string(), &group_id.to_string())?;
    Ok(Json(rows.into_iter().map(to_group_response).collect()))
}

pub async fn decide_group_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DecideRequest>,
) -> ApiResult<Json<GroupApplicationResponse>> {
    let row = state.db.decide_group_application(
        &claims.sub.to_string(),
        &application_id.to_string(),
        req.status,
    )?;
    Ok(Json(to_group_response(row)))
}

fn to_response(row: ApplicationRow) -> ApplicationResponse {
    ApplicationResponse {
        id: parse_id(&row.id, "application"),
        job_id: parse_id(&row.job_id, "job"),
        artist_id: parse_id(&row.artist_id, "profile"),
        status: parse_enum(&row.status, "application status", ApplicationStatus::Pending),
        created_at: parse_created_at(&row.created_at, "application", &row.id),
        job_title: row.job_title,
        artist_name: row.artist_name,
        message: row.message,
    }
}

fn to_group_response(row: GroupApplicationRow) -> GroupApplicationResponse {
    GroupApplicationResponse {
        id: parse_id(&row.id, "group application"),
        job_id: parse_id(&row.job_id, "job"),
        group_id: parse_id(&row.group_id, "group"),
        status: parse_enum(&row.status, "application status", ApplicationStatus::Pending),
        created_at: parse_created_at(&row.created_at, "group application", &row.id),
        job_title: row.job_title,
        group_name: row.group_name,
        message: row.message,
    }
}
