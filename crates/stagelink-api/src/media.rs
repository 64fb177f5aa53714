use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use stagelink_db::models::MediaRow;
use stagelink_types::api::{Claims, CreateMediaRequest, MediaResponse};
use stagelink_types::models::MediaType;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_enum, parse_id};

pub async fn create_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateMediaRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.url.trim().is_empty() {
        return Err(ApiError::bad_request("url must not be empty"));
    }

    let me = claims.sub.to_string();
    let row = state
        .db
        .create_media(&Uuid::new_v4().to_string(), &me, &me, &req)?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn list_for_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MediaResponse>>> {
    let rows = state.db.list_media_for(&profile_id.to_string())?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(media_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    state
        .db
        .delete_media(&claims.sub.to_string(), &media_id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(row: MediaRow) -> MediaResponse {
    MediaResponse {
        id: parse_id(&row.id, "media"),
        profile_id: parse_id(&row.profile_id, "profile"),
        media_type: parse_enum(&row.media_type, "media_type", MediaType::Image),
        created_at: parse_created_at(&row.created_at, "media", &row.id),
        url: row.url,
        caption: row.caption,
    }
}
