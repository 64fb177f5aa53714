use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use stagelink_db::models::ProfileRow;
use stagelink_types::api::{Claims, ProfileResponse, UpdateProfileRequest};
use stagelink_types::models::ProfileType;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_enum, parse_id};

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<ProfileResponse>> {
    let row = state
        .db
        .get_profile(&claims.sub.to_string())?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(to_response(row)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    if let Some(name) = &req.display_name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("display_name must not be empty"));
        }
    }

    let me = claims.sub.to_string();
    let row = state.db.update_profile(&me, &me, &req)?;
    Ok(Json(to_response(row)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProfileResponse>> {
    let row = state
        .db
        .get_profile(&id.to_string())?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(to_response(row)))
}

fn to_response(row: ProfileRow) -> ProfileResponse {
    ProfileResponse {
        id: parse_id(&row.id, "profile"),
        profile_type: parse_enum(&row.profile_type, "profile_type", ProfileType::Artist),
        social_links: row
            .social_links
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok()),
        created_at: parse_created_at(&row.created_at, "profile", &row.id),
        email: row.email,
        display_name: row.display_name,
        bio: row.bio,
        website: row.website,
        phone: row.phone,
        picture_url: row.picture_url,
        location: row.location,
        role: row.role,
    }
}
