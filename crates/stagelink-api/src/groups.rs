use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use stagelink_db::models::{GroupRow, MemberRow};
use stagelink_types::api::{
    AddMemberRequest, Claims, CreateGroupRequest, GroupResponse, MemberResponse,
    UpdateGroupRequest,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_id};

/// Group creation is two statements, not a transaction: the group row, then
/// the creator's membership. A crash in between leaves a group without its
/// creator-member row; the membership insert is idempotent so re-running it
/// repairs the gap.
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    let me = claims.sub.to_string();
    let row = state
        .db
        .create_group(&Uuid::new_v4().to_string(), &me, &me, &req)?;

    let role = req.role.as_deref().unwrap_or("member");
    state.db.ensure_membership(&row.id, &me, role)?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Json<Vec<GroupResponse>>> {
    let rows = state.db.list_groups()?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GroupResponse>> {
    let row = state
        .db
        .get_group(&id.to_string())?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(to_response(row)))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let row = state
        .db
        .update_group(&claims.sub.to_string(), &id.to_string(), &req)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    state
        .db
        .delete_group(&claims.sub.to_string(), &id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.role.trim().is_empty() {
        return Err(ApiError::bad_request("role must not be empty"));
    }

    let row = state.db.add_member(
        &Uuid::new_v4().to_string(),
        &claims.sub.to_string(),
        &group_id.to_string(),
        &req.profile_id.to_string(),
        &req.role,
    )?;
    Ok((StatusCode::CREATED, Json(to_member_response(row))))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((group_id, profile_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    state.db.remove_member(
        &claims.sub.to_string(),
        &group_id.to_string(),
        &profile_id.to_string(),
    )?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let rows = state.db.members_of(&group_id.to_string())?;
    Ok(Json(rows.into_iter().map(to_member_response).collect()))
}

fn to_response(row: GroupRow) -> GroupResponse {
    GroupResponse {
        id: parse_id(&row.id, "group"),
        created_by: parse_id(&row.created_by, "profile"),
        created_at: parse_created_at(&row.created_at, "group", &row.id),
        name: row.name,
        description: row.description,
        genre: row.genre,
    }
}

fn to_member_response(row: MemberRow) -> MemberResponse {
    MemberResponse {
        id: parse_id(&row.id, "membership"),
        group_id: parse_id(&row.group_id, "group"),
        profile_id: parse_id(&row.profile_id, "profile"),
        created_at: parse_created_at(&row.created_at, "membership", &row.id),
        display_name: row.display_name,
        role: row.role,
    }
}
