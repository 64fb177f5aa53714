use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use stagelink_db::models::VenueRow;
use stagelink_types::api::{Claims, CreateVenueRequest, UpdateVenueRequest, VenueResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_id};

pub async fn create_venue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateVenueRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_coords(req.latitude, req.longitude)?;
    for (field, value) in [
        ("name", &req.name),
        ("genre", &req.genre),
        ("address", &req.address),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{} must not be empty", field)));
        }
    }

    let row = state.db.create_venue(
        &Uuid::new_v4().to_string(),
        &claims.sub.to_string(),
        &req,
    )?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn list_venues(State(state): State<AppState>) -> ApiResult<Json<Vec<VenueResponse>>> {
    let rows = state.db.list_venues()?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VenueResponse>> {
    let row = state
        .db
        .get_venue(&id.to_string())?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(to_response(row)))
}

pub async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateVenueRequest>,
) -> ApiResult<Json<VenueResponse>> {
    if let (Some(lat), Some(lng)) = (req.latitude, req.longitude) {
        validate_coords(lat, lng)?;
    }

    let row = state
        .db
        .update_venue(&claims.sub.to_string(), &id.to_string(), &req)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_venue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    state
        .db
        .delete_venue(&claims.sub.to_string(), &id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_coords(latitude: f64, longitude: f64) -> ApiResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::bad_request("latitude out of range"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::bad_request("longitude out of range"));
    }
    Ok(())
}

fn to_response(row: VenueRow) -> VenueResponse {
    VenueResponse {
        id: parse_id(&row.id, "venue"),
        owner_id: row.owner_id.as_deref().map(|o| parse_id(o, "profile")),
        created_at: parse_created_at(&row.created_at, "venue", &row.id),
        name: row.name,
        genre: row.genre,
        address: row.address,
        latitude: row.latitude,
        longitude: row.longitude,
        description: row.description,
        website: row.website,
        phone: row.phone,
        capacity: row.capacity,
    }
}
