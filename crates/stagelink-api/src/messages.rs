use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::error;
use uuid::Uuid;

use stagelink_db::models::{ConversationRow, MessageRow};
use stagelink_types::api::{
    Claims, ConversationSummary, MarkReadResponse, MessageResponse, SendMessageRequest,
};
use stagelink_types::models::ProfileType;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_created_at, parse_enum, parse_id};

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("content must not be empty"));
    }

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let me = claims.sub.to_string();
    let receiver = req.receiver_id.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db
            .send_message(&Uuid::new_v4().to_string(), &me, &me, &receiver, &req.content)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal()
    })??;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// The derived conversation list, recomputed per request.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let db = state.clone();
    let me = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.conversations_for(&me))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal()
        })??;

    Ok(Json(rows.into_iter().map(to_summary).collect()))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let db = state.clone();
    let me = claims.sub.to_string();
    let partner = partner_id.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.conversation_between(&me, &partner))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal()
        })??;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// Explicitly separate from thread retrieval; a concurrent reader may still
/// observe stale unread counts between the two calls.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = state
        .db
        .mark_read(&claims.sub.to_string(), &partner_id.to_string())?;
    Ok(Json(MarkReadResponse {
        updated: updated as u64,
    }))
}

fn to_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_id(&row.id, "message"),
        sender_id: parse_id(&row.sender_id, "profile"),
        receiver_id: parse_id(&row.receiver_id, "profile"),
        created_at: parse_created_at(&row.created_at, "message", &row.id),
        sender_name: row.sender_name,
        receiver_name: row.receiver_name,
        content: row.content,
        is_read: row.is_read,
    }
}

fn to_summary(row: ConversationRow) -> ConversationSummary {
    ConversationSummary {
        partner_id: parse_id(&row.partner_id, "profile"),
        partner_type: parse_enum(&row.partner_type, "profile_type", ProfileType::Artist),
        last_message_at: parse_created_at(&row.last_message_at, "conversation", &row.partner_id),
        partner_name: row.partner_name,
        last_message: row.last_message,
        unread_count: row.unread_count,
    }
}
