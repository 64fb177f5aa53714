use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use stagelink_db::Database;
use stagelink_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use stagelink_types::models::ProfileType;

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Registration provisions the profile row alongside the account: type
/// defaults to artist, display name to the email's local part.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    let local = email_local_part(&email)
        .ok_or_else(|| ApiError::bad_request("invalid email address"))?;
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(local)
        .to_string();
    let profile_type = req.profile_type.unwrap_or(ProfileType::Artist);

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::internal())?
        .to_string();

    let profile_id = Uuid::new_v4();

    state.db.create_account(
        &profile_id.to_string(),
        &email,
        &password_hash,
        profile_type,
        &display_name,
    )?;

    let token =
        create_token(&state.jwt_secret, profile_id, &email).map_err(|_| ApiError::internal())?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { profile_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();

    let account = state
        .db
        .get_account_by_email(&email)?
        .ok_or_else(ApiError::unauthorized)?;

    let parsed_hash = PasswordHash::new(&account.password).map_err(|_| ApiError::internal())?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthorized())?;

    let profile_id: Uuid = account.id.parse().map_err(|_| ApiError::internal())?;

    let token =
        create_token(&state.jwt_secret, profile_id, &account.email).map_err(|_| ApiError::internal())?;

    Ok(Json(LoginResponse {
        profile_id,
        email: account.email,
        token,
    }))
}

fn create_token(secret: &str, profile_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: profile_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn email_local_part(email: &str) -> Option<&str> {
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(local)
}

#[cfg(test)]
mod tests {
    use super::email_local_part;

    #[test]
    fn local_part_extraction() {
        assert_eq!(email_local_part("ella@example.com"), Some("ella"));
        assert_eq!(email_local_part("no-at-sign"), None);
        assert_eq!(email_local_part("@example.com"), None);
        assert_eq!(email_local_part("ella@"), None);
    }
}
