use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ApplicationStatus, JobStatus, MediaType, ProfileType};

// -- JWT Claims --

/// Bearer-token claims. Canonical definition lives here so the REST
/// middleware and the auth handlers share one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Defaults to `artist` when omitted.
    pub profile_type: Option<ProfileType>,
    /// Defaults to the email's local part when omitted.
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub profile_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub profile_id: Uuid,
    pub email: String,
    pub token: String,
}

// -- Profiles --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub profile_type: ProfileType,
    pub display_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub picture_url: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub social_links: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Partial update: only provided fields change.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub picture_url: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub social_links: Option<serde_json::Value>,
}

// -- Media --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMediaRequest {
    pub media_type: MediaType,
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub media_type: MediaType,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Venues --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVenueRequest {
    pub name: String,
    pub genre: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVenueRequest {
    pub name: Option<String>,
    pub genre: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VenueResponse {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub genre: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub capacity: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// -- Jobs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub event_date: String,
    pub location: String,
    pub pay_range: Option<String>,
    pub requirements: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub event_date: Option<String>,
    pub location: Option<String>,
    pub pay_range: Option<String>,
    pub requirements: Option<String>,
    pub contact_info: Option<String>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub event_date: String,
    pub location: String,
    pub pay_range: Option<String>,
    pub requirements: Option<String>,
    pub contact_info: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

// -- Applications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub artist_id: Uuid,
    pub artist_name: String,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecideRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupApplyRequest {
    pub group_id: Uuid,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub group_id: Uuid,
    pub group_name: String,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// A venue's review screen: solo and group applications for one job.
#[derive(Debug, Serialize)]
pub struct JobApplicationsResponse {
    pub applications: Vec<ApplicationResponse>,
    pub group_applications: Vec<GroupApplicationResponse>,
}

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    /// The creator's own role label, e.g. "guitarist". Defaults to "member".
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMemberRequest {
    pub profile_id: Uuid,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub profile_id: Uuid,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// -- Messaging --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub partner_type: ProfileType,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}
