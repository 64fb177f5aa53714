//! Database row types that map directly to SQLite rows.
//! Distinct from the stagelink-types API models to keep the DB layer
//! independent; ids and timestamps stay TEXT here and are parsed at the
//! API boundary.

#[derive(Debug)]
pub struct AccountRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub profile_type: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub picture_url: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub social_links: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct MediaRow {
    pub id: String,
    pub profile_id: String,
    pub media_type: String,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct VenueRow {
    pub id: String,
    pub owner_id: Option<String>,
    pub name: String,
    pub genre: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub capacity: Option<i64>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct JobRow {
    pub id: String,
    pub venue_id: String,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub event_date: String,
    pub location: String,
    pub pay_range: Option<String>,
    pub requirements: Option<String>,
    pub contact_info: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// Joined with jobs and profiles so list screens render in one query.
#[derive(Debug)]
pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct MemberRow {
    pub id: String,
    pub group_id: String,
    pub profile_id: String,
    pub display_name: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct GroupApplicationRow {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub group_id: String,
    pub group_name: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

/// One line of the derived conversation list. Never stored.
#[derive(Debug)]
pub struct ConversationRow {
    pub partner_id: String,
    pub partner_name: String,
    pub partner_type: String,
    pub last_message: String,
    pub last_message_at: String,
    pub unread_count: i64,
}
