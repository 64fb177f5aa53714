pub mod applications;
pub mod auth;
pub mod error;
pub mod groups;
pub mod jobs;
pub mod media;
pub mod messages;
pub mod middleware;
pub mod profiles;
pub mod venues;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Rows carry TEXT ids; a corrupt one is logged and rendered as the nil
/// uuid rather than failing the whole response.
pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_created_at(raw: &str, what: &str, id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} '{}': {}", raw, what, id, e);
            DateTime::default()
        })
}

pub(crate) fn parse_enum<T: FromStr + Copy>(raw: &str, what: &str, fallback: T) -> T {
    raw.parse().unwrap_or_else(|_| {
        warn!("Corrupt {} '{}'", what, raw);
        fallback
    })
}
