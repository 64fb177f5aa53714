//! Central authorization gate. Every mutation names an [`Action`] and runs
//! [`check`] against the live connection before its own statement executes;
//! both happen under the same connection lock, so the predicate and the
//! write cannot be interleaved with another writer.
//!
//! Failure surface: an owner predicate failing on an existing row is
//! `NotFound` (indistinguishable from an absent row), while creation-time
//! gates (profile type, group membership) are `Forbidden`.

use rusqlite::{Connection, OptionalExtension};

use crate::{StoreError, StoreResult};

pub enum Action<'a> {
    ProfileUpdate { profile_id: &'a str },
    MediaCreate { owner_id: &'a str },
    MediaDelete { media_id: &'a str },
    VenueCreate,
    VenueUpdate { venue_id: &'a str },
    VenueDelete { venue_id: &'a str },
    JobCreate { venue_id: &'a str },
    JobUpdate { job_id: &'a str },
    JobDelete { job_id: &'a str },
    ApplicationCreate { job_id: &'a str, artist_id: &'a str },
    ApplicationsRead { job_id: &'a str },
    ApplicationDecide { application_id: &'a str },
    GroupCreate { created_by: &'a str },
    GroupUpdate { group_id: &'a str },
    GroupDelete { group_id: &'a str },
    MemberAdd { group_id: &'a str },
    MemberRemove { group_id: &'a str, member_id: &'a str },
    GroupApplicationCreate { job_id: &'a str, group_id: &'a str },
    GroupApplicationsRead { group_id: &'a str },
    GroupApplicationDecide { application_id: &'a str },
    MessageSend { sender_id: &'a str, receiver_id: &'a str },
}

pub fn check(conn: &Connection, requester: &str, action: &Action) -> StoreResult<()> {
    match action {
        Action::ProfileUpdate { profile_id } => owned_by(requester, profile_id),

        Action::MediaCreate { owner_id } => {
            if requester != *owner_id {
                return Err(StoreError::Forbidden("media owner must be the requester"));
            }
            Ok(())
        }
        Action::MediaDelete { media_id } => {
            let owner = media_owner(conn, media_id)?;
            owned_by(requester, &owner)
        }

        // Any authenticated identity may register a venue; mutations are
        // owner-only, and legacy unowned venues are immutable.
        Action::VenueCreate => Ok(()),
        Action::VenueUpdate { venue_id } | Action::VenueDelete { venue_id } => {
            match venue_owner(conn, venue_id)? {
                Some(owner) => owned_by(requester, &owner),
                None => Err(StoreError::NotFound),
            }
        }

        Action::JobCreate { venue_id } => {
            if requester != *venue_id {
                return Err(StoreError::Forbidden("job venue must be the requester"));
            }
            require_type(conn, requester, "venue", "only venue profiles can post jobs")
        }
        Action::JobUpdate { job_id } | Action::JobDelete { job_id } => {
            let owner = job_owner(conn, job_id)?;
            owned_by(requester, &owner)
        }

        Action::ApplicationCreate { job_id, artist_id } => {
            if requester != *artist_id {
                return Err(StoreError::Forbidden("applicant must be the requester"));
            }
            // Referenced job must exist before the row is attempted.
            job_owner(conn, job_id).map(|_| ())
        }
        Action::ApplicationsRead { job_id } => {
            let owner = job_owner(conn, job_id)?;
            owned_by(requester, &owner)
        }
        Action::ApplicationDecide { application_id } => {
            let owner: Option<String> = conn
                .query_row(
                    "SELECT j.venue_id FROM job_applications a
                     JOIN jobs j ON j.id = a.job_id
                     WHERE a.id = ?1",
                    [application_id],
                    |row| row.get(0),
                )
                .optional()?;
            owned_by(requester, &owner.ok_or(StoreError::NotFound)?)
        }

        Action::GroupCreate { created_by } => {
            if requester != *created_by {
                return Err(StoreError::Forbidden("group creator must be the requester"));
            }
            require_type(conn, requester, "artist", "only artist profiles can form groups")
        }
        Action::GroupUpdate { group_id } | Action::GroupDelete { group_id } => {
            let creator = group_creator(conn, group_id)?;
            owned_by(requester, &creator)
        }

        Action::MemberAdd { group_id } => {
            let creator = group_creator(conn, group_id)?;
            owned_by(requester, &creator)
        }
        Action::MemberRemove { group_id, member_id } => {
            let creator = group_creator(conn, group_id)?;
            if requester == creator || requester == *member_id {
                Ok(())
            } else {
                Err(StoreError::NotFound)
            }
        }

        Action::GroupApplicationCreate { job_id, group_id } => {
            group_creator(conn, group_id)?;
            if !is_member(conn, group_id, requester)? {
                return Err(StoreError::Forbidden("not a member of this group"));
            }
            job_owner(conn, job_id).map(|_| ())
        }
        Action::GroupApplicationsRead { group_id } => {
            group_creator(conn, group_id)?;
            if is_member(conn, group_id, requester)? {
                Ok(())
            } else {
                Err(StoreError::NotFound)
            }
        }
        Action::GroupApplicationDecide { application_id } => {
            let owner: Option<String> = conn
                .query_row(
                    "SELECT j.venue_id FROM group_job_applications a
                     JOIN jobs j ON j.id = a.job_id
                     WHERE a.id = ?1",
                    [application_id],
                    |row| row.get(0),
                )
                .optional()?;
            owned_by(requester, &owner.ok_or(StoreError::NotFound)?)
        }

        Action::MessageSend { sender_id, receiver_id } => {
            if requester != *sender_id {
                return Err(StoreError::Forbidden("sender must be the requester"));
            }
            if sender_id == receiver_id {
                return Err(StoreError::Invalid("receiver"));
            }
            if !profile_exists(conn, receiver_id)? {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }
    }
}

fn owned_by(requester: &str, owner: &str) -> StoreResult<()> {
    if requester == owner {
        Ok(())
    } else {
        Err(StoreError::NotFound)
    }
}

fn require_type(
    conn: &Connection,
    profile_id: &str,
    wanted: &str,
    denial: &'static str,
) -> StoreResult<()> {
    let kind: Option<String> = conn
        .query_row(
            "SELECT profile_type FROM profiles WHERE id = ?1",
            [profile_id],
            |row| row.get(0),
        )
        .optional()?;

    match kind {
        Some(k) if k == wanted => Ok(()),
        Some(_) => Err(StoreError::Forbidden(denial)),
        None => Err(StoreError::NotFound),
    }
}

fn profile_exists(conn: &Connection, id: &str) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM profiles WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn media_owner(conn: &Connection, media_id: &str) -> StoreResult<String> {
    conn.query_row(
        "SELECT profile_id FROM media_items WHERE id = ?1",
        [media_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

fn venue_owner(conn: &Connection, venue_id: &str) -> StoreResult<Option<String>> {
    conn.query_row(
        "SELECT owner_id FROM venues WHERE id = ?1",
        [venue_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

pub(crate) fn job_owner(conn: &Connection, job_id: &str) -> StoreResult<String> {
    conn.query_row(
        "SELECT venue_id FROM jobs WHERE id = ?1",
        [job_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

pub(crate) fn group_creator(conn: &Connection, group_id: &str) -> StoreResult<String> {
    conn.query_row(
        "SELECT created_by FROM groups WHERE id = ?1",
        [group_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

pub(crate) fn is_member(conn: &Connection, group_id: &str, profile_id: &str) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM group_members WHERE group_id = ?1 AND profile_id = ?2",
            [group_id, profile_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
