use rusqlite::{OptionalExtension, Row};
use stagelink_types::api::UpdateProfileRequest;

use crate::models::ProfileRow;
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

const PROFILE_COLS: &str =
    "id, email, profile_type, display_name, bio, website, phone, picture_url,
     location, role, social_links, created_at";

fn profile_from_row(row: &Row) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        email: row.get(1)?,
        profile_type: row.get(2)?,
        display_name: row.get(3)?,
        bio: row.get(4)?,
        website: row.get(5)?,
        phone: row.get(6)?,
        picture_url: row.get(7)?,
        location: row.get(8)?,
        role: row.get(9)?,
        social_links: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Database {
    pub fn get_profile(&self, id: &str) -> StoreResult<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {PROFILE_COLS} FROM profiles WHERE id = ?1"),
                    [id],
                    profile_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Partial update: absent fields keep their current value.
    pub fn update_profile(
        &self,
        requester: &str,
        profile_id: &str,
        req: &UpdateProfileRequest,
    ) -> StoreResult<ProfileRow> {
        let social_links = req.social_links.as_ref().map(|v| v.to_string());

        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::ProfileUpdate { profile_id })?;

            conn.execute(
                "UPDATE profiles SET
                    display_name = COALESCE(?2, display_name),
                    bio          = COALESCE(?3, bio),
                    website      = COALESCE(?4, website),
                    phone        = COALESCE(?5, phone),
                    picture_url  = COALESCE(?6, picture_url),
                    location     = COALESCE(?7, location),
                    role         = COALESCE(?8, role),
                    social_links = COALESCE(?9, social_links),
                    updated_at   = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    profile_id,
                    req.display_name,
                    req.bio,
                    req.website,
                    req.phone,
                    req.picture_url,
                    req.location,
                    req.role,
                    social_links,
                ],
            )?;

            conn.query_row(
                &format!("SELECT {PROFILE_COLS} FROM profiles WHERE id = ?1"),
                [profile_id],
                profile_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn changes() -> UpdateProfileRequest {
        UpdateProfileRequest {
            display_name: None,
            bio: Some("plays everything".into()),
            website: None,
            phone: None,
            picture_url: None,
            location: Some("Berlin".into()),
            role: None,
            social_links: None,
        }
    }

    #[test]
    fn partial_update_leaves_other_fields() {
        let db = testutil::db();
        let id = testutil::artist(&db, "mara");

        let updated = db.update_profile(&id, &id, &changes()).unwrap();
        assert_eq!(updated.display_name, "mara");
        assert_eq!(updated.bio.as_deref(), Some("plays everything"));
        assert_eq!(updated.location.as_deref(), Some("Berlin"));
        assert!(updated.website.is_none());
    }

    #[test]
    fn only_the_owner_can_update() {
        let db = testutil::db();
        let mara = testutil::artist(&db, "mara");
        let rival = testutil::artist(&db, "rival");

        let err = db.update_profile(&rival, &mara, &changes()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        // Untouched.
        let row = db.get_profile(&mara).unwrap().unwrap();
        assert!(row.bio.is_none());
    }
}
