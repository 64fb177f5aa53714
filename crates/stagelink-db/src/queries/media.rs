use rusqlite::Row;
use stagelink_types::api::CreateMediaRequest;

use crate::models::MediaRow;
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

fn media_from_row(row: &Row) -> rusqlite::Result<MediaRow> {
    Ok(MediaRow {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        media_type: row.get(2)?,
        url: row.get(3)?,
        caption: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    pub fn create_media(
        &self,
        id: &str,
        requester: &str,
        owner_id: &str,
        req: &CreateMediaRequest,
    ) -> StoreResult<MediaRow> {
        if req.url.trim().is_empty() {
            return Err(StoreError::Invalid("url"));
        }

        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::MediaCreate { owner_id })?;

            conn.execute(
                "INSERT INTO media_items (id, profile_id, media_type, url, caption)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, owner_id, req.media_type.as_str(), req.url, req.caption],
            )?;

            conn.query_row(
                "SELECT id, profile_id, media_type, url, caption, created_at
                 FROM media_items WHERE id = ?1",
                [id],
                media_from_row,
            )
            .map_err(StoreError::from)
        })
    }

    /// Publicly readable, newest first.
    pub fn list_media_for(&self, profile_id: &str) -> StoreResult<Vec<MediaRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, profile_id, media_type, url, caption, created_at
                 FROM media_items
                 WHERE profile_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([profile_id], media_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_media(&self, requester: &str, media_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::MediaDelete { media_id })?;
            conn.execute("DELETE FROM media_items WHERE id = ?1", [media_id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use stagelink_types::models::MediaType;
    use uuid::Uuid;

    fn clip(url: &str) -> CreateMediaRequest {
        CreateMediaRequest {
            media_type: MediaType::Audio,
            url: url.into(),
            caption: None,
        }
    }

    #[test]
    fn owner_posts_and_lists_newest_first() {
        let db = testutil::db();
        let ella = testutil::artist(&db, "ella");

        for url in ["https://cdn.test/one.mp3", "https://cdn.test/two.mp3"] {
            db.create_media(&Uuid::new_v4().to_string(), &ella, &ella, &clip(url))
                .unwrap();
        }

        let items = db.list_media_for(&ella).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://cdn.test/two.mp3");
    }

    #[test]
    fn cannot_post_media_for_someone_else() {
        let db = testutil::db();
        let ella = testutil::artist(&db, "ella");
        let imposter = testutil::artist(&db, "imposter");

        let err = db
            .create_media(
                &Uuid::new_v4().to_string(),
                &imposter,
                &ella,
                &clip("https://cdn.test/fake.mp3"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn only_the_owner_deletes() {
        let db = testutil::db();
        let ella = testutil::artist(&db, "ella");
        let other = testutil::artist(&db, "other");
        let id = Uuid::new_v4().to_string();
        db.create_media(&id, &ella, &ella, &clip("https://cdn.test/x.mp3"))
            .unwrap();

        assert!(matches!(
            db.delete_media(&other, &id).unwrap_err(),
            StoreError::NotFound
        ));

        db.delete_media(&ella, &id).unwrap();
        assert!(db.list_media_for(&ella).unwrap().is_empty());
    }
}
