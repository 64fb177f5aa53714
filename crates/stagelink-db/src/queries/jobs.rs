use rusqlite::{OptionalExtension, Row};
use stagelink_types::api::{CreateJobRequest, UpdateJobRequest};
use stagelink_types::models::JobStatus;

use crate::models::JobRow;
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

const JOB_COLS: &str =
    "id, venue_id, title, description, genre, event_date, location, pay_range,
     requirements, contact_info, status, created_at";

fn job_from_row(row: &Row) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        genre: row.get(4)?,
        event_date: row.get(5)?,
        location: row.get(6)?,
        pay_range: row.get(7)?,
        requirements: row.get(8)?,
        contact_info: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Database {
    /// Only venue-type profiles post jobs; the gate also pins the owning
    /// venue id to the requester.
    pub fn create_job(
        &self,
        id: &str,
        requester: &str,
        venue_id: &str,
        req: &CreateJobRequest,
    ) -> StoreResult<JobRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::JobCreate { venue_id })?;

            conn.execute(
                "INSERT INTO jobs (id, venue_id, title, description, genre, event_date,
                                   location, pay_range, requirements, contact_info)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    id,
                    venue_id,
                    req.title,
                    req.description,
                    req.genre,
                    req.event_date,
                    req.location,
                    req.pay_range,
                    req.requirements,
                    req.contact_info,
                ],
            )?;

            get_job_inner(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    /// The public board, newest first, optionally narrowed by status/genre.
    pub fn list_jobs(
        &self,
        status: Option<JobStatus>,
        genre: Option<&str>,
    ) -> StoreResult<Vec<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLS} FROM jobs
                 WHERE (?1 IS NULL OR status = ?1)
                   AND (?2 IS NULL OR genre = ?2)
                 ORDER BY created_at DESC, rowid DESC"
            ))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![status.map(|s| s.as_str()), genre],
                    job_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_job(&self, id: &str) -> StoreResult<Option<JobRow>> {
        self.with_conn(|conn| get_job_inner(conn, id))
    }

    pub fn update_job(
        &self,
        requester: &str,
        job_id: &str,
        req: &UpdateJobRequest,
    ) -> StoreResult<JobRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::JobUpdate { job_id })?;

            conn.execute(
                "UPDATE jobs SET
                    title        = COALESCE(?2, title),
                    description  = COALESCE(?3, description),
                    genre        = COALESCE(?4, genre),
                    event_date   = COALESCE(?5, event_date),
                    location     = COALESCE(?6, location),
                    pay_range    = COALESCE(?7, pay_range),
                    requirements = COALESCE(?8, requirements),
                    contact_info = COALESCE(?9, contact_info),
                    status       = COALESCE(?10, status)
                 WHERE id = ?1",
                rusqlite::params![
                    job_id,
                    req.title,
                    req.description,
                    req.genre,
                    req.event_date,
                    req.location,
                    req.pay_range,
                    req.requirements,
                    req.contact_info,
                    req.status.map(|s| s.as_str()),
                ],
            )?;

            get_job_inner(conn, job_id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn delete_job(&self, requester: &str, job_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::JobDelete { job_id })?;
            conn.execute("DELETE FROM jobs WHERE id = ?1", [job_id])?;
            Ok(())
        })
    }
}

fn get_job_inner(conn: &rusqlite::Connection, id: &str) -> StoreResult<Option<JobRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {JOB_COLS} FROM jobs WHERE id = ?1"),
            [id],
            job_from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testutil;
    use crate::Database;
    use uuid::Uuid;

    pub(crate) fn gig(title: &str) -> CreateJobRequest {
        CreateJobRequest {
            title: title.into(),
            description: "two sets, house PA".into(),
            genre: "jazz".into(),
            event_date: "2026-09-18".into(),
            location: "Amsterdam".into(),
            pay_range: Some("€300-400".into()),
            requirements: None,
            contact_info: None,
        }
    }

    pub(crate) fn post_job(db: &Database, venue: &str, title: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_job(&id, venue, venue, &gig(title)).unwrap();
        id
    }

    #[test]
    fn artists_cannot_post_jobs() {
        let db = testutil::db();
        let ella = testutil::artist(&db, "ella");

        let err = db
            .create_job(&Uuid::new_v4().to_string(), &ella, &ella, &gig("Friday night"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn venue_posts_updates_and_fills() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        let job_id = post_job(&db, &hall, "Friday night jazz");

        let open = db.list_jobs(Some(JobStatus::Open), None).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "Friday night jazz");

        let req = UpdateJobRequest {
            title: None,
            description: None,
            genre: None,
            event_date: None,
            location: None,
            pay_range: None,
            requirements: None,
            contact_info: None,
            status: Some(JobStatus::Filled),
        };
        let updated = db.update_job(&hall, &job_id, &req).unwrap();
        assert_eq!(updated.status, "filled");

        assert!(db.list_jobs(Some(JobStatus::Open), None).unwrap().is_empty());
    }

    #[test]
    fn mutations_are_owner_only() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        let rival = testutil::venue(&db, "rival");
        let job_id = post_job(&db, &hall, "Friday night jazz");

        assert!(matches!(
            db.delete_job(&rival, &job_id).unwrap_err(),
            StoreError::NotFound
        ));
        db.delete_job(&hall, &job_id).unwrap();
        assert!(db.get_job(&job_id).unwrap().is_none());
    }

    #[test]
    fn genre_filter_narrows_the_board() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        post_job(&db, &hall, "Jazz night");
        let mut rock = gig("Rock night");
        rock.genre = "rock".into();
        db.create_job(&Uuid::new_v4().to_string(), &hall, &hall, &rock)
            .unwrap();

        let rock_only = db.list_jobs(None, Some("rock")).unwrap();
        assert_eq!(rock_only.len(), 1);
        assert_eq!(rock_only[0].title, "Rock night");
    }
}
