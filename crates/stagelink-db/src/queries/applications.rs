use rusqlite::{Connection, OptionalExtension, Row};
use stagelink_types::models::ApplicationStatus;

use crate::models::{ApplicationRow, GroupApplicationRow};
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

const APPLICATION_SELECT: &str =
    "SELECT a.id, a.job_id, j.title, a.artist_id, p.display_name, a.message,
            a.status, a.created_at
     FROM job_applications a
     JOIN jobs j ON j.id = a.job_id
     JOIN profiles p ON p.id = a.artist_id";

const GROUP_APPLICATION_SELECT: &str =
    "SELECT a.id, a.job_id, j.title, a.group_id, g.name, a.message,
            a.status, a.created_at
     FROM group_job_applications a
     JOIN jobs j ON j.id = a.job_id
     JOIN groups g ON g.id = a.group_id";

fn application_from_row(row: &Row) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_title: row.get(2)?,
        artist_id: row.get(3)?,
        artist_name: row.get(4)?,
        message: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn group_application_from_row(row: &Row) -> rusqlite::Result<GroupApplicationRow> {
    Ok(GroupApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_title: row.get(2)?,
        group_id: row.get(3)?,
        group_name: row.get(4)?,
        message: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl Database {
    // -- Solo applications --

    pub fn apply_to_job(
        &self,
        id: &str,
        requester: &str,
        job_id: &str,
        artist_id: &str,
        message: Option<&str>,
    ) -> StoreResult<ApplicationRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::ApplicationCreate { job_id, artist_id })?;

            conn.execute(
                "INSERT INTO job_applications (id, job_id, artist_id, message)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, job_id, artist_id, message],
            )
            .map_err(|e| StoreError::from(e).on_conflict("already applied to this job"))?;

            get_application(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    /// The owning venue's view of a job's solo applications.
    pub fn applications_for_job(
        &self,
        requester: &str,
        job_id: &str,
    ) -> StoreResult<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::ApplicationsRead { job_id })?;

            let mut stmt = conn.prepare(&format!(
                "{APPLICATION_SELECT} WHERE a.job_id = ?1 ORDER BY a.created_at, a.rowid"
            ))?;
            let rows = stmt
                .query_map([job_id], application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// An applicant's own applications; scoped by construction, no gate.
    pub fn my_applications(&self, requester: &str) -> StoreResult<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{APPLICATION_SELECT} WHERE a.artist_id = ?1
                 ORDER BY a.created_at DESC, a.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([requester], application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Status decision by the owning venue. Re-asserting the current status
    /// is an idempotent no-op; no other transition guard exists.
    pub fn decide_application(
        &self,
        requester: &str,
        application_id: &str,
        status: ApplicationStatus,
    ) -> StoreResult<ApplicationRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::ApplicationDecide { application_id })?;

            let current: String = conn.query_row(
                "SELECT status FROM job_applications WHERE id = ?1",
                [application_id],
                |row| row.get(0),
            )?;

            if current != status.as_str() {
                conn.execute(
                    "UPDATE job_applications SET status = ?2 WHERE id = ?1",
                    rusqlite::params![application_id, status.as_str()],
                )?;
            }

            get_application(conn, application_id)?.ok_or(StoreError::NotFound)
        })
    }

    // -- Group applications --

    pub fn apply_as_group(
        &self,
        id: &str,
        requester: &str,
        job_id: &str,
        group_id: &str,
        message: Option<&str>,
    ) -> StoreResult<GroupApplicationRow> {
        self.with_conn(|conn| {
            policy::check(
                conn,
                requester,
                &Action::GroupApplicationCreate { job_id, group_id },
            )?;

            conn.execute(
                "INSERT INTO group_job_applications (id, job_id, group_id, message)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, job_id, group_id, message],
            )
            .map_err(|e| {
                StoreError::from(e).on_conflict("this group has already applied to this job")
            })?;

            get_group_application(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn group_applications_for_job(
        &self,
        requester: &str,
        job_id: &str,
    ) -> StoreResult<Vec<GroupApplicationRow>> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::ApplicationsRead { job_id })?;

            let mut stmt = conn.prepare(&format!(
                "{GROUP_APPLICATION_SELECT} WHERE a.job_id = ?1 ORDER BY a.created_at, a.rowid"
            ))?;
            let rows = stmt
                .query_map([job_id], group_application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// A group's own applications, visible to its members.
    pub fn applications_for_group(
        &self,
        requester: &str,
        group_id: &str,
    ) -> StoreResult<Vec<GroupApplicationRow>> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::GroupApplicationsRead { group_id })?;

            let mut stmt = conn.prepare(&format!(
                "{GROUP_APPLICATION_SELECT} WHERE a.group_id = ?1
                 ORDER BY a.created_at DESC, a.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([group_id], group_application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn decide_group_application(
        &self,
        requester: &str,
        application_id: &str,
        status: ApplicationStatus,
    ) -> StoreResult<GroupApplicationRow> {
        self.with_conn(|conn| {
            policy::check(
                conn,
                requester,
                &Action::GroupApplicationDecide { application_id },
            )?;

            let current: String = conn.query_row(
                "SELECT status FROM group_job_applications WHERE id = ?1",
                [application_id],
                |row| row.get(0),
            )?;

            if current != status.as_str() {
                conn.execute(
                    "UPDATE group_job_applications SET status = ?2 WHERE id = ?1",
                    rusqlite::params![application_id, status.as_str()],
                )?;
            }

            get_group_application(conn, application_id)?.ok_or(StoreError::NotFound)
        })
    }
}

fn get_application(conn: &Connection, id: &str) -> StoreResult<Option<ApplicationRow>> {
    let row = conn
        .query_row(
            &format!("{APPLICATION_SELECT} WHERE a.id = ?1"),
            [id],
            application_from_row,
        )
        .optional()?;
    Ok(row)
}

fn get_group_application(conn: &Connection, id: &str) -> StoreResult<Option<GroupApplicationRow>> {
    let row = conn
        .query_row(
            &format!("{GROUP_APPLICATION_SELECT} WHERE a.id = ?1"),
            [id],
            group_application_from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::jobs::tests::post_job;
    use crate::testutil;
    use stagelink_types::api::CreateGroupRequest;
    use uuid::Uuid;

    fn band(db: &crate::Database, creator: &str, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_group(
            &id,
            creator,
            creator,
            &CreateGroupRequest {
                name: name.into(),
                description: None,
                genre: None,
                role: None,
            },
        )
        .unwrap();
        db.ensure_membership(&id, creator, "member").unwrap();
        id
    }

    #[test]
    fn second_application_for_same_pair_fails() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        let ella = testutil::artist(&db, "ella");
        let job = post_job(&db, &hall, "Friday night");

        db.apply_to_job(&Uuid::new_v4().to_string(), &ella, &job, &ella, Some("pick me"))
            .unwrap();

        let err = db
            .apply_to_job(&Uuid::new_v4().to_string(), &ella, &job, &ella, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg == "already applied to this job"));

        // Exactly one row survives.
        assert_eq!(db.applications_for_job(&hall, &job).unwrap().len(), 1);
    }

    #[test]
    fn applications_are_visible_to_applicant_and_venue_only() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        let ella = testutil::artist(&db, "ella");
        let stranger = testutil::artist(&db, "stranger");
        let job = post_job(&db, &hall, "Friday night");

        db.apply_to_job(&Uuid::new_v4().to_string(), &ella, &job, &ella, None)
            .unwrap();

        assert_eq!(db.my_applications(&ella).unwrap().len(), 1);
        assert_eq!(db.applications_for_job(&hall, &job).unwrap().len(), 1);

        assert!(matches!(
            db.applications_for_job(&stranger, &job).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(db.my_applications(&stranger).unwrap().is_empty());
    }

    #[test]
    fn only_the_venue_decides_and_redeciding_is_a_noop() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        let ella = testutil::artist(&db, "ella");
        let job = post_job(&db, &hall, "Friday night");
        let app_id = Uuid::new_v4().to_string();
        db.apply_to_job(&app_id, &ella, &job, &ella, None).unwrap();

        assert!(matches!(
            db.decide_application(&ella, &app_id, ApplicationStatus::Accepted)
                .unwrap_err(),
            StoreError::NotFound
        ));

        let decided = db
            .decide_application(&hall, &app_id, ApplicationStatus::Accepted)
            .unwrap();
        assert_eq!(decided.status, "accepted");

        let again = db
            .decide_application(&hall, &app_id, ApplicationStatus::Accepted)
            .unwrap();
        assert_eq!(again.status, "accepted");

        // Acceptance does not free the (job, artist) pair.
        let err = db
            .apply_to_job(&Uuid::new_v4().to_string(), &ella, &job, &ella, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn group_applications_follow_the_same_rules() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");
        let ella = testutil::artist(&db, "ella");
        let outsider = testutil::artist(&db, "outsider");
        let job = post_job(&db, &hall, "Friday night");
        let group = band(&db, &ella, "The Night Owls");

        assert!(matches!(
            db.apply_as_group(&Uuid::new_v4().to_string(), &outsider, &job, &group, None)
                .unwrap_err(),
            StoreError::Forbidden(_)
        ));

        let app_id = Uuid::new_v4().to_string();
        let app = db
            .apply_as_group(&app_id, &ella, &job, &group, Some("full band available"))
            .unwrap();
        assert_eq!(app.group_name, "The Night Owls");
        assert_eq!(app.status, "pending");

        let err = db
            .apply_as_group(&Uuid::new_v4().to_string(), &ella, &job, &group, None)
            .unwrap_err();
        assert!(
            matches!(err, StoreError::Conflict(msg) if msg == "this group has already applied to this job")
        );

        let decided = db
            .decide_group_application(&hall, &app_id, ApplicationStatus::Rejected)
            .unwrap();
        assert_eq!(decided.status, "rejected");

        // Members see the group's applications; the venue sees them per job.
        assert_eq!(db.applications_for_group(&ella, &group).unwrap().len(), 1);
        assert_eq!(db.group_applications_for_job(&hall, &job).unwrap().len(), 1);
        assert!(matches!(
            db.applications_for_group(&outsider, &group).unwrap_err(),
            StoreError::NotFound
        ));
    }
}
