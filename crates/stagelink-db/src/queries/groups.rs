use rusqlite::{OptionalExtension, Row};
use stagelink_types::api::{CreateGroupRequest, UpdateGroupRequest};
use uuid::Uuid;

use crate::models::{GroupRow, MemberRow};
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

const GROUP_COLS: &str = "id, name, description, genre, created_by, created_at";

fn group_from_row(row: &Row) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        genre: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn member_from_row(row: &Row) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        profile_id: row.get(2)?,
        display_name: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    /// Only artist-type profiles form groups. The creator's membership row is
    /// a separate follow-up statement (see [`Database::ensure_membership`]);
    /// a group without it is a valid, recoverable state.
    pub fn create_group(
        &self,
        id: &str,
        requester: &str,
        created_by: &str,
        req: &CreateGroupRequest,
    ) -> StoreResult<GroupRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::GroupCreate { created_by })?;

            conn.execute(
                "INSERT INTO groups (id, name, description, genre, created_by)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, req.name, req.description, req.genre, created_by],
            )?;

            get_group_inner(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    /// Idempotent repair: inserts the membership if it is missing, does
    /// nothing if it already exists. Used to close the two-step
    /// group-creation gap.
    pub fn ensure_membership(
        &self,
        group_id: &str,
        profile_id: &str,
        role: &str,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO group_members (id, group_id, profile_id, role)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![Uuid::new_v4().to_string(), group_id, profile_id, role],
            )?;
            Ok(())
        })
    }

    pub fn list_groups(&self) -> StoreResult<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {GROUP_COLS} FROM groups ORDER BY name"))?;
            let rows = stmt
                .query_map([], group_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_group(&self, id: &str) -> StoreResult<Option<GroupRow>> {
        self.with_conn(|conn| get_group_inner(conn, id))
    }

    pub fn update_group(
        &self,
        requester: &str,
        group_id: &str,
        req: &UpdateGroupRequest,
    ) -> StoreResult<GroupRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::GroupUpdate { group_id })?;

            conn.execute(
                "UPDATE groups SET
                    name        = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    genre       = COALESCE(?4, genre)
                 WHERE id = ?1",
                rusqlite::params![group_id, req.name, req.description, req.genre],
            )?;

            get_group_inner(conn, group_id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn delete_group(&self, requester: &str, group_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::GroupDelete { group_id })?;
            conn.execute("DELETE FROM groups WHERE id = ?1", [group_id])?;
            Ok(())
        })
    }

    pub fn add_member(
        &self,
        id: &str,
        requester: &str,
        group_id: &str,
        profile_id: &str,
        role: &str,
    ) -> StoreResult<MemberRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::MemberAdd { group_id })?;

            conn.execute(
                "INSERT INTO group_members (id, group_id, profile_id, role)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, group_id, profile_id, role],
            )
            .map_err(|e| StoreError::from(e).on_conflict("already a member of this group"))?;

            conn.query_row(
                "SELECT m.id, m.group_id, m.profile_id, p.display_name, m.role, m.created_at
                 FROM group_members m
                 JOIN profiles p ON p.id = m.profile_id
                 WHERE m.id = ?1",
                [id],
                member_from_row,
            )
            .map_err(StoreError::from)
        })
    }

    /// The creator removes anyone; a member removes themself.
    pub fn remove_member(
        &self,
        requester: &str,
        group_id: &str,
        profile_id: &str,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            policy::check(
                conn,
                requester,
                &Action::MemberRemove {
                    group_id,
                    member_id: profile_id,
                },
            )?;

            let removed = conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND profile_id = ?2",
                [group_id, profile_id],
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    pub fn members_of(&self, group_id: &str) -> StoreResult<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.group_id, m.profile_id, p.display_name, m.role, m.created_at
                 FROM group_members m
                 JOIN profiles p ON p.id = m.profile_id
                 WHERE m.group_id = ?1
                 ORDER BY m.created_at, m.rowid",
            )?;
            let rows = stmt
                .query_map([group_id], member_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn get_group_inner(conn: &rusqlite::Connection, id: &str) -> StoreResult<Option<GroupRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {GROUP_COLS} FROM groups WHERE id = ?1"),
            [id],
            group_from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn owls() -> CreateGroupRequest {
        CreateGroupRequest {
            name: "The Night Owls".into(),
            description: Some("late sets only".into()),
            genre: Some("jazz".into()),
            role: Some("guitarist".into()),
        }
    }

    #[test]
    fn venues_cannot_form_groups() {
        let db = testutil::db();
        let hall = testutil::venue(&db, "hall");

        let err = db
            .create_group(&Uuid::new_v4().to_string(), &hall, &hall, &owls())
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn creator_membership_repair_is_idempotent() {
        let db = testutil::db();
        let cleo = testutil::artist(&db, "cleo");
        let gid = Uuid::new_v4().to_string();
        db.create_group(&gid, &cleo, &cleo, &owls()).unwrap();

        // The group exists before any membership row does.
        assert!(db.members_of(&gid).unwrap().is_empty());

        db.ensure_membership(&gid, &cleo, "guitarist").unwrap();
        db.ensure_membership(&gid, &cleo, "guitarist").unwrap();

        let members = db.members_of(&gid).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, "guitarist");
    }

    #[test]
    fn member_may_leave_creator_may_remove_anyone() {
        let db = testutil::db();
        let cleo = testutil::artist(&db, "cleo");
        let miles = testutil::artist(&db, "miles");
        let stranger = testutil::artist(&db, "stranger");
        let gid = Uuid::new_v4().to_string();
        db.create_group(&gid, &cleo, &cleo, &owls()).unwrap();
        db.ensure_membership(&gid, &cleo, "guitarist").unwrap();
        db.add_member(&Uuid::new_v4().to_string(), &cleo, &gid, &miles, "drummer")
            .unwrap();

        // A third party may not add or remove members.
        assert!(matches!(
            db.add_member(&Uuid::new_v4().to_string(), &miles, &gid, &stranger, "bass")
                .unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            db.remove_member(&stranger, &gid, &miles).unwrap_err(),
            StoreError::NotFound
        ));

        // Self-removal.
        db.remove_member(&miles, &gid, &miles).unwrap();
        let members = db.members_of(&gid).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].profile_id, cleo);
        assert!(db.get_group(&gid).unwrap().is_some());
    }

    #[test]
    fn duplicate_membership_is_a_conflict() {
        let db = testutil::db();
        let cleo = testutil::artist(&db, "cleo");
        let miles = testutil::artist(&db, "miles");
        let gid = Uuid::new_v4().to_string();
        db.create_group(&gid, &cleo, &cleo, &owls()).unwrap();
        db.add_member(&Uuid::new_v4().to_string(), &cleo, &gid, &miles, "drummer")
            .unwrap();

        let err = db
            .add_member(&Uuid::new_v4().to_string(), &cleo, &gid, &miles, "drummer")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg == "already a member of this group"));
        assert_eq!(db.members_of(&gid).unwrap().len(), 1);
    }

    #[test]
    fn only_the_creator_mutates_the_group() {
        let db = testutil::db();
        let cleo = testutil::artist(&db, "cleo");
        let miles = testutil::artist(&db, "miles");
        let gid = Uuid::new_v4().to_string();
        db.create_group(&gid, &cleo, &cleo, &owls()).unwrap();

        let req = UpdateGroupRequest {
            name: Some("The Early Birds".into()),
            description: None,
            genre: None,
        };
        assert!(matches!(
            db.update_group(&miles, &gid, &req).unwrap_err(),
            StoreError::NotFound
        ));

        let updated = db.update_group(&cleo, &gid, &req).unwrap();
        assert_eq!(updated.name, "The Early Birds");
        assert_eq!(updated.description.as_deref(), Some("late sets only"));

        assert!(matches!(
            db.delete_group(&miles, &gid).unwrap_err(),
            StoreError::NotFound
        ));
        db.delete_group(&cleo, &gid).unwrap();
        assert!(db.get_group(&gid).unwrap().is_none());
    }
}
