use rusqlite::{OptionalExtension, Row};
use stagelink_types::api::{CreateVenueRequest, UpdateVenueRequest};

use crate::models::VenueRow;
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

const VENUE_COLS: &str =
    "id, owner_id, name, genre, address, latitude, longitude, description,
     website, phone, capacity, created_at";

fn venue_from_row(row: &Row) -> rusqlite::Result<VenueRow> {
    Ok(VenueRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        genre: row.get(3)?,
        address: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        description: row.get(7)?,
        website: row.get(8)?,
        phone: row.get(9)?,
        capacity: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Database {
    pub fn create_venue(
        &self,
        id: &str,
        requester: &str,
        req: &CreateVenueRequest,
    ) -> StoreResult<VenueRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::VenueCreate)?;

            conn.execute(
                "INSERT INTO venues (id, owner_id, name, genre, address, latitude,
                                     longitude, description, website, phone, capacity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    id,
                    requester,
                    req.name,
                    req.genre,
                    req.address,
                    req.latitude,
                    req.longitude,
                    req.description,
                    req.website,
                    req.phone,
                    req.capacity,
                ],
            )?;

            get_venue_inner(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    /// The public directory, small enough to return whole for the map screen.
    pub fn list_venues(&self) -> StoreResult<Vec<VenueRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {VENUE_COLS} FROM venues ORDER BY name"))?;
            let rows = stmt
                .query_map([], venue_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_venue(&self, id: &str) -> StoreResult<Option<VenueRow>> {
        self.with_conn(|conn| get_venue_inner(conn, id))
    }

    pub fn update_venue(
        &self,
        requester: &str,
        venue_id: &str,
        req: &UpdateVenueRequest,
    ) -> StoreResult<VenueRow> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::VenueUpdate { venue_id })?;

            conn.execute(
                "UPDATE venues SET
                    name        = COALESCE(?2, name),
                    genre       = COALESCE(?3, genre),
                    address     = COALESCE(?4, address),
                    latitude    = COALESCE(?5, latitude),
                    longitude   = COALESCE(?6, longitude),
                    description = COALESCE(?7, description),
                    website     = COALESCE(?8, website),
                    phone       = COALESCE(?9, phone),
                    capacity    = COALESCE(?10, capacity)
                 WHERE id = ?1",
                rusqlite::params![
                    venue_id,
                    req.name,
                    req.genre,
                    req.address,
                    req.latitude,
                    req.longitude,
                    req.description,
                    req.website,
                    req.phone,
                    req.capacity,
                ],
            )?;

            get_venue_inner(conn, venue_id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn delete_venue(&self, requester: &str, venue_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            policy::check(conn, requester, &Action::VenueDelete { venue_id })?;
            conn.execute("DELETE FROM venues WHERE id = ?1", [venue_id])?;
            Ok(())
        })
    }
}

fn get_venue_inner(conn: &rusqlite::Connection, id: &str) -> StoreResult<Option<VenueRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {VENUE_COLS} FROM venues WHERE id = ?1"),
            [id],
            venue_from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use uuid::Uuid;

    fn hall() -> CreateVenueRequest {
        CreateVenueRequest {
            name: "The Velvet Hall".into(),
            genre: "jazz".into(),
            address: "12 Canal St".into(),
            latitude: 52.37,
            longitude: 4.89,
            description: None,
            website: None,
            phone: None,
            capacity: Some(250),
        }
    }

    #[test]
    fn any_authenticated_profile_may_register_a_venue() {
        let db = testutil::db();
        let ella = testutil::artist(&db, "ella");
        let id = Uuid::new_v4().to_string();

        let venue = db.create_venue(&id, &ella, &hall()).unwrap();
        assert_eq!(venue.owner_id.as_deref(), Some(ella.as_str()));
        assert_eq!(db.list_venues().unwrap().len(), 1);
    }

    #[test]
    fn updates_are_owner_only() {
        let db = testutil::db();
        let owner = testutil::venue(&db, "owner");
        let other = testutil::venue(&db, "other");
        let id = Uuid::new_v4().to_string();
        db.create_venue(&id, &owner, &hall()).unwrap();

        let mut req = UpdateVenueRequest {
            name: Some("The Velvet Room".into()),
            genre: None,
            address: None,
            latitude: None,
            longitude: None,
            description: None,
            website: None,
            phone: None,
            capacity: None,
        };

        assert!(matches!(
            db.update_venue(&other, &id, &req).unwrap_err(),
            StoreError::NotFound
        ));

        req.capacity = Some(300);
        let updated = db.update_venue(&owner, &id, &req).unwrap();
        assert_eq!(updated.name, "The Velvet Room");
        assert_eq!(updated.capacity, Some(300));
        assert_eq!(updated.address, "12 Canal St");
    }

    #[test]
    fn legacy_unowned_venues_are_immutable() {
        let db = testutil::db();
        let anyone = testutil::venue(&db, "anyone");

        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO venues (id, owner_id, name, genre, address, latitude, longitude)
                 VALUES ('legacy', NULL, 'Old Mill', 'folk', '1 Mill Rd', 51.0, 3.7)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let req = UpdateVenueRequest {
            name: Some("New Mill".into()),
            genre: None,
            address: None,
            latitude: None,
            longitude: None,
            description: None,
            website: None,
            phone: None,
            capacity: None,
        };
        assert!(matches!(
            db.update_venue(&anyone, "legacy", &req).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            db.delete_venue(&anyone, "legacy").unwrap_err(),
            StoreError::NotFound
        ));
    }
}
