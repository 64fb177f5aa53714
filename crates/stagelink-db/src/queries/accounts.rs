use rusqlite::OptionalExtension;
use stagelink_types::models::ProfileType;

use crate::models::AccountRow;
use crate::{Database, StoreError, StoreResult};

impl Database {
    /// Registers an identity and synchronously provisions its profile row.
    /// Two statements, no transaction; the account insert failing (duplicate
    /// email) aborts before the profile is touched.
    pub fn create_account(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        profile_type: ProfileType,
        display_name: &str,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO accounts (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )
            .map_err(|e| StoreError::from(e).on_conflict("email already registered"))?;

            conn.execute(
                "INSERT INTO profiles (id, email, profile_type, display_name)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, email, profile_type.as_str(), display_name),
            )?;

            Ok(())
        })
    }

    pub fn get_account_by_email(&self, email: &str) -> StoreResult<Option<AccountRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, password, created_at FROM accounts WHERE email = ?1",
                    [email],
                    |row| {
                        Ok(AccountRow {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            password: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil;
    use crate::StoreError;
    use stagelink_types::models::ProfileType;

    #[test]
    fn registering_provisions_a_profile() {
        let db = testutil::db();
        db.create_account("a1", "ella@example.com", "hash", ProfileType::Artist, "ella")
            .unwrap();

        let profile = db.get_profile("a1").unwrap().expect("profile row");
        assert_eq!(profile.email, "ella@example.com");
        assert_eq!(profile.profile_type, "artist");
        assert_eq!(profile.display_name, "ella");

        let account = db.get_account_by_email("ella@example.com").unwrap().unwrap();
        assert_eq!(account.id, "a1");
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = testutil::db();
        db.create_account("a1", "dup@example.com", "hash", ProfileType::Artist, "one")
            .unwrap();

        let err = db
            .create_account("a2", "dup@example.com", "hash", ProfileType::Venue, "two")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg == "email already registered"));

        // The failed registration must not have provisioned a profile.
        assert!(db.get_profile("a2").unwrap().is_none());
    }
}
