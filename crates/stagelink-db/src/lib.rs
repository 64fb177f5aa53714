pub mod error;
pub mod migrations;
pub mod models;
pub mod policy;
pub mod queries;

pub use error::StoreError;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub type StoreResult<T> = Result<T, StoreError>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All statement sequences run under this single lock, so a policy check
    /// followed by its write is atomic with respect to other writers.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Internal(format!("DB lock poisoned: {}", e)))?;
        f(&conn)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::Database;
    use stagelink_types::models::ProfileType;
    use uuid::Uuid;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn artist(db: &Database, name: &str) -> String {
        profile(db, name, ProfileType::Artist)
    }

    pub fn venue(db: &Database, name: &str) -> String {
        profile(db, name, ProfileType::Venue)
    }

    pub fn profile(db: &Database, name: &str, kind: ProfileType) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_account(
            &id,
            &format!("{}@example.com", name),
            "not-a-real-hash",
            kind,
            name,
        )
        .unwrap();
        id
    }
}
