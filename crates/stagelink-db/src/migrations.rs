use crate::StoreResult;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS accounts (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id              TEXT PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
            email           TEXT NOT NULL,
            profile_type    TEXT NOT NULL DEFAULT 'artist'
                            CHECK (profile_type IN ('artist', 'venue')),
            display_name    TEXT NOT NULL,
            bio             TEXT,
            website         TEXT,
            phone           TEXT,
            picture_url     TEXT,
            location        TEXT,
            role            TEXT,
            social_links    TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS media_items (
            id          TEXT PRIMARY KEY,
            profile_id  TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            media_type  TEXT NOT NULL CHECK (media_type IN ('image', 'video', 'audio')),
            url         TEXT NOT NULL,
            caption     TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_media_profile
            ON media_items(profile_id, created_at);

        CREATE TABLE IF NOT EXISTS venues (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT REFERENCES profiles(id),
            name        TEXT NOT NULL,
            genre       TEXT NOT NULL,
            address     TEXT NOT NULL,
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            description TEXT,
            website     TEXT,
            phone       TEXT,
            capacity    INTEGER,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id              TEXT PRIMARY KEY,
            venue_id        TEXT NOT NULL REFERENCES profiles(id),
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            genre           TEXT NOT NULL,
            event_date      TEXT NOT NULL,
            location        TEXT NOT NULL,
            pay_range       TEXT,
            requirements    TEXT,
            contact_info    TEXT,
            status          TEXT NOT NULL DEFAULT 'open'
                            CHECK (status IN ('open', 'filled', 'cancelled')),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_venue
            ON jobs(venue_id, created_at);

        CREATE TABLE IF NOT EXISTS job_applications (
            id          TEXT PRIMARY KEY,
            job_id      TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            artist_id   TEXT NOT NULL REFERENCES profiles(id),
            message     TEXT,
            status      TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'accepted', 'rejected')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_id, artist_id)
        );

        CREATE TABLE IF NOT EXISTS groups (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT,
            genre       TEXT,
            created_by  TEXT NOT NULL REFERENCES profiles(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS group_members (
            id          TEXT PRIMARY KEY,
            group_id    TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            profile_id  TEXT NOT NULL REFERENCES profiles(id),
            role        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(group_id, profile_id)
        );

        CREATE TABLE IF NOT EXISTS group_job_applications (
            id          TEXT PRIMARY KEY,
            job_id      TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            group_id    TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            message     TEXT,
            status      TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'accepted', 'rejected')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_id, group_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            sender_id   TEXT NOT NULL REFERENCES profiles(id),
            receiver_id TEXT NOT NULL REFERENCES profiles(id),
            content     TEXT NOT NULL,
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (sender_id <> receiver_id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, is_read);
        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
