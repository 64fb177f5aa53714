use rusqlite::Row;

use crate::models::{ConversationRow, MessageRow};
use crate::policy::{self, Action};
use crate::{Database, StoreError, StoreResult};

fn message_from_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        sender_name: row.get(2)?,
        receiver_id: row.get(3)?,
        receiver_name: row.get(4)?,
        content: row.get(5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl Database {
    pub fn send_message(
        &self,
        id: &str,
        requester: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> StoreResult<MessageRow> {
        if content.trim().is_empty() {
            return Err(StoreError::Invalid("content"));
        }

        self.with_conn(|conn| {
            policy::check(
                conn,
                requester,
                &Action::MessageSend {
                    sender_id,
                    receiver_id,
                },
            )?;

            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, sender_id, receiver_id, content],
            )?;

            conn.query_row(
                "SELECT m.id, m.sender_id, s.display_name, m.receiver_id, r.display_name,
                        m.content, m.is_read, m.created_at
                 FROM messages m
                 JOIN profiles s ON s.id = m.sender_id
                 JOIN profiles r ON r.id = m.receiver_id
                 WHERE m.id = ?1",
                [id],
                message_from_row,
            )
            .map_err(StoreError::from)
        })
    }

    /// The full thread between the requester and one counterpart, both
    /// directions, oldest first. Ties on the second-resolution timestamp
    /// fall back to insertion order.
    pub fn conversation_between(
        &self,
        requester: &str,
        partner_id: &str,
    ) -> StoreResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.sender_id, s.display_name, m.receiver_id, r.display_name,
                        m.content, m.is_read, m.created_at
                 FROM messages m
                 JOIN profiles s ON s.id = m.sender_id
                 JOIN profiles r ON r.id = m.receiver_id
                 WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                    OR (m.sender_id = ?2 AND m.receiver_id = ?1)
                 ORDER BY m.created_at, m.rowid",
            )?;

            let rows = stmt
                .query_map([requester, partner_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The derived conversation list: every counterpart exactly once, with
    /// the most recent message (latest insert wins on timestamp ties) and
    /// the count of unread messages that counterpart sent to the requester.
    /// Recomputed from the message table on every call; nothing is cached.
    pub fn conversations_for(&self, requester: &str) -> StoreResult<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "WITH exchanged AS (
                     SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END
                                AS partner_id,
                            content, created_at, rowid AS rid
                     FROM messages
                     WHERE sender_id = ?1 OR receiver_id = ?1
                 ),
                 latest AS (
                     SELECT partner_id, content, created_at, rid,
                            ROW_NUMBER() OVER (
                                PARTITION BY partner_id
                                ORDER BY created_at DESC, rid DESC
                            ) AS rn
                     FROM exchanged
                 ),
                 unread AS (
                     SELECT sender_id AS partner_id, COUNT(*) AS unread_count
                     FROM messages
                     WHERE receiver_id = ?1 AND is_read = 0
                     GROUP BY sender_id
                 )
                 SELECT l.partner_id, p.display_name, p.profile_type,
                        l.content, l.created_at, COALESCE(u.unread_count, 0)
                 FROM latest l
                 JOIN profiles p ON p.id = l.partner_id
                 LEFT JOIN unread u ON u.partner_id = l.partner_id
                 WHERE l.rn = 1
                 ORDER BY l.created_at DESC, l.rid DESC",
            )?;

            let rows = stmt
                .query_map([requester], |row| {
                    Ok(ConversationRow {
                        partner_id: row.get(0)?,
                        partner_name: row.get(1)?,
                        partner_type: row.get(2)?,
                        last_message: row.get(3)?,
                        last_message_at: row.get(4)?,
                        unread_count: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Explicit mark-as-read, separate from thread retrieval. Flips every
    /// unread message from `partner_id` to the requester; returns how many
    /// rows changed.
    pub fn mark_read(&self, requester: &str, partner_id: &str) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                [requester, partner_id],
            )?;
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use crate::Database;
    use uuid::Uuid;

    fn send(db: &Database, from: &str, to: &str, content: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.send_message(&id, from, from, to, content).unwrap();
        id
    }

    fn backdate(db: &Database, message_id: &str, ts: &str) {
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET created_at = ?2 WHERE id = ?1",
                [message_id, ts],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn messaging_yourself_is_rejected() {
        let db = testutil::db();
        let x = testutil::artist(&db, "x");

        let err = db
            .send_message(&Uuid::new_v4().to_string(), &x, &x, &x, "echo")
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(db.conversations_for(&x).unwrap().is_empty());
    }

    #[test]
    fn sender_must_be_the_requester_and_receiver_must_exist() {
        let db = testutil::db();
        let x = testutil::artist(&db, "x");
        let y = testutil::artist(&db, "y");

        assert!(matches!(
            db.send_message(&Uuid::new_v4().to_string(), &x, &y, &x, "forged")
                .unwrap_err(),
            StoreError::Forbidden(_)
        ));
        assert!(matches!(
            db.send_message(&Uuid::new_v4().to_string(), &x, &x, "ghost", "hello?")
                .unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn thread_is_complete_ordered_and_annotated() {
        let db = testutil::db();
        let x = testutil::artist(&db, "x");
        let y = testutil::artist(&db, "y");
        let z = testutil::artist(&db, "z");

        let hi = send(&db, &x, &y, "hi");
        backdate(&db, &hi, "2026-08-01 10:00:00");
        let hey = send(&db, &y, &x, "hey");
        backdate(&db, &hey, "2026-08-01 10:05:00");
        send(&db, &z, &x, "unrelated");

        let thread = db.conversation_between(&x, &y).unwrap();
        let contents: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hi", "hey"]);
        assert_eq!(thread[0].sender_name, "x");
        assert_eq!(thread[0].receiver_name, "y");
        assert_eq!(thread[1].sender_name, "y");
    }

    #[test]
    fn conversation_list_aggregates_per_partner() {
        let db = testutil::db();
        let x = testutil::artist(&db, "x");
        let y = testutil::artist(&db, "y");
        let z = testutil::venue(&db, "z");

        let a = send(&db, &x, &y, "hi");
        backdate(&db, &a, "2026-08-01 10:00:00");
        let b = send(&db, &y, &x, "hey");
        backdate(&db, &b, "2026-08-01 10:05:00");
        let c = send(&db, &y, &x, "you around?");
        backdate(&db, &c, "2026-08-01 10:06:00");
        let d = send(&db, &z, &x, "booking question");
        backdate(&db, &d, "2026-08-01 11:00:00");

        let convos = db.conversations_for(&x).unwrap();
        assert_eq!(convos.len(), 2);

        // Ordered by most recent message, descending.
        assert_eq!(convos[0].partner_id, z);
        assert_eq!(convos[0].partner_type, "venue");
        assert_eq!(convos[0].last_message, "booking question");
        assert_eq!(convos[0].unread_count, 1);

        assert_eq!(convos[1].partner_id, y);
        assert_eq!(convos[1].last_message, "you around?");
        assert_eq!(convos[1].unread_count, 2);

        // Unread counts only cover messages sent *to* the requester.
        let from_y = db.conversations_for(&y).unwrap();
        assert_eq!(from_y.len(), 1);
        assert_eq!(from_y[0].unread_count, 1);
    }

    #[test]
    fn mark_read_is_scoped_to_one_counterpart() {
        let db = testutil::db();
        let x = testutil::artist(&db, "x");
        let y = testutil::artist(&db, "y");
        let z = testutil::artist(&db, "z");

        send(&db, &y, &x, "one");
        send(&db, &y, &x, "two");
        send(&db, &z, &x, "three");

        assert_eq!(db.mark_read(&x, &y).unwrap(), 2);
        // Re-running is a no-op.
        assert_eq!(db.mark_read(&x, &y).unwrap(), 0);

        let convos = db.conversations_for(&x).unwrap();
        let unread_y = convos.iter().find(|c| c.partner_id == y).unwrap();
        let unread_z = convos.iter().find(|c| c.partner_id == z).unwrap();
        assert_eq!(unread_y.unread_count, 0);
        assert_eq!(unread_z.unread_count, 1);
    }

    #[test]
    fn refetching_without_new_messages_is_identical() {
        let db = testutil::db();
        let x = testutil::artist(&db, "x");
        let y = testutil::artist(&db, "y");
        send(&db, &x, &y, "hi");
        send(&db, &y, &x, "hey");

        let first: Vec<_> = db
            .conversations_for(&x)
            .unwrap()
            .into_iter()
            .map(|c| (c.partner_id, c.last_message, c.unread_count))
            .collect();
        let second: Vec<_> = db
            .conversations_for(&x)
            .unwrap()
            .into_iter()
            .map(|c| (c.partner_id, c.last_message, c.unread_count))
            .collect();
        assert_eq!(first, second);
    }
}
