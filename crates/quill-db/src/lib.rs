pub mod comments;
pub mod likes;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod reports;
pub mod social;
pub mod users;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
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

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Run `f` inside a transaction. Commits on Ok; a dropped transaction
    /// rolls back, so any Err leaves the database untouched.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn.unchecked_transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_user(db: &Database, id: &str, name: &str) {
        db.with_conn(|conn| {
            users::insert_user(
                conn,
                id,
                name,
                &format!("{name}@example.com"),
                "hash",
                "User",
            )
        })
        .unwrap();
    }

    fn seed_post(db: &Database, id: &str, author: &str) {
        db.with_conn(|conn| posts::insert_post(conn, id, author, "Hello", "body", None, None))
            .unwrap();
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .map_err(Into::into)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_username_and_email_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        let dup_name = db.with_conn(|conn| {
            users::insert_user(conn, "u2", "alice", "other@example.com", "hash", "User")
        });
        assert!(dup_name.is_err());
        let dup_email = db.with_conn(|conn| {
            users::insert_user(conn, "u3", "bob", "alice@example.com", "hash", "User")
        });
        assert!(dup_email.is_err());
    }

    #[test]
    fn deleting_user_cascades_everything_they_own() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        seed_user(&db, "u2", "bob");
        seed_post(&db, "p1", "u1");
        db.with_conn(|conn| {
            comments::insert_comment(conn, "c1", "p1", "u1", "mine")?;
            comments::insert_comment(conn, "c2", "p1", "u2", "bobs")?;
            likes::toggle_post_like(conn, "l1", "u1", "p1", true)?;
            messages::insert_message(conn, "m1", "u1", "u2", "hi")?;
            messages::insert_message(conn, "m2", "u2", "u1", "hey")?;
            social::insert_follow(conn, "f1", "u1", "u2")?;
            social::insert_follow(conn, "f2", "u2", "u1")?;
            notifications::insert_notification(conn, "n1", "u1", "note")?;
            reports::insert_report(conn, "r1", "u2", Some("u1"), None, "spam")?;
            Ok(())
        })
        .unwrap();

        db.with_conn(|conn| users::delete_user(conn, "u1")).unwrap();

        assert_eq!(count(&db, "posts"), 0);
        assert_eq!(count(&db, "comments"), 0);
        assert_eq!(count(&db, "likes"), 0);
        assert_eq!(count(&db, "messages"), 0);
        assert_eq!(count(&db, "friendships"), 0);
        assert_eq!(count(&db, "reports"), 0);
        // bob keeps nothing pointing at alice, but bob himself survives
        assert_eq!(count(&db, "users"), 1);
        db.with_conn(|conn| {
            assert_eq!(
                notifications::notifications_for(conn, "u1").unwrap().len(),
                0
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn deleting_post_cascades_comments_and_likes() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        seed_user(&db, "u2", "bob");
        seed_post(&db, "p1", "u1");
        db.with_conn(|conn| {
            comments::insert_comment(conn, "c1", "p1", "u2", "nice")?;
            likes::toggle_post_like(conn, "l1", "u2", "p1", true)?;
            Ok(())
        })
        .unwrap();

        db.with_conn(|conn| posts::delete_post(conn, "p1")).unwrap();

        assert_eq!(count(&db, "comments"), 0);
        assert_eq!(count(&db, "likes"), 0);
        assert_eq!(count(&db, "users"), 2);
    }

    #[test]
    fn like_toggle_removes_existing_row_for_either_action() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        seed_user(&db, "u2", "bob");
        seed_post(&db, "p1", "u1");

        db.with_conn(|conn| {
            assert!(likes::toggle_post_like(conn, "l1", "u2", "p1", true).unwrap());
            assert_eq!(likes::post_like_counts(conn, "p1").unwrap(), (1, 0));

            // second like toggles off
            assert!(!likes::toggle_post_like(conn, "l2", "u2", "p1", true).unwrap());
            assert_eq!(likes::post_like_counts(conn, "p1").unwrap(), (0, 0));

            // dislike on an existing like also just removes it
            assert!(likes::toggle_post_like(conn, "l3", "u2", "p1", true).unwrap());
            assert!(!likes::toggle_post_like(conn, "l4", "u2", "p1", false).unwrap());
            assert_eq!(likes::post_like_counts(conn, "p1").unwrap(), (0, 0));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn follow_edge_is_unique_per_ordered_pair() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        seed_user(&db, "u2", "bob");
        db.with_conn(|conn| social::insert_follow(conn, "f1", "u1", "u2"))
            .unwrap();
        let dup = db.with_conn(|conn| social::insert_follow(conn, "f2", "u1", "u2"));
        assert!(dup.is_err());
        // reverse direction is a distinct edge
        db.with_conn(|conn| social::insert_follow(conn, "f3", "u2", "u1"))
            .unwrap();
        db.with_conn(|conn| {
            assert_eq!(social::followers_count(conn, "u2").unwrap(), 1);
            assert_eq!(social::following_count(conn, "u1").unwrap(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn failed_transaction_rolls_back_all_writes() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        let res: Result<()> = db.with_tx(|conn| {
            posts::insert_post(conn, "p1", "u1", "Hello", "body", None, None)?;
            anyhow::bail!("boom");
        });
        assert!(res.is_err());
        assert_eq!(count(&db, "posts"), 0);
    }

    #[test]
    fn conversation_read_marking_only_touches_recipient_side() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");
        seed_user(&db, "u2", "bob");
        db.with_conn(|conn| {
            messages::insert_message(conn, "m1", "u1", "u2", "hi")?;
            messages::insert_message(conn, "m2", "u2", "u1", "hey")?;
            Ok(())
        })
        .unwrap();

        // alice opens the conversation: only m2 (received by alice) flips
        db.with_conn(|conn| {
            assert_eq!(messages::mark_conversation_read(conn, "u1", "u2").unwrap(), 1);
            let msgs = messages::conversation(conn, "u1", "u2").unwrap();
            assert_eq!(msgs.len(), 2);
            let m1 = msgs.iter().find(|m| m.id == "m1").unwrap();
            let m2 = msgs.iter().find(|m| m.id == "m2").unwrap();
            assert!(!m1.read);
            assert!(m2.read);
            Ok(())
        })
        .unwrap();
    }
}
