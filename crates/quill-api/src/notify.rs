//! Notification fan-out. One entry point writes one row per recipient;
//! persistence is a best-effort side channel of the triggering action.

use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use quill_db::notifications;

use crate::sanitize::sanitize;

/// Sanitize and persist one unread notification. A failed insert is logged
/// and swallowed: the triggering action commits regardless (accepted
/// inconsistency — notifications are pull-on-page-load, not a ledger).
pub fn notify(conn: &Connection, user_id: &str, content: &str) {
    let content = sanitize(content);
    let id = Uuid::new_v4().to_string();
    if let Err(e) = notifications::insert_notification(conn, &id, user_id, &content) {
        warn!("Failed to persist notification for {}: {}", user_id, e);
    }
}

// Message templates. One place, so the wording stays consistent with what
// clients display and tests assert on.

pub fn new_post_message(author: &str, title: &str) -> String {
    format!("{} posted a new blog: {}", author, title)
}

pub fn comment_message(commenter: &str, title: &str) -> String {
    format!("{} commented on your post: {}", commenter, title)
}

pub fn like_message(actor: &str, verb: &str, title: &str) -> String {
    format!("{} {} your post: {}", actor, verb, title)
}

pub fn follow_message(follower: &str) -> String {
    format!("{} started following you", follower)
}

pub fn message_message(sender: &str) -> String {
    format!("{} sent you a message", sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::Database;
    use quill_db::users;

    #[test]
    fn notify_persists_sanitized_unread_row() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            users::insert_user(conn, "u1", "alice", "alice@example.com", "hash", "User")
        })
        .unwrap();

        db.with_conn(|conn| {
            notify(conn, "u1", "<b>bob</b> started following you");
            Ok(())
        })
        .unwrap();

        db.with_conn(|conn| {
            let rows = notifications::notifications_for(conn, "u1").unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].content, "&lt;b&gt;bob&lt;/b&gt; started following you");
            assert!(!rows[0].read);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn notify_swallows_insert_failure() {
        let db = Database::open_in_memory().unwrap();
        // no such user: the FK rejects the insert, notify only warns
        db.with_conn(|conn| {
            notify(conn, "ghost", "hello");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn templates_match_documented_wording() {
        assert_eq!(
            new_post_message("alice", "Hello"),
            "alice posted a new blog: Hello"
        );
        assert_eq!(
            comment_message("bob", "Hello"),
            "bob commented on your post: Hello"
        );
        assert_eq!(
            like_message("bob", "liked", "Hello"),
            "bob liked your post: Hello"
        );
        assert_eq!(
            like_message("bob", "disliked", "Hello"),
            "bob disliked your post: Hello"
        );
        assert_eq!(follow_message("bob"), "bob started following you");
        assert_eq!(message_message("bob"), "bob sent you a message");
    }
}
