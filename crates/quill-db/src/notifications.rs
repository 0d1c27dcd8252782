use anyhow::Result;
use rusqlite::Connection;

use crate::models::NotificationRow;

pub fn insert_notification(conn: &Connection, id: &str, user_id: &str, content: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, content) VALUES (?1, ?2, ?3)",
        (id, user_id, content),
    )?;
    Ok(())
}

pub fn notifications_for(conn: &Connection, user_id: &str) -> Result<Vec<NotificationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, content, read, created_at
         FROM notifications
         WHERE user_id = ?1
         ORDER BY created_at DESC",
    )?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(NotificationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                content: row.get(2)?,
                read: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_all_read(conn: &Connection, user_id: &str) -> Result<usize> {
    let n = conn.execute(
        "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
        [user_id],
    )?;
    Ok(n)
}

pub fn unread_count(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        [user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
