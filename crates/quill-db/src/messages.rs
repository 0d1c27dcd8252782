use anyhow::Result;
use rusqlite::Connection;

use crate::models::MessageRow;

// JOIN users twice for the two counterpart usernames.
const MESSAGE_SELECT: &str = "
    SELECT m.id, m.content, m.sender_id, s.username, m.recipient_id, r.username,
           m.read, m.created_at
    FROM messages m
    JOIN users s ON m.sender_id = s.id
    JOIN users r ON m.recipient_id = r.id";

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        content: row.get(1)?,
        sender_id: row.get(2)?,
        sender_username: row.get(3)?,
        recipient_id: row.get(4)?,
        recipient_username: row.get(5)?,
        read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert_message(
    conn: &Connection,
    id: &str,
    sender_id: &str,
    recipient_id: &str,
    content: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, content, sender_id, recipient_id) VALUES (?1, ?2, ?3, ?4)",
        (id, content, sender_id, recipient_id),
    )?;
    Ok(())
}

/// Everything sent or received by the user, newest first.
pub fn inbox_for(conn: &Connection, user_id: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "{MESSAGE_SELECT}
         WHERE m.sender_id = ?1 OR m.recipient_id = ?1
         ORDER BY m.created_at DESC"
    ))?;
    let rows = stmt
        .query_map([user_id], map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Both directions between a pair, oldest first. There is no conversation
/// entity; this filter IS the conversation.
pub fn conversation(conn: &Connection, user_id: &str, other_id: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "{MESSAGE_SELECT}
         WHERE (m.sender_id = ?1 AND m.recipient_id = ?2)
            OR (m.sender_id = ?2 AND m.recipient_id = ?1)
         ORDER BY m.created_at"
    ))?;
    let rows = stmt
        .query_map((user_id, other_id), map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Mark everything the user received from `other_id` as read.
pub fn mark_conversation_read(conn: &Connection, user_id: &str, other_id: &str) -> Result<usize> {
    let n = conn.execute(
        "UPDATE messages SET read = 1
         WHERE recipient_id = ?1 AND sender_id = ?2 AND read = 0",
        (user_id, other_id),
    )?;
    Ok(n)
}
