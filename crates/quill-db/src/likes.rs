use anyhow::Result;
use rusqlite::Connection;

use crate::OptionalExt;

/// Toggle a like on a post. If the user already has ANY like/dislike row on
/// the post, that row is removed regardless of the requested action; otherwise
/// a new row is inserted with the requested flag.
/// Returns true when a row was inserted, false when one was removed.
pub fn toggle_post_like(
    conn: &Connection,
    id: &str,
    user_id: &str,
    post_id: &str,
    is_like: bool,
) -> Result<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM likes WHERE user_id = ?1 AND post_id = ?2",
            (user_id, post_id),
            |row| row.get(0),
        )
        .optional()?;

    if let Some(existing_id) = existing {
        conn.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
        Ok(false)
    } else {
        conn.execute(
            "INSERT INTO likes (id, user_id, post_id, is_like) VALUES (?1, ?2, ?3, ?4)",
            (id, user_id, post_id, is_like),
        )?;
        Ok(true)
    }
}

/// Same toggle semantics against a comment target.
pub fn toggle_comment_like(
    conn: &Connection,
    id: &str,
    user_id: &str,
    comment_id: &str,
    is_like: bool,
) -> Result<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM likes WHERE user_id = ?1 AND comment_id = ?2",
            (user_id, comment_id),
            |row| row.get(0),
        )
        .optional()?;

    if let Some(existing_id) = existing {
        conn.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
        Ok(false)
    } else {
        conn.execute(
            "INSERT INTO likes (id, user_id, comment_id, is_like) VALUES (?1, ?2, ?3, ?4)",
            (id, user_id, comment_id, is_like),
        )?;
        Ok(true)
    }
}

pub fn post_like_counts(conn: &Connection, post_id: &str) -> Result<(i64, i64)> {
    conn.query_row(
        "SELECT
            COUNT(*) FILTER (WHERE is_like = 1),
            COUNT(*) FILTER (WHERE is_like = 0)
         FROM likes WHERE post_id = ?1",
        [post_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(Into::into)
}

pub fn comment_like_counts(conn: &Connection, comment_id: &str) -> Result<(i64, i64)> {
    conn.query_row(
        "SELECT
            COUNT(*) FILTER (WHERE is_like = 1),
            COUNT(*) FILTER (WHERE is_like = 0)
         FROM likes WHERE comment_id = ?1",
        [comment_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(Into::into)
}
