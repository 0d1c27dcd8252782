use anyhow::Result;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::CommentRow;

fn map_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        content: row.get(1)?,
        user_id: row.get(2)?,
        author_username: row.get(3)?,
        post_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert_comment(
    conn: &Connection,
    id: &str,
    post_id: &str,
    user_id: &str,
    content: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO comments (id, content, user_id, post_id) VALUES (?1, ?2, ?3, ?4)",
        (id, content, user_id, post_id),
    )?;
    Ok(())
}

pub fn comment_by_id(conn: &Connection, id: &str) -> Result<Option<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, c.user_id, u.username, c.post_id, c.created_at
         FROM comments c
         JOIN users u ON c.user_id = u.id
         WHERE c.id = ?1",
    )?;
    stmt.query_row([id], map_comment).optional()
}

pub fn comments_for_post(conn: &Connection, post_id: &str) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, c.user_id, u.username, c.post_id, c.created_at
         FROM comments c
         JOIN users u ON c.user_id = u.id
         WHERE c.post_id = ?1
         ORDER BY c.created_at",
    )?;
    let rows = stmt
        .query_map([post_id], map_comment)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
