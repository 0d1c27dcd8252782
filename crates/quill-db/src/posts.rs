use anyhow::Result;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::PostRow;

// JOIN users for the author and derive counts in one query (eliminates N+1).
const POST_SELECT: &str = "
    SELECT p.id, p.title, p.content, p.image, p.video, p.user_id,
           u.username, u.role, p.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id AND l.is_like = 1),
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id AND l.is_like = 0),
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
    FROM posts p
    JOIN users u ON p.user_id = u.id";

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        video: row.get(4)?,
        user_id: row.get(5)?,
        author_username: row.get(6)?,
        author_role: row.get(7)?,
        created_at: row.get(8)?,
        likes: row.get(9)?,
        dislikes: row.get(10)?,
        comment_count: row.get(11)?,
    })
}

pub fn insert_post(
    conn: &Connection,
    id: &str,
    author_id: &str,
    title: &str,
    content: &str,
    image: Option<&str>,
    video: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, title, content, image, video, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (id, title, content, image, video, author_id),
    )?;
    Ok(())
}

pub fn post_by_id(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    let mut stmt = conn.prepare(&format!("{POST_SELECT} WHERE p.id = ?1"))?;
    stmt.query_row([id], map_post).optional()
}

pub fn all_posts(conn: &Connection) -> Result<Vec<PostRow>> {
    let mut stmt = conn.prepare(&format!("{POST_SELECT} ORDER BY p.created_at DESC"))?;
    let rows = stmt
        .query_map([], map_post)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn posts_by_author(conn: &Connection, user_id: &str) -> Result<Vec<PostRow>> {
    let mut stmt = conn.prepare(&format!(
        "{POST_SELECT} WHERE p.user_id = ?1 ORDER BY p.created_at DESC"
    ))?;
    let rows = stmt
        .query_map([user_id], map_post)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Case-insensitive substring match on title or content.
pub fn posts_matching(conn: &Connection, query: &str) -> Result<Vec<PostRow>> {
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(&format!(
        "{POST_SELECT} WHERE p.title LIKE ?1 OR p.content LIKE ?1
         ORDER BY p.created_at DESC"
    ))?;
    let rows = stmt
        .query_map([pattern], map_post)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Cascades to the post's comments and likes.
pub fn delete_post(conn: &Connection, id: &str) -> Result<usize> {
    let n = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    Ok(n)
}
