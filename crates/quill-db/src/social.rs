use anyhow::Result;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::FriendshipRow;

pub fn edge_exists(conn: &Connection, follower_id: &str, followed_id: &str) -> Result<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM friendships WHERE follower_id = ?1 AND followed_id = ?2",
            (follower_id, followed_id),
            |row| row.get(0),
        )
        .optional()?;
    Ok(existing.is_some())
}

pub fn insert_follow(
    conn: &Connection,
    id: &str,
    follower_id: &str,
    followed_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO friendships (id, follower_id, followed_id) VALUES (?1, ?2, ?3)",
        (id, follower_id, followed_id),
    )?;
    Ok(())
}

/// Removes the edge if present. Returns the number of rows removed; absent
/// edges are not an error.
pub fn delete_follow(conn: &Connection, follower_id: &str, followed_id: &str) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM friendships WHERE follower_id = ?1 AND followed_id = ?2",
        (follower_id, followed_id),
    )?;
    Ok(n)
}

/// Users following `user_id`, joined with their usernames.
pub fn followers_of(conn: &Connection, user_id: &str) -> Result<Vec<FriendshipRow>> {
    let mut stmt = conn.prepare(
        "SELECT f.follower_id, u.username, f.created_at
         FROM friendships f
         JOIN users u ON f.follower_id = u.id
         WHERE f.followed_id = ?1
         ORDER BY f.created_at DESC",
    )?;
    let rows = stmt
        .query_map([user_id], map_edge)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Users `user_id` is following, joined with their usernames.
pub fn following_of(conn: &Connection, user_id: &str) -> Result<Vec<FriendshipRow>> {
    let mut stmt = conn.prepare(
        "SELECT f.followed_id, u.username, f.created_at
         FROM friendships f
         JOIN users u ON f.followed_id = u.id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at DESC",
    )?;
    let rows = stmt
        .query_map([user_id], map_edge)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Follower ids only, for notification fan-out.
pub fn follower_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT follower_id FROM friendships WHERE followed_id = ?1")?;
    let rows = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// Counts are derived, never stored.

pub fn followers_count(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM friendships WHERE followed_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn following_count(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM friendships WHERE follower_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

fn map_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendshipRow> {
    Ok(FriendshipRow {
        user_id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}
