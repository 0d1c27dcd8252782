use anyhow::Result;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::UserRow;

const USER_COLUMNS: &str =
    "id, username, email, password, role, profile_picture, bio, theme, created_at";

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        profile_picture: row.get(5)?,
        bio: row.get(6)?,
        theme: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn insert_user(
    conn: &Connection,
    id: &str,
    username: &str,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
        (id, username, email, password_hash, role),
    )?;
    Ok(())
}

pub fn user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    stmt.query_row([id], map_user).optional()
}

pub fn user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
    stmt.query_row([email], map_user).optional()
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;
    stmt.query_row([username], map_user).optional()
}

pub fn all_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))?;
    let rows = stmt
        .query_map([], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Case-insensitive substring match on username.
pub fn users_matching(conn: &Connection, query: &str) -> Result<Vec<UserRow>> {
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ?1 ORDER BY username"
    ))?;
    let rows = stmt
        .query_map([pattern], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Partial profile update; None leaves the column unchanged.
pub fn update_profile(
    conn: &Connection,
    id: &str,
    bio: Option<&str>,
    theme: Option<&str>,
    profile_picture: Option<&str>,
) -> Result<usize> {
    let n = conn.execute(
        "UPDATE users SET
            bio = COALESCE(?2, bio),
            theme = COALESCE(?3, theme),
            profile_picture = COALESCE(?4, profile_picture)
         WHERE id = ?1",
        (id, bio, theme, profile_picture),
    )?;
    Ok(n)
}

/// Cascades to the user's posts, comments, likes, messages (both directions),
/// follow edges (both directions), notifications, and reports.
pub fn delete_user(conn: &Connection, id: &str) -> Result<usize> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(n)
}
