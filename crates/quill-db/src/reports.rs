use anyhow::Result;
use rusqlite::Connection;

use crate::models::ReportRow;

pub fn insert_report(
    conn: &Connection,
    id: &str,
    reporter_user_id: &str,
    reported_user_id: Option<&str>,
    post_id: Option<&str>,
    reason: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO reports (id, reporter_user_id, reported_user_id, post_id, reason)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (id, reporter_user_id, reported_user_id, post_id, reason),
    )?;
    Ok(())
}

/// All reports joined with reporter and reported display names.
pub fn all_reports(conn: &Connection) -> Result<Vec<ReportRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.reporter_user_id, reporter.username,
                r.reported_user_id, reported.username,
                r.post_id, r.reason, r.status, r.created_at
         FROM reports r
         JOIN users reporter ON r.reporter_user_id = reporter.id
         LEFT JOIN users reported ON r.reported_user_id = reported.id
         ORDER BY r.created_at DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ReportRow {
                id: row.get(0)?,
                reporter_user_id: row.get(1)?,
                reporter_username: row.get(2)?,
                reported_user_id: row.get(3)?,
                reported_username: row.get(4)?,
                post_id: row.get(5)?,
                reason: row.get(6)?,
                status: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Manual moderator transition; the pipeline never changes status on its own.
pub fn set_status(conn: &Connection, id: &str, status: &str) -> Result<usize> {
    let n = conn.execute(
        "UPDATE reports SET status = ?2 WHERE id = ?1",
        (id, status),
    )?;
    Ok(n)
}

pub fn count_reports(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))
        .map_err(Into::into)
}
