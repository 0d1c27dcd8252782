use axum::{Extension, Json, extract::State, response::IntoResponse};

use quill_db::{Database, notifications};
use quill_types::api::Claims;

use crate::auth::AppState;
use crate::convert::notification_response;
use crate::error::ApiError;
use crate::posts::join_err;

/// GET /notifications — pull the actor's notifications, newest first.
/// Fetching marks everything read; the returned rows keep their pre-fetch
/// flags so clients can still highlight what was new.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || list_and_mark_read(&db.db, &actor_id))
        .await
        .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(notification_response).collect::<Vec<_>>()))
}

pub fn list_and_mark_read(
    db: &Database,
    user_id: &str,
) -> Result<Vec<quill_db::models::NotificationRow>, ApiError> {
    let rows = db.with_tx(|conn| {
        let rows = notifications::notifications_for(conn, user_id)?;
        notifications::mark_all_read(conn, user_id)?;
        Ok(rows)
    })?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::users;

    #[test]
    fn fetching_marks_all_read() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            users::insert_user(conn, "u1", "alice", "alice@example.com", "hash", "User")?;
            notifications::insert_notification(conn, "n1", "u1", "one")?;
            notifications::insert_notification(conn, "n2", "u1", "two")?;
            Ok(())
        })
        .unwrap();

        let rows = list_and_mark_read(&db, "u1").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|n| !n.read), "pre-fetch flags preserved");

        db.with_conn(|conn| {
            assert_eq!(notifications::unread_count(conn, "u1").unwrap(), 0);
            Ok(())
        })
        .unwrap();
    }
}
