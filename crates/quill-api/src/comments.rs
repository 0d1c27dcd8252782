use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quill_db::models::CommentRow;
use quill_db::{Database, comments, posts};
use quill_types::api::{Claims, CreateCommentRequest};

use crate::auth::AppState;
use crate::convert::comment_response;
use crate::error::ApiError;
use crate::notify;
use crate::posts::join_err;
use crate::sanitize::sanitize;

/// POST /posts/{id}/comments.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = sanitize(&req.content);
    if content.trim().is_empty() {
        return Err(ApiError::Validation("Comment text is required.".into()));
    }

    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let actor_username = claims.username.clone();
    let row = tokio::task::spawn_blocking(move || {
        create_comment_record(&db.db, &actor_id, &actor_username, &post_id.to_string(), &content)
    })
    .await
    .map_err(join_err)??;

    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

/// Insert the comment and notify the post's author, unless the author is
/// commenting on their own post. One transaction; the notification insert is
/// best-effort inside it.
pub fn create_comment_record(
    db: &Database,
    actor_id: &str,
    actor_username: &str,
    post_id: &str,
    content: &str,
) -> Result<CommentRow, ApiError> {
    let post = db
        .with_conn(|conn| posts::post_by_id(conn, post_id))?
        .ok_or(ApiError::NotFound)?;

    let comment_id = Uuid::new_v4().to_string();
    let row = db.with_tx(|conn| {
        comments::insert_comment(conn, &comment_id, post_id, actor_id, content)?;

        if post.user_id != actor_id {
            notify::notify(
                conn,
                &post.user_id,
                &notify::comment_message(actor_username, &post.title),
            );
        }

        comments::comment_by_id(conn, &comment_id)?
            .ok_or_else(|| anyhow::anyhow!("comment {} missing after insert", comment_id))
    })?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::{notifications, users};

    fn seed_user(db: &Database, id: &str, name: &str) {
        db.with_conn(|conn| {
            users::insert_user(conn, id, name, &format!("{name}@example.com"), "hash", "User")
        })
        .unwrap();
    }

    fn seed_post(db: &Database, id: &str, author: &str, title: &str) {
        db.with_conn(|conn| posts::insert_post(conn, id, author, title, "body", None, None))
            .unwrap();
    }

    #[test]
    fn comment_notifies_the_post_author() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "y", "yara");
        seed_user(&db, "x", "xavier");
        seed_post(&db, "p1", "y", "Hello");

        let row = create_comment_record(&db, "x", "xavier", "p1", "nice one").unwrap();
        assert_eq!(row.author_username, "xavier");

        db.with_conn(|conn| {
            let notes = notifications::notifications_for(conn, "y").unwrap();
            assert_eq!(notes.len(), 1);
            assert_eq!(notes[0].content, "xavier commented on your post: Hello");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn commenting_on_own_post_fires_no_notification() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "y", "yara");
        seed_post(&db, "p1", "y", "Hello");

        create_comment_record(&db, "y", "yara", "p1", "me again").unwrap();

        db.with_conn(|conn| {
            assert_eq!(notifications::notifications_for(conn, "y").unwrap().len(), 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn comment_on_missing_post_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "x", "xavier");
        let err = create_comment_record(&db, "x", "xavier", "nope", "hi").unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
