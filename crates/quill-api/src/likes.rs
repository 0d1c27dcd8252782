use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use quill_db::{Database, comments, likes, posts};
use quill_types::api::{Claims, LikeCountsResponse, LikeRequest};
use quill_types::models::LikeAction;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::notify;
use crate::posts::join_err;

/// POST /posts/{id}/likes — toggle a like/dislike and return updated counts.
pub async fn toggle_post_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<LikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let actor_username = claims.username.clone();
    let (likes, dislikes) = tokio::task::spawn_blocking(move || {
        toggle_post_like_record(&db.db, &actor_id, &actor_username, &post_id.to_string(), req.action)
    })
    .await
    .map_err(join_err)??;

    Ok(Json(LikeCountsResponse {
        likes: likes as usize,
        dislikes: dislikes as usize,
    }))
}

/// POST /comments/{id}/likes — same toggle against a comment.
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<LikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let (likes, dislikes) = tokio::task::spawn_blocking(move || {
        toggle_comment_like_record(&db.db, &actor_id, &comment_id.to_string(), req.action)
    })
    .await
    .map_err(join_err)??;

    Ok(Json(LikeCountsResponse {
        likes: likes as usize,
        dislikes: dislikes as usize,
    }))
}

/// Toggle semantics: an existing row by this user on this post is removed no
/// matter which action was requested; only a fresh insert notifies the
/// author (and never for self-likes).
pub fn toggle_post_like_record(
    db: &Database,
    actor_id: &str,
    actor_username: &str,
    post_id: &str,
    action: LikeAction,
) -> Result<(i64, i64), ApiError> {
    let post = db
        .with_conn(|conn| posts::post_by_id(conn, post_id))?
        .ok_or(ApiError::NotFound)?;

    let counts = db.with_tx(|conn| {
        let added = likes::toggle_post_like(
            conn,
            &Uuid::new_v4().to_string(),
            actor_id,
            post_id,
            action.is_like(),
        )?;

        if added && post.user_id != actor_id {
            notify::notify(
                conn,
                &post.user_id,
                &notify::like_message(actor_username, action.verb(), &post.title),
            );
        }

        likes::post_like_counts(conn, post_id)
    })?;
    Ok(counts)
}

/// Comment likes toggle the same way but fan out no notification.
pub fn toggle_comment_like_record(
    db: &Database,
    actor_id: &str,
    comment_id: &str,
    action: LikeAction,
) -> Result<(i64, i64), ApiError> {
    db.with_conn(|conn| comments::comment_by_id(conn, comment_id))?
        .ok_or(ApiError::NotFound)?;

    let counts = db.with_tx(|conn| {
        likes::toggle_comment_like(
            conn,
            &Uuid::new_v4().to_string(),
            actor_id,
            comment_id,
            action.is_like(),
        )?;
        likes::comment_like_counts(conn, comment_id)
    })?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::{notifications, users};

    fn seed(db: &Database) {
        db.with_conn(|conn| {
            users::insert_user(conn, "y", "yara", "y@example.com", "hash", "Author")?;
            users::insert_user(conn, "x", "xavier", "x@example.com", "hash", "User")?;
            posts::insert_post(conn, "p1", "y", "Hello", "body", None, None)?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn like_then_like_again_toggles_off() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        let counts =
            toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Like).unwrap();
        assert_eq!(counts, (1, 0));

        let counts =
            toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Like).unwrap();
        assert_eq!(counts, (0, 0));
    }

    #[test]
    fn dislike_on_existing_like_removes_it_instead_of_flipping() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Like).unwrap();
        let counts =
            toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Dislike).unwrap();
        assert_eq!(counts, (0, 0));
    }

    #[test]
    fn only_a_fresh_like_notifies_the_author() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Like).unwrap();
        toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Like).unwrap();
        toggle_post_like_record(&db, "x", "xavier", "p1", LikeAction::Dislike).unwrap();

        db.with_conn(|conn| {
            let notes = notifications::notifications_for(conn, "y").unwrap();
            // one for the first like, one for the fresh dislike; toggle-offs are silent
            assert_eq!(notes.len(), 2);
            assert_eq!(notes.iter().filter(|n| n.content == "xavier liked your post: Hello").count(), 1);
            assert_eq!(notes.iter().filter(|n| n.content == "xavier disliked your post: Hello").count(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn liking_own_post_is_silent() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        toggle_post_like_record(&db, "y", "yara", "p1", LikeAction::Like).unwrap();

        db.with_conn(|conn| {
            assert_eq!(notifications::notifications_for(conn, "y").unwrap().len(), 0);
            Ok(())
        })
        .unwrap();
    }
}
