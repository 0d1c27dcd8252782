use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::error;
use uuid::Uuid;

use quill_db::models::PostRow;
use quill_db::{Database, comments, posts, social};
use quill_types::api::{Claims, CreatePostRequest, MediaUpload, PostDetailResponse, PostResponse};
use quill_types::models::Role;

use crate::auth::AppState;
use crate::convert::{comment_response, parse_role, post_response};
use crate::error::ApiError;
use crate::notify;
use crate::policy::{self, Action};
use crate::sanitize::sanitize;

/// GET / — every post, newest first.
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.with_conn(|conn| posts::all_posts(conn)))
        .await
        .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(post_response).collect::<Vec<_>>()))
}

/// GET /dashboard — Admins see every post, everyone else their own.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            if claims.role == Role::Admin {
                posts::all_posts(conn)
            } else {
                posts::posts_by_author(conn, &claims.sub.to_string())
            }
        })
    })
    .await
    .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(post_response).collect::<Vec<_>>()))
}

/// GET /posts/{id} — post with comments.
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (post, comment_rows) = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            let post = posts::post_by_id(conn, &post_id.to_string())?;
            let comments = match &post {
                Some(p) => comments::comments_for_post(conn, &p.id)?,
                None => vec![],
            };
            Ok((post, comments))
        })
    })
    .await
    .map_err(join_err)??;

    let post = post.ok_or(ApiError::NotFound)?;

    Ok(Json(PostDetailResponse {
        post: post_response(post),
        comments: comment_rows.into_iter().map(comment_response).collect(),
    }))
}

/// POST /posts — create a post and fan out to the author's followers.
///
/// Media is validated and stored before anything touches the database, so a
/// rejected upload leaves no partial writes behind.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !policy::may(claims.role, Action::CreatePost) {
        return Err(ApiError::Forbidden("Unauthorized".into()));
    }

    let title = sanitize(&req.title);
    let content = sanitize(&req.content);
    if title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required.".into()));
    }
    if content.trim().is_empty() {
        return Err(ApiError::Validation("Content is required.".into()));
    }

    let image = match &req.image {
        Some(upload) => Some(store_upload(&state, upload, MediaKind::Image).await?),
        None => None,
    };
    let video = match &req.video {
        Some(upload) => match store_upload(&state, upload, MediaKind::Video).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                // don't leave the already-stored image orphaned
                if let Some(reference) = &image {
                    if let Err(del) = state.media.delete(reference).await {
                        error!("Failed to clean up image {}: {}", reference, del);
                    }
                }
                return Err(e);
            }
        },
        None => None,
    };

    let db = state.clone();
    let author_id = claims.sub.to_string();
    let author_username = claims.username.clone();
    let row = tokio::task::spawn_blocking(move || {
        create_post_record(
            &db.db,
            &author_id,
            &author_username,
            &title,
            &content,
            image.as_deref(),
            video.as_deref(),
        )
    })
    .await
    .map_err(join_err)??;

    Ok((StatusCode::CREATED, Json(post_response(row))))
}

/// DELETE /posts/{id}.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let deleted = tokio::task::spawn_blocking(move || {
        delete_post_record(&db.db, claims.role, &actor_id, &post_id.to_string())
    })
    .await
    .map_err(join_err)??;

    // Media file removal is best-effort: the rows are already gone and a
    // failed unlink must not resurrect them.
    for reference in [deleted.image, deleted.video].into_iter().flatten() {
        if let Err(e) = state.media.delete(&reference).await {
            error!("Failed to delete media file {}: {}", reference, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Insert the post and notify every follower, as one transaction. A follower
/// whose notification insert fails is skipped, not fatal.
pub fn create_post_record(
    db: &Database,
    author_id: &str,
    author_username: &str,
    title: &str,
    content: &str,
    image: Option<&str>,
    video: Option<&str>,
) -> Result<PostRow, ApiError> {
    let post_id = Uuid::new_v4().to_string();
    let row = db.with_tx(|conn| {
        posts::insert_post(conn, &post_id, author_id, title, content, image, video)?;

        let message = notify::new_post_message(author_username, title);
        for follower_id in social::follower_ids(conn, author_id)? {
            notify::notify(conn, &follower_id, &message);
        }

        posts::post_by_id(conn, &post_id)?
            .ok_or_else(|| anyhow::anyhow!("post {} missing after insert", post_id))
    })?;
    Ok(row)
}

/// Policy-checked deletion. Returns the deleted row so the caller can clean
/// up its media files after the transaction commits.
pub fn delete_post_record(
    db: &Database,
    actor: Role,
    actor_id: &str,
    post_id: &str,
) -> Result<PostRow, ApiError> {
    let post = db
        .with_conn(|conn| posts::post_by_id(conn, post_id))?
        .ok_or(ApiError::NotFound)?;

    let author = parse_role(&post.author_role);
    let own = post.user_id == actor_id;
    if !policy::may(actor, Action::DeletePost { author, own }) {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete this post.".into(),
        ));
    }

    db.with_tx(|conn| posts::delete_post(conn, post_id))?;
    Ok(post)
}

enum MediaKind {
    Image,
    Video,
}

async fn store_upload(
    state: &AppState,
    upload: &MediaUpload,
    kind: MediaKind,
) -> Result<String, ApiError> {
    let bytes = B64
        .decode(&upload.data)
        .map_err(|_| ApiError::Validation("Media payload is not valid base64.".into()))?;
    let reference = match kind {
        MediaKind::Image => state.media.store_image(&upload.filename, &bytes).await?,
        MediaKind::Video => state.media.store_video(&upload.filename, &bytes).await?,
    };
    Ok(reference)
}

pub(crate) fn join_err(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::internal(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::{notifications, users};

    fn seed_user(db: &Database, id: &str, name: &str, role: &str) {
        db.with_conn(|conn| {
            users::insert_user(conn, id, name, &format!("{name}@example.com"), "hash", role)
        })
        .unwrap();
    }

    fn follow(db: &Database, id: &str, follower: &str, followed: &str) {
        db.with_conn(|conn| social::insert_follow(conn, id, follower, followed)).unwrap();
    }

    #[test]
    fn new_post_notifies_each_follower_exactly_once() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "x", "xavier", "User");
        seed_user(&db, "y", "yara", "Reader");
        seed_user(&db, "z", "zoe", "Reader");
        follow(&db, "f1", "y", "x");
        follow(&db, "f2", "z", "x");

        let row = create_post_record(&db, "x", "xavier", "Hello", "body", None, None).unwrap();
        assert_eq!(row.title, "Hello");
        assert_eq!(row.author_username, "xavier");

        db.with_conn(|conn| {
            for follower in ["y", "z"] {
                let notes = notifications::notifications_for(conn, follower).unwrap();
                assert_eq!(notes.len(), 1, "follower {follower}");
                assert_eq!(notes[0].content, "xavier posted a new blog: Hello");
            }
            // the author hears nothing
            assert_eq!(notifications::notifications_for(conn, "x").unwrap().len(), 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn post_without_followers_fans_out_to_nobody() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "x", "xavier", "Author");

        create_post_record(&db, "x", "xavier", "Quiet", "body", None, None).unwrap();

        let total: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM notifications", [], |r| r.get(0))
                    .map_err(Into::into)
            })
            .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn admin_cannot_delete_an_authors_post() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a", "arthur", "Author");
        seed_user(&db, "adm", "admin", "Admin");
        let row = create_post_record(&db, "a", "arthur", "Mine", "body", None, None).unwrap();

        let err = delete_post_record(&db, Role::Admin, "adm", &row.id).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        // the post remains
        db.with_conn(|conn| {
            assert!(posts::post_by_id(conn, &row.id).unwrap().is_some());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn admin_deletes_users_post_and_manager_deletes_anything() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u", "ursula", "User");
        seed_user(&db, "a", "arthur", "Author");
        seed_user(&db, "adm", "admin", "Admin");
        seed_user(&db, "mgr", "manager", "Manager");

        let by_user = create_post_record(&db, "u", "ursula", "One", "body", None, None).unwrap();
        let by_author = create_post_record(&db, "a", "arthur", "Two", "body", None, None).unwrap();

        delete_post_record(&db, Role::Admin, "adm", &by_user.id).unwrap();
        delete_post_record(&db, Role::Manager, "mgr", &by_author.id).unwrap();
    }

    #[test]
    fn owner_deletes_own_post_but_not_anothers() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "ursula", "User");
        seed_user(&db, "u2", "victor", "User");
        let row = create_post_record(&db, "u1", "ursula", "Mine", "body", None, None).unwrap();

        let err = delete_post_record(&db, Role::User, "u2", &row.id).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        delete_post_record(&db, Role::User, "u1", &row.id).unwrap();
        let err = delete_post_record(&db, Role::User, "u1", &row.id).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
