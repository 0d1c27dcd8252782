use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::error;
use uuid::Uuid;

use quill_db::{Database, posts, social, users};
use quill_types::api::{Claims, ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::convert::{parse_role, parse_uuid, post_response};
use crate::error::ApiError;
use crate::posts::join_err;
use crate::sanitize::sanitize;

const MAX_BIO_CHARS: usize = 200;
const DEFAULT_PROFILE_PICTURE: &str = "default.jpg";

/// GET /profile/{user_id} — public profile with posts and derived counts.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = user_id.to_string();
    let (user, user_posts, followers, following) = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            let user = users::user_by_id(conn, &uid)?;
            match user {
                Some(user) => {
                    let posts = posts::posts_by_author(conn, &uid)?;
                    let followers = social::followers_count(conn, &uid)?;
                    let following = social::following_count(conn, &uid)?;
                    Ok((Some(user), posts, followers, following))
                }
                None => Ok((None, vec![], 0, 0)),
            }
        })
    })
    .await
    .map_err(join_err)??;

    let user = user.ok_or(ApiError::NotFound)?;

    Ok(Json(ProfileResponse {
        user_id: parse_uuid(&user.id),
        username: user.username,
        role: parse_role(&user.role),
        profile_picture: user.profile_picture,
        bio: user.bio,
        theme: user.theme,
        followers_count: followers as usize,
        following_count: following as usize,
        posts: user_posts.into_iter().map(post_response).collect(),
    }))
}

/// PUT /profile — edit the actor's bio, theme, and profile picture.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // truncate the raw bio first, then escape; mirrors the form's 200-char cap
    let bio = req
        .bio
        .as_deref()
        .map(|raw| sanitize(&raw.chars().take(MAX_BIO_CHARS).collect::<String>()));

    let picture = match &req.profile_picture {
        Some(upload) => {
            let bytes = B64
                .decode(&upload.data)
                .map_err(|_| ApiError::Validation("Media payload is not valid base64.".into()))?;
            Some(state.media.store_image(&upload.filename, &bytes).await?)
        }
        None => None,
    };

    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let theme = req.theme.clone();
    let new_picture = picture.clone();
    let bio_col = bio.clone();
    let previous = tokio::task::spawn_blocking(move || {
        update_profile_record(
            &db.db,
            &actor_id,
            bio_col.as_deref(),
            theme.as_deref(),
            new_picture.as_deref(),
        )
    })
    .await
    .map_err(join_err)??;

    // a replaced picture file is dead weight once the row points elsewhere
    if picture.is_some() && previous.profile_picture != DEFAULT_PROFILE_PICTURE {
        if let Err(e) = state.media.delete(&previous.profile_picture).await {
            error!(
                "Failed to delete replaced profile picture {}: {}",
                previous.profile_picture, e
            );
        }
    }

    Ok(Json(serde_json::json!({ "status": "updated" })))
}

/// Apply the partial update; returns the pre-update row so the caller can
/// retire a replaced picture file.
pub fn update_profile_record(
    db: &Database,
    user_id: &str,
    bio: Option<&str>,
    theme: Option<&str>,
    profile_picture: Option<&str>,
) -> Result<quill_db::models::UserRow, ApiError> {
    let previous = db
        .with_conn(|conn| users::user_by_id(conn, user_id))?
        .ok_or(ApiError::NotFound)?;

    db.with_tx(|conn| {
        users::update_profile(conn, user_id, bio, theme, profile_picture)?;
        Ok(())
    })?;

    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_user(db: &Database, id: &str, name: &str) {
        db.with_conn(|conn| {
            users::insert_user(conn, id, name, &format!("{name}@example.com"), "hash", "User")
        })
        .unwrap();
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice");

        update_profile_record(&db, "u1", Some("hello"), None, None).unwrap();

        db.with_conn(|conn| {
            let row = users::user_by_id(conn, "u1").unwrap().unwrap();
            assert_eq!(row.bio.as_deref(), Some("hello"));
            assert_eq!(row.theme, "light");
            assert_eq!(row.profile_picture, "default.jpg");
            Ok(())
        })
        .unwrap();

        update_profile_record(&db, "u1", None, Some("dark"), Some("pic.png")).unwrap();
        db.with_conn(|conn| {
            let row = users::user_by_id(conn, "u1").unwrap().unwrap();
            assert_eq!(row.bio.as_deref(), Some("hello"));
            assert_eq!(row.theme, "dark");
            assert_eq!(row.profile_picture, "pic.png");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn updating_missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = update_profile_record(&db, "ghost", Some("x"), None, None).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
