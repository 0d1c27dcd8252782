use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quill_db::{Database, social, users};
use quill_types::api::{Claims, FriendsResponse};

use crate::auth::AppState;
use crate::convert::friend_entry;
use crate::error::ApiError;
use crate::notify;
use crate::posts::join_err;

/// POST /follow/{user_id}.
pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let actor_username = claims.username.clone();
    tokio::task::spawn_blocking(move || {
        follow_user(&db.db, &actor_id, &actor_username, &user_id.to_string())
    })
    .await
    .map_err(join_err)??;

    Ok(Json(serde_json::json!({ "status": "success" })))
}

/// DELETE /follow/{user_id}.
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || unfollow_user(&db.db, &actor_id, &user_id.to_string()))
        .await
        .map_err(join_err)??;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /friends — who the actor follows and who follows the actor.
pub async fn friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let (following, followers) = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            Ok((
                social::following_of(conn, &actor_id)?,
                social::followers_of(conn, &actor_id)?,
            ))
        })
    })
    .await
    .map_err(join_err)??;

    Ok(Json(FriendsResponse {
        following: following.into_iter().map(friend_entry).collect(),
        followers: followers.into_iter().map(friend_entry).collect(),
    }))
}

/// Create the follow edge. Self-follows are invalid; an existing edge makes
/// this an idempotent no-op that does NOT re-notify. Returns whether a new
/// edge was created.
pub fn follow_user(
    db: &Database,
    actor_id: &str,
    actor_username: &str,
    target_id: &str,
) -> Result<bool, ApiError> {
    if actor_id == target_id {
        return Err(ApiError::Validation("Cannot follow yourself".into()));
    }

    db.with_conn(|conn| users::user_by_id(conn, target_id))?
        .ok_or(ApiError::NotFound)?;

    let created = db.with_tx(|conn| {
        if social::edge_exists(conn, actor_id, target_id)? {
            return Ok(false);
        }
        social::insert_follow(conn, &Uuid::new_v4().to_string(), actor_id, target_id)?;
        notify::notify(conn, target_id, &notify::follow_message(actor_username));
        Ok(true)
    })?;
    Ok(created)
}

/// Remove the edge if present; success either way.
pub fn unfollow_user(db: &Database, actor_id: &str, target_id: &str) -> Result<(), ApiError> {
    db.with_tx(|conn| social::delete_follow(conn, actor_id, target_id))?;
    Ok(())
}
