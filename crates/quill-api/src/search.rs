use axum::{Json, extract::{Query, State}, response::IntoResponse};

use quill_db::{posts, users};
use quill_types::api::{SearchQuery, SearchResponse};

use crate::auth::AppState;
use crate::convert::{post_response, user_summary};
use crate::error::ApiError;
use crate::posts::join_err;
use crate::sanitize::sanitize;

/// GET /search?q= — substring match over posts (title/content) and usernames.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = sanitize(query.q.trim());
    if q.is_empty() {
        return Ok(Json(SearchResponse {
            posts: vec![],
            users: vec![],
        }));
    }

    let db = state.clone();
    let (post_rows, user_rows) = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            Ok((
                posts::posts_matching(conn, &q)?,
                users::users_matching(conn, &q)?,
            ))
        })
    })
    .await
    .map_err(join_err)??;

    Ok(Json(SearchResponse {
        posts: post_rows.into_iter().map(post_response).collect(),
        users: user_rows.into_iter().map(user_summary).collect(),
    }))
}
