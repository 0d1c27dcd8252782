use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quill_db::models::UserRow;
use quill_db::{Database, messages, users};
use quill_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::convert::{message_response, parse_uuid};
use crate::error::ApiError;
use crate::notify;
use crate::posts::join_err;
use crate::sanitize::sanitize;

/// POST /messages — send a direct message.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = sanitize(&req.content);
    if content.trim().is_empty() {
        return Err(ApiError::Validation("Message text is required.".into()));
    }

    let db = state.clone();
    let sender_id = claims.sub.to_string();
    let sender_username = claims.username.clone();
    let body = content.clone();
    let (message_id, recipient) = tokio::task::spawn_blocking(move || {
        send_message_record(
            &db.db,
            &sender_id,
            &sender_username,
            &req.recipient_id.to_string(),
            &body,
        )
    })
    .await
    .map_err(join_err)??;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            id: message_id,
            content,
            sender_id: claims.sub,
            sender_username: claims.username,
            recipient_id: parse_uuid(&recipient.id),
            recipient_username: recipient.username,
            read: false,
            created_at: chrono::Utc::now(),
        }),
    ))
}

/// GET /inbox — everything sent or received, newest first.
pub async fn inbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let rows =
        tokio::task::spawn_blocking(move || db.db.with_conn(|conn| messages::inbox_for(conn, &actor_id)))
            .await
            .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(message_response).collect::<Vec<_>>()))
}

/// GET /conversations/{user_id} — the exchange with one counterpart, oldest
/// first. Opening the conversation marks the actor's received messages read.
pub async fn conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_id = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || {
        conversation_record(&db.db, &actor_id, &user_id.to_string())
    })
    .await
    .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(message_response).collect::<Vec<_>>()))
}

/// Persist the message and notify the recipient in one transaction. Returns
/// the new message id and the recipient for response assembly.
pub fn send_message_record(
    db: &Database,
    sender_id: &str,
    sender_username: &str,
    recipient_id: &str,
    content: &str,
) -> Result<(Uuid, UserRow), ApiError> {
    let recipient = db
        .with_conn(|conn| users::user_by_id(conn, recipient_id))?
        .ok_or(ApiError::NotFound)?;

    let message_id = Uuid::new_v4();
    db.with_tx(|conn| {
        messages::insert_message(conn, &message_id.to_string(), sender_id, recipient_id, content)?;
        notify::notify(conn, recipient_id, &notify::message_message(sender_username));
        Ok(())
    })?;

    Ok((message_id, recipient))
}

pub fn conversation_record(
    db: &Database,
    actor_id: &str,
    other_id: &str,
) -> Result<Vec<quill_db::models::MessageRow>, ApiError> {
    db.with_conn(|conn| users::user_by_id(conn, other_id))?
        .ok_or(ApiError::NotFound)?;

    let rows = db.with_tx(|conn| {
        messages::mark_conversation_read(conn, actor_id, other_id)?;
        messages::conversation(conn, actor_id, other_id)
    })?;
    Ok(rows)
}
