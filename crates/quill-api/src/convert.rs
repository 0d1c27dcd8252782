//! Row-to-response mapping. Stored ids and roles are trusted but not blindly:
//! corrupt values degrade with a warning instead of failing the response.

use tracing::warn;
use uuid::Uuid;

use quill_db::models::{
    CommentRow, FriendshipRow, MessageRow, NotificationRow, PostRow, ReportRow, UserRow,
};
use quill_types::api::{
    CommentResponse, FriendEntry, MessageResponse, NotificationResponse, PostResponse,
    ReportResponse, UserSummary,
};
use quill_types::models::{ReportStatus, Role};
use quill_types::time::parse_db_timestamp;

pub(crate) fn parse_uuid(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_role(raw: &str) -> Role {
    Role::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt role '{}', treating as Reader", raw);
        Role::Reader
    })
}

pub(crate) fn parse_status(raw: &str) -> ReportStatus {
    ReportStatus::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt report status '{}', treating as Pending", raw);
        ReportStatus::Pending
    })
}

pub(crate) fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: parse_uuid(&row.id),
        title: row.title,
        content: row.content,
        image: row.image,
        video: row.video,
        author_id: parse_uuid(&row.user_id),
        author_username: row.author_username,
        created_at: parse_db_timestamp(&row.created_at),
        likes: row.likes as usize,
        dislikes: row.dislikes as usize,
        comment_count: row.comment_count as usize,
    }
}

pub(crate) fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_uuid(&row.id),
        content: row.content,
        author_id: parse_uuid(&row.user_id),
        author_username: row.author_username,
        created_at: parse_db_timestamp(&row.created_at),
    }
}

pub(crate) fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_uuid(&row.id),
        content: row.content,
        sender_id: parse_uuid(&row.sender_id),
        sender_username: row.sender_username,
        recipient_id: parse_uuid(&row.recipient_id),
        recipient_username: row.recipient_username,
        read: row.read,
        created_at: parse_db_timestamp(&row.created_at),
    }
}

pub(crate) fn friend_entry(row: FriendshipRow) -> FriendEntry {
    FriendEntry {
        user_id: parse_uuid(&row.user_id),
        username: row.username,
        since: parse_db_timestamp(&row.created_at),
    }
}

pub(crate) fn notification_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: parse_uuid(&row.id),
        content: row.content,
        read: row.read,
        created_at: parse_db_timestamp(&row.created_at),
    }
}

pub(crate) fn report_response(row: ReportRow) -> ReportResponse {
    ReportResponse {
        id: parse_uuid(&row.id),
        reporter_username: row.reporter_username,
        reported_username: row.reported_username,
        post_id: row.post_id.as_deref().map(parse_uuid),
        reason: row.reason,
        status: parse_status(&row.status),
        created_at: parse_db_timestamp(&row.created_at),
    }
}

pub(crate) fn user_summary(row: UserRow) -> UserSummary {
    UserSummary {
        id: parse_uuid(&row.id),
        username: row.username,
        role: parse_role(&row.role),
    }
}
