/// Database row types — these map directly to SQLite rows.
/// Distinct from the quill-types API models to keep the DB layer independent.

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub profile_picture: String,
    pub bio: Option<String>,
    pub theme: String,
    pub created_at: String,
}

/// Post joined with its author plus derived like/dislike/comment counts.
#[derive(Debug)]
pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub user_id: String,
    pub author_username: String,
    pub author_role: String,
    pub created_at: String,
    pub likes: i64,
    pub dislikes: i64,
    pub comment_count: i64,
}

#[derive(Debug)]
pub struct CommentRow {
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub author_username: String,
    pub post_id: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub content: String,
    pub sender_id: String,
    pub sender_username: String,
    pub recipient_id: String,
    pub recipient_username: String,
    pub read: bool,
    pub created_at: String,
}

/// A follow edge joined with the username on the far side.
pub struct FriendshipRow {
    pub user_id: String,
    pub username: String,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: String,
}

/// Report joined with reporter and reported usernames.
pub struct ReportRow {
    pub id: String,
    pub reporter_user_id: String,
    pub reporter_username: String,
    pub reported_user_id: Option<String>,
    pub reported_username: Option<String>,
    pub post_id: Option<String>,
    pub reason: String,
    pub status: String,
    pub created_at: String,
}
