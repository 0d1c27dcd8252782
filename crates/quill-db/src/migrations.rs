use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            role            TEXT NOT NULL DEFAULT 'Reader',
            profile_picture TEXT NOT NULL DEFAULT 'default.jpg',
            bio             TEXT,
            theme           TEXT NOT NULL DEFAULT 'light',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            image       TEXT,
            video       TEXT,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_author
            ON posts(user_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            content     TEXT NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);

        -- A like targets exactly one of a post or a comment.
        CREATE TABLE IF NOT EXISTS likes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            post_id     TEXT REFERENCES posts(id) ON DELETE CASCADE,
            comment_id  TEXT REFERENCES comments(id) ON DELETE CASCADE,
            is_like     INTEGER NOT NULL,
            CHECK ((post_id IS NULL) != (comment_id IS NULL))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_user_post
            ON likes(user_id, post_id) WHERE post_id IS NOT NULL;

        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_user_comment
            ON likes(user_id, comment_id) WHERE comment_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            content         TEXT NOT NULL,
            sender_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recipient_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            read            INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_id, created_at);

        CREATE TABLE IF NOT EXISTS friendships (
            id          TEXT PRIMARY KEY,
            follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followed_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(follower_id, followed_id)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_followed
            ON friendships(followed_id);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);

        -- A report targets a user, a post, or both (post reports also record
        -- the post's author as the reported user).
        CREATE TABLE IF NOT EXISTS reports (
            id                TEXT PRIMARY KEY,
            reporter_user_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reported_user_id  TEXT REFERENCES users(id) ON DELETE CASCADE,
            post_id           TEXT REFERENCES posts(id) ON DELETE CASCADE,
            reason            TEXT NOT NULL,
            status            TEXT NOT NULL DEFAULT 'Pending',
            created_at        TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (reported_user_id IS NOT NULL OR post_id IS NOT NULL)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
