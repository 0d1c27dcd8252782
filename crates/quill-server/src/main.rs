use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_api::auth::{self, AppState, AppStateInner};
use quill_api::middleware::require_auth;
use quill_api::{comments, likes, messages, moderation, notifications, posts, profile, search, social};
use quill_media::{FfprobeProbe, MediaStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUILL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let media_dir = std::env::var("QUILL_MEDIA_DIR").unwrap_or_else(|_| "./uploads".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init storage
    let db = quill_db::Database::open(&PathBuf::from(&db_path))?;
    let media = MediaStore::new(PathBuf::from(&media_dir), Arc::new(FfprobeProbe))
        .await
        .map_err(|e| anyhow::anyhow!("media store init failed: {}", e))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        media,
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/", get(posts::index))
        .route("/posts/{post_id}", get(posts::get_post))
        .route("/profile/{user_id}", get(profile::get_profile))
        .route("/search", get(search::search))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/dashboard", get(posts::dashboard))
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}", delete(posts::delete_post))
        .route("/posts/{post_id}/comments", post(comments::create_comment))
        .route("/posts/{post_id}/likes", post(likes::toggle_post_like))
        .route("/comments/{comment_id}/likes", post(likes::toggle_comment_like))
        .route("/follow/{user_id}", post(social::follow))
        .route("/follow/{user_id}", delete(social::unfollow))
        .route("/friends", get(social::friends))
        .route("/messages", post(messages::send_message))
        .route("/inbox", get(messages::inbox))
        .route("/conversations/{user_id}", get(messages::conversation))
        .route("/notifications", get(notifications::list_notifications))
        .route("/profile", put(profile::update_profile))
        .route("/reports/post/{post_id}", post(moderation::report_post))
        .route("/reports/user/{user_id}", post(moderation::report_user))
        .route("/users/{user_id}", delete(moderation::delete_user))
        .route("/admin/users", get(moderation::list_users))
        .route("/admin/posts", get(moderation::list_posts))
        .route("/admin/reports", get(moderation::list_reports))
        .route("/admin/reports/{report_id}", put(moderation::set_report_status))
        .route("/admin/admins", post(moderation::create_admin))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quill server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
