use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};
use uuid::Uuid;

use quill_db::models::UserRow;
use quill_db::{Database, posts, reports, users};
use quill_types::api::{
    Claims, CreateAdminRequest, CreateReportRequest, SetReportStatusRequest, UserSummary,
};
use quill_types::models::{ReportStatus, Role};

use crate::auth::{self, AppState};
use crate::convert::{parse_role, post_response, report_response, user_summary};
use crate::error::ApiError;
use crate::policy::{self, Action};
use crate::posts::join_err;
use crate::sanitize::sanitize;

const DEFAULT_PROFILE_PICTURE: &str = "default.jpg";

// -- Reports --

/// POST /reports/post/{id} — the reported identity is implicitly the post's
/// author.
pub async fn report_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let reporter_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        report_post_record(&db.db, &reporter_id, &post_id.to_string(), &req.reason)
    })
    .await
    .map_err(join_err)??;

    Ok(StatusCode::CREATED)
}

/// POST /reports/user/{id}.
pub async fn report_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let reporter_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        report_user_record(&db.db, &reporter_id, &user_id.to_string(), &req.reason)
    })
    .await
    .map_err(join_err)??;

    Ok(StatusCode::CREATED)
}

/// GET /admin/reports — reports joined with reporter/reported names.
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_moderator(claims.role)?;

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.with_conn(|conn| reports::all_reports(conn)))
        .await
        .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(report_response).collect::<Vec<_>>()))
}

/// PUT /admin/reports/{id} — manual status transition by a moderator.
pub async fn set_report_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<SetReportStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_moderator(claims.role)?;

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        set_report_status_record(&db.db, &report_id.to_string(), req.status)
    })
    .await
    .map_err(join_err)??;

    Ok(StatusCode::NO_CONTENT)
}

// -- Moderation views --

/// GET /admin/users.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_moderator(claims.role)?;

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.with_conn(|conn| users::all_users(conn)))
        .await
        .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(user_summary).collect::<Vec<UserSummary>>()))
}

/// GET /admin/posts.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_moderator(claims.role)?;

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.with_conn(|conn| posts::all_posts(conn)))
        .await
        .map_err(join_err)??;

    Ok(Json(rows.into_iter().map(post_response).collect::<Vec<_>>()))
}

// -- Account administration --

/// DELETE /users/{id} — role-gated account deletion with full cascade.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor_username = claims.username.clone();
    let deleted = tokio::task::spawn_blocking(move || {
        delete_user_record(&db.db, claims.role, &user_id.to_string())
    })
    .await
    .map_err(join_err)??;

    info!("User {} deleted by {}", deleted.username, actor_username);

    // The profile picture is external state; its removal must not undo the
    // committed deletion.
    if deleted.profile_picture != DEFAULT_PROFILE_PICTURE {
        if let Err(e) = state.media.delete(&deleted.profile_picture).await {
            error!("Error deleting profile picture: {}", e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/admins — Manager-only creation of Admin accounts. No shared
/// secret here; the role check is the gate.
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !policy::may(claims.role, Action::CreateAdmin) {
        return Err(ApiError::Forbidden("Only Managers can create Admins.".into()));
    }

    let db = state.clone();
    let user_id = tokio::task::spawn_blocking(move || create_admin_record(&db.db, &req))
        .await
        .map_err(join_err)??;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "user_id": user_id }))))
}

// -- Core operations --

pub fn report_post_record(
    db: &Database,
    reporter_id: &str,
    post_id: &str,
    reason: &str,
) -> Result<(), ApiError> {
    let reason = validate_reason(reason)?;

    let post = db
        .with_conn(|conn| posts::post_by_id(conn, post_id))?
        .ok_or(ApiError::NotFound)?;

    db.with_tx(|conn| {
        reports::insert_report(
            conn,
            &Uuid::new_v4().to_string(),
            reporter_id,
            Some(&post.user_id),
            Some(post_id),
            &reason,
        )
    })?;
    Ok(())
}

pub fn report_user_record(
    db: &Database,
    reporter_id: &str,
    user_id: &str,
    reason: &str,
) -> Result<(), ApiError> {
    let reason = validate_reason(reason)?;

    db.with_conn(|conn| users::user_by_id(conn, user_id))?
        .ok_or(ApiError::NotFound)?;

    db.with_tx(|conn| {
        reports::insert_report(
            conn,
            &Uuid::new_v4().to_string(),
            reporter_id,
            Some(user_id),
            None,
            &reason,
        )
    })?;
    Ok(())
}

pub fn set_report_status_record(
    db: &Database,
    report_id: &str,
    status: ReportStatus,
) -> Result<(), ApiError> {
    let updated = db.with_tx(|conn| reports::set_status(conn, report_id, status.as_str()))?;
    if updated == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

/// Policy-checked account deletion. Returns the deleted row so the caller can
/// clean up the profile picture after commit.
pub fn delete_user_record(db: &Database, actor: Role, target_id: &str) -> Result<UserRow, ApiError> {
    let target = db
        .with_conn(|conn| users::user_by_id(conn, target_id))?
        .ok_or(ApiError::NotFound)?;

    let target_role = parse_role(&target.role);
    if !policy::may(actor, Action::DeleteUser { target: target_role }) {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete this user.".into(),
        ));
    }

    db.with_tx(|conn| users::delete_user(conn, target_id))?;
    Ok(target)
}

pub fn create_admin_record(db: &Database, req: &CreateAdminRequest) -> Result<Uuid, ApiError> {
    auth::validate_new_account(db, &req.username, &req.email, &req.password)?;

    let password_hash = auth::hash_password(&req.password)?;
    let user_id = Uuid::new_v4();
    db.with_conn(|conn| {
        users::insert_user(
            conn,
            &user_id.to_string(),
            &req.username,
            &req.email,
            &password_hash,
            Role::Admin.as_str(),
        )
    })?;
    Ok(user_id)
}

fn require_moderator(actor: Role) -> Result<(), ApiError> {
    if !policy::may(actor, Action::Moderate) {
        return Err(ApiError::Forbidden("Unauthorized access".into()));
    }
    Ok(())
}

fn validate_reason(reason: &str) -> Result<String, ApiError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(
            "Please provide a reason for reporting.".into(),
        ));
    }
    Ok(sanitize(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_user(db: &Database, id: &str, name: &str, role: &str) {
        db.with_conn(|conn| {
            users::insert_user(conn, id, name, &format!("{name}@example.com"), "hash", role)
        })
        .unwrap();
    }

    fn seed_post(db: &Database, id: &str, author: &str) {
        db.with_conn(|conn| posts::insert_post(conn, id, author, "Hello", "body", None, None))
            .unwrap();
    }

    #[test]
    fn empty_reason_rejected_and_nothing_persisted() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "r", "rita", "User");
        seed_user(&db, "t", "tom", "User");
        seed_post(&db, "p1", "t");

        for reason in ["", "   "] {
            let err = report_post_record(&db, "r", "p1", reason).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
            let err = report_user_record(&db, "r", "t", reason).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }

        db.with_conn(|conn| {
            assert_eq!(reports::count_reports(conn).unwrap(), 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn post_report_records_the_posts_author_as_reported() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "r", "rita", "User");
        seed_user(&db, "t", "tom", "Author");
        seed_post(&db, "p1", "t");

        report_post_record(&db, "r", "p1", "spam").unwrap();

        db.with_conn(|conn| {
            let rows = reports::all_reports(conn).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].reporter_username, "rita");
            assert_eq!(rows[0].reported_username.as_deref(), Some("tom"));
            assert_eq!(rows[0].post_id.as_deref(), Some("p1"));
            assert_eq!(rows[0].status, "Pending");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn status_transitions_are_manual_and_checked() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "r", "rita", "User");
        seed_user(&db, "t", "tom", "User");
        report_user_record(&db, "r", "t", "abuse").unwrap();

        let report_id = db
            .with_conn(|conn| Ok(reports::all_reports(conn)?[0].id.clone()))
            .unwrap();

        set_report_status_record(&db, &report_id, ReportStatus::Reviewed).unwrap();
        db.with_conn(|conn| {
            assert_eq!(reports::all_reports(conn).unwrap()[0].status, "Reviewed");
            Ok(())
        })
        .unwrap();

        let err = set_report_status_record(&db, "missing", ReportStatus::Dismissed).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn user_deletion_respects_the_role_matrix() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u", "ursula", "User");
        seed_user(&db, "a", "arthur", "Author");
        seed_user(&db, "m1", "maude", "Manager");
        seed_user(&db, "m2", "marvin", "Manager");

        // Admin may only delete Users
        let err = delete_user_record(&db, Role::Admin, "a").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        delete_user_record(&db, Role::Admin, "u").unwrap();

        // Manager may delete anyone but a Manager
        let err = delete_user_record(&db, Role::Manager, "m2").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        delete_user_record(&db, Role::Manager, "a").unwrap();

        let err = delete_user_record(&db, Role::User, "m1").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn create_admin_validates_like_registration() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "m", "maude", "Manager");

        let req = CreateAdminRequest {
            username: "admin2".into(),
            email: "maude@example.com".into(),
            password: "pw".into(),
        };
        let err = create_admin_record(&db, &req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let req = CreateAdminRequest {
            username: "admin2".into(),
            email: "admin2@example.com".into(),
            password: "pw".into(),
        };
        let id = create_admin_record(&db, &req).unwrap();
        db.with_conn(|conn| {
            let row = users::user_by_id(conn, &id.to_string()).unwrap().unwrap();
            assert_eq!(row.role, "Admin");
            Ok(())
        })
        .unwrap();
    }
}
