use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use quill_db::{Database, users};
use quill_db::models::UserRow;
use quill_media::MediaStore;
use quill_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use quill_types::models::Role;

use crate::convert::parse_role;
use crate::error::ApiError;
use crate::policy;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub media: MediaStore,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = register_user(&state.db, &req)?;

    let token = create_token(&state.jwt_secret, user_id, &req.username, req.role)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

/// Validate and create the account. The role is fixed here for the lifetime
/// of the identity; privileged roles are gated by `policy::may_register`.
pub fn register_user(db: &Database, req: &RegisterRequest) -> Result<Uuid, ApiError> {
    validate_new_account(db, &req.username, &req.email, &req.password)?;

    if !policy::may_register(req.role, &req.password) {
        return Err(ApiError::Validation(format!(
            "Invalid password for {} role.",
            req.role
        )));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    db.with_conn(|conn| {
        users::insert_user(
            conn,
            &user_id.to_string(),
            &req.username,
            &req.email,
            &password_hash,
            req.role.as_str(),
        )
    })?;

    Ok(user_id)
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = verify_login(&state.db, &req.email, &req.password)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id: {}", e)))?;
    let role = parse_role(&user.role);

    let token = create_token(&state.jwt_secret, user_id, &user.username, role)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        role,
        token,
    }))
}

/// Look the account up by email and check the password. Both failure modes
/// collapse into the same Unauthorized so the response does not leak which
/// emails are registered.
pub fn verify_login(db: &Database, email: &str, password: &str) -> Result<UserRow, ApiError> {
    let user = db
        .with_conn(|conn| users::user_by_email(conn, email))?
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(user)
}

/// Field and uniqueness checks shared by self-registration and the
/// Manager-only admin creation path.
pub(crate) fn validate_new_account(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::Validation("Username is required.".into()));
    }
    if email.trim().is_empty() {
        return Err(ApiError::Validation("Email is required.".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("Enter a valid email address.".into()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required.".into()));
    }

    if db
        .with_conn(|conn| users::user_by_email(conn, email))?
        .is_some()
    {
        return Err(ApiError::Validation(
            "Email already registered. Please use a different email.".into(),
        ));
    }
    if db
        .with_conn(|conn| users::user_by_username(conn, username))?
        .is_some()
    {
        return Err(ApiError::Validation(
            "Username already taken. Please choose a different username.".into(),
        ));
    }

    Ok(())
}

/// Hash with Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn create_token(secret: &str, user_id: Uuid, username: &str, role: Role) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(ApiError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, email: &str, password: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    #[test]
    fn register_then_login_round_trip() {
        let db = Database::open_in_memory().unwrap();
        register_user(&db, &req("alice", "alice@example.com", "hunter22", Role::Author)).unwrap();

        let user = verify_login(&db, "alice@example.com", "hunter22").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, "Author");

        let err = verify_login(&db, "alice@example.com", "wrong").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        let err = verify_login(&db, "nobody@example.com", "hunter22").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn duplicate_email_and_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        register_user(&db, &req("alice", "alice@example.com", "pw", Role::User)).unwrap();

        let err =
            register_user(&db, &req("bob", "alice@example.com", "pw", Role::User)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("Email already registered")));

        let err =
            register_user(&db, &req("alice", "other@example.com", "pw", Role::User)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("Username already taken")));
    }

    #[test]
    fn privileged_roles_gated_by_shared_secret() {
        let db = Database::open_in_memory().unwrap();

        let err =
            register_user(&db, &req("eve", "eve@example.com", "guess", Role::Admin)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "Invalid password for Admin role."));

        register_user(&db, &req("root", "root@example.com", "Admin!", Role::Admin)).unwrap();
        register_user(&db, &req("boss", "boss@example.com", "Manager!", Role::Manager)).unwrap();

        let boss = verify_login(&db, "boss@example.com", "Manager!").unwrap();
        assert_eq!(boss.role, "Manager");
    }
}
