//! Auth Handlers
//!
//! Registration, login and the current-user endpoint. Login failures
//! return one unified message regardless of whether the email exists,
//! to prevent account enumeration.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserCreate, UserLogin, UserResponse, UserRole};
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::{AppError, AppResult, ok, ok_with_message};

/// Token response returned by login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

/// POST /api/v1/auth/register - create a Customer account
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let repo = UserRepository::new(state.pool().clone());

    if repo.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Email {} is already registered",
            payload.email
        )));
    }

    let password_hash = crate::db::models::User::hash_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

    let user = repo
        .create(&payload.name, &payload.email, &password_hash, UserRole::Customer)
        .await?;

    security_log!("INFO", "user_registered", user_id = user.id, email = user.email.clone());

    Ok((
        StatusCode::CREATED,
        ok_with_message(UserResponse::from(user), "User registered"),
    ))
}

/// POST /api/v1/auth/login - verify credentials, issue a JWT
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<UserLogin>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let repo = UserRepository::new(state.pool().clone());

    let user = match repo.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => {
            security_log!("WARN", "login_failed", email = payload.email.clone());
            return Err(AppError::invalid_credentials());
        }
    };

    let password_valid = user
        .verify_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

    if !password_valid {
        security_log!("WARN", "login_failed", email = payload.email.clone());
        return Err(AppError::invalid_credentials());
    }

    if !user.is_active {
        security_log!("WARN", "login_disabled_account", user_id = user.id);
        return Err(AppError::forbidden("Account has been disabled"));
    }

    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    security_log!("INFO", "login_success", user_id = user.id, email = user.email.clone());

    Ok(ok(LoginResponse {
        token,
        token_type: "Bearer",
        user: UserResponse::from(user),
    }))
}

/// GET /api/v1/auth/me - the authenticated user's profile
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let repo = UserRepository::new(state.pool().clone());
    let user = repo
        .find_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", current.id)))?;

    Ok(ok(UserResponse::from(user)))
}
