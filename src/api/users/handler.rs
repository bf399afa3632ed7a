//! User Handlers
//!
//! Access rules:
//! - list: admin
//! - get / update: self or admin
//! - password change: self only, current password verified
//! - role / status change: admin, never on yourself
//! - delete: admin, never on yourself, blocked while orders exist

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum::Json;
use validator::Validate;

use crate::auth::{AdminUser, CurrentUser};
use crate::core::ServerState;
use crate::db::models::{
    User, UserFilter, UserResponse, UserUpdate, UserUpdatePassword, UserUpdateRole,
    UserUpdateStatus,
};
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::{ApiResponse, AppError, AppResult, PageParams, ok, ok_with_message, paginated};

fn repo(state: &ServerState) -> UserRepository {
    UserRepository::new(state.pool().clone())
}

async fn require_user(repo: &UserRepository, id: i64) -> AppResult<User> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))
}

/// GET /api/v1/users - paginated listing (admin)
pub async fn list(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    page.validate()?;

    let (users, total) = repo(&state).list(&filter, &page).await?;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();

    Ok(paginated(users, total, page.page, page.page_size))
}

/// GET /api/v1/users/:id - self or admin
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if current.id != id && !current.is_admin() {
        return Err(AppError::forbidden("You can only view your own profile"));
    }

    let user = require_user(&repo(&state), id).await?;
    Ok(ok(UserResponse::from(user)))
}

/// PUT /api/v1/users/:id - self or admin
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    if current.id != id && !current.is_admin() {
        return Err(AppError::forbidden("You can only update your own profile"));
    }

    let repo = repo(&state);
    require_user(&repo, id).await?;

    if let Some(email) = &payload.email {
        if let Some(other) = repo.find_by_email(email).await? {
            if other.id != id {
                return Err(AppError::conflict(format!("Email {} is already in use", email)));
            }
        }
    }

    let user = repo.update(id, &payload).await?;
    Ok(ok(UserResponse::from(user)))
}

/// PATCH /api/v1/users/:id/password - self only
pub async fn update_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdatePassword>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    if current.id != id {
        return Err(AppError::forbidden("You can only change your own password"));
    }

    let repo = repo(&state);
    let user = require_user(&repo, id).await?;

    let current_valid = user
        .verify_password(&payload.current_password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !current_valid {
        security_log!("WARN", "password_change_rejected", user_id = id);
        return Err(AppError::invalid_state("Current password is incorrect"));
    }

    let new_hash = User::hash_password(&payload.new_password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;
    let user = repo.set_password(id, &new_hash).await?;

    security_log!("INFO", "password_changed", user_id = id);

    Ok(ok_with_message(UserResponse::from(user), "Password updated"))
}

/// PATCH /api/v1/users/:id/role - admin, not on yourself
pub async fn update_role(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdateRole>,
) -> AppResult<impl IntoResponse> {
    if admin.id == id {
        return Err(AppError::invalid_state("You cannot change your own role"));
    }

    let repo = repo(&state);
    require_user(&repo, id).await?;
    let user = repo.set_role(id, payload.role).await?;

    security_log!(
        "INFO",
        "role_changed",
        user_id = id,
        role = payload.role.as_str(),
        changed_by = admin.id
    );

    Ok(ok(UserResponse::from(user)))
}

/// PATCH /api/v1/users/:id/status - admin, not on yourself
pub async fn update_status(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdateStatus>,
) -> AppResult<impl IntoResponse> {
    if admin.id == id {
        return Err(AppError::invalid_state("You cannot change your own status"));
    }

    let repo = repo(&state);
    require_user(&repo, id).await?;
    let user = repo.set_status(id, payload.is_active).await?;

    security_log!(
        "INFO",
        "status_changed",
        user_id = id,
        is_active = payload.is_active,
        changed_by = admin.id
    );

    Ok(ok(UserResponse::from(user)))
}

/// DELETE /api/v1/users/:id - admin, not on yourself, no orders
pub async fn delete(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    if admin.id == id {
        return Err(AppError::invalid_state("You cannot delete your own account"));
    }

    let repo = repo(&state);
    require_user(&repo, id).await?;

    let orders = repo.count_orders(id).await?;
    if orders > 0 {
        return Err(AppError::invalid_state(format!(
            "User {} has {} order(s) and cannot be deleted",
            id, orders
        )));
    }

    repo.delete(id).await?;

    security_log!("INFO", "user_deleted", user_id = id, deleted_by = admin.id);

    Ok(Json(ApiResponse {
        success: true,
        data: None,
        message: Some("User deleted".to_string()),
    }))
}
