//! Category Handlers
//!
//! Slugs are generated from the name (lowercased, accents folded) and
//! must stay unique; collisions surface as Conflict. Reads are public,
//! writes are admin-only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use crate::db::repository::CategoryRepository;
use crate::utils::{ApiResponse, AppError, AppResult, generate_slug, ok};

fn repo(state: &ServerState) -> CategoryRepository {
    CategoryRepository::new(state.pool().clone())
}

async fn require_category(repo: &CategoryRepository, id: i64) -> AppResult<Category> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {} not found", id)))
}

/// GET /api/v1/categories - all categories with product counts
pub async fn list(State(state): State<ServerState>) -> AppResult<impl IntoResponse> {
    let categories = repo(&state).list_with_count().await?;
    Ok(ok(categories))
}

/// GET /api/v1/categories/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let category = require_category(&repo(&state), id).await?;
    Ok(ok(category))
}

/// GET /api/v1/categories/slug/:slug
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let category = repo(&state)
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category '{}' not found", slug)))?;
    Ok(ok(category))
}

/// POST /api/v1/categories - create (admin)
pub async fn create(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let repo = repo(&state);
    let slug = generate_slug(&payload.name);

    if repo.slug_exists(&slug, None).await? {
        return Err(AppError::conflict(format!(
            "Category with slug '{}' already exists",
            slug
        )));
    }

    let category = repo.create(&payload.name, &slug).await?;
    Ok((StatusCode::CREATED, ok(category)))
}

/// PUT /api/v1/categories/:id - update (admin)
///
/// Renaming regenerates the slug, which is re-checked for collisions.
pub async fn update(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let repo = repo(&state);
    let current = require_category(&repo, id).await?;

    let name = payload.name.unwrap_or(current.name);
    let slug = generate_slug(&name);

    if repo.slug_exists(&slug, Some(id)).await? {
        return Err(AppError::conflict(format!(
            "Category with slug '{}' already exists",
            slug
        )));
    }

    let category = repo.update(id, &name, &slug).await?;
    Ok(ok(category))
}

/// DELETE /api/v1/categories/:id - delete (admin), blocked while
/// products reference the category
pub async fn delete(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let repo = repo(&state);
    require_category(&repo, id).await?;

    let products = repo.count_products(id).await?;
    if products > 0 {
        return Err(AppError::invalid_state(format!(
            "Category {} has {} product(s) and cannot be deleted",
            id, products
        )));
    }

    repo.delete(id).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: None,
        message: Some("Category deleted".to_string()),
    }))
}
