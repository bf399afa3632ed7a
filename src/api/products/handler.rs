//! Product Handlers
//!
//! Reads are public; writes are admin-only. Deletion is soft: the
//! product is deactivated so existing order lines keep their
//! reference.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::models::{
    Category, Product, ProductCreate, ProductFilter, ProductResponse, ProductUpdate,
    ProductUpdateStock,
};
use crate::db::repository::{CategoryRepository, ProductRepository};
use crate::utils::{ApiResponse, AppError, AppResult, PageParams, ok, paginated};

fn repo(state: &ServerState) -> ProductRepository {
    ProductRepository::new(state.pool().clone())
}

fn categories(state: &ServerState) -> CategoryRepository {
    CategoryRepository::new(state.pool().clone())
}

async fn require_product(repo: &ProductRepository, id: i64) -> AppResult<Product> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))
}

/// Embed the product's category into the response shape.
async fn to_response(state: &ServerState, product: Product) -> AppResult<ProductResponse> {
    let category = categories(state)
        .find_by_id(product.category_id)
        .await?
        .ok_or_else(|| {
            AppError::internal(format!(
                "Product {} references missing category {}",
                product.id, product.category_id
            ))
        })?;
    Ok(ProductResponse::from_parts(product, category))
}

/// GET /api/v1/products - paginated, filtered listing
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    page.validate()?;

    let (products, total) = repo(&state).list(&filter, &page).await?;

    // One category fetch for the whole page
    let category_map: HashMap<i64, Category> = categories(&state)
        .list()
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut responses = Vec::with_capacity(products.len());
    for product in products {
        let category = category_map.get(&product.category_id).cloned().ok_or_else(|| {
            AppError::internal(format!(
                "Product {} references missing category {}",
                product.id, product.category_id
            ))
        })?;
        responses.push(ProductResponse::from_parts(product, category));
    }

    Ok(paginated(responses, total, page.page, page.page_size))
}

/// GET /api/v1/products/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let product = require_product(&repo(&state), id).await?;
    Ok(ok(to_response(&state, product).await?))
}

/// POST /api/v1/products - create (admin); the category must exist
pub async fn create(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    if categories(&state).find_by_id(payload.category_id).await?.is_none() {
        return Err(AppError::not_found(format!(
            "Category {} not found",
            payload.category_id
        )));
    }

    let product = repo(&state).create(&payload).await?;
    let response = to_response(&state, product).await?;

    Ok((StatusCode::CREATED, ok(response)))
}

/// PUT /api/v1/products/:id - update (admin); a new category is
/// re-checked for existence
pub async fn update(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let repo = repo(&state);
    require_product(&repo, id).await?;

    if let Some(category_id) = payload.category_id {
        if categories(&state).find_by_id(category_id).await?.is_none() {
            return Err(AppError::not_found(format!("Category {} not found", category_id)));
        }
    }

    let product = repo.update(id, &payload).await?;
    Ok(ok(to_response(&state, product).await?))
}

/// PATCH /api/v1/products/:id/stock - absolute stock level (admin)
pub async fn update_stock(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdateStock>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let repo = repo(&state);
    require_product(&repo, id).await?;

    let product = repo.set_stock(id, payload.stock).await?;

    tracing::info!(product_id = id, stock = payload.stock, "Stock updated");

    Ok(ok(to_response(&state, product).await?))
}

/// DELETE /api/v1/products/:id - soft delete (admin)
pub async fn delete(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let repo = repo(&state);
    require_product(&repo, id).await?;

    repo.deactivate(id).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: None,
        message: Some("Product deactivated".to_string()),
    }))
}
