//! Order Handlers
//!
//! Non-admin callers are always scoped to their own orders: someone
//! else's order reads as 404, never 403, so order ids are not
//! enumerable. Placement and cancellation go through
//! [`crate::orders::OrderService`]; reads go through the repository.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::auth::{AdminUser, CurrentUser};
use crate::core::ServerState;
use crate::db::models::{OrderCreate, OrderFilter, OrderUpdateStatus};
use crate::db::repository::OrderRepository;
use crate::orders::OrderService;
use crate::utils::{AppError, AppResult, PageParams, ok, ok_with_message, paginated};

fn repo(state: &ServerState) -> OrderRepository {
    OrderRepository::new(state.pool().clone())
}

fn service(state: &ServerState) -> OrderService {
    OrderService::new(state.pool().clone())
}

/// Owner scope: admins see everything, everyone else only their own
fn scope(user: &CurrentUser) -> Option<i64> {
    if user.is_admin() { None } else { Some(user.id) }
}

/// GET /api/v1/orders - paginated listing, newest first
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    page.validate()?;

    let repo = repo(&state);
    let (orders, total) = repo.list(&filter, scope(&current), &page).await?;

    let details =
        futures::future::try_join_all(orders.into_iter().map(|o| repo.to_detail(o))).await?;

    Ok(paginated(details, total, page.page, page.page_size))
}

/// POST /api/v1/orders - place an order
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let order = service(&state).place_order(current.id, &payload).await?;
    let detail = repo(&state).to_detail(order).await?;

    Ok((StatusCode::CREATED, ok_with_message(detail, "Order placed")))
}

/// GET /api/v1/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let repo = repo(&state);
    let order = repo
        .find_by_id(id, scope(&current))
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    Ok(ok(repo.to_detail(order).await?))
}

/// DELETE /api/v1/orders/:id - cancel and restore stock
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let order = service(&state).cancel_order(id, scope(&current)).await?;
    let detail = repo(&state).to_detail(order).await?;

    Ok(ok_with_message(detail, "Order canceled"))
}

/// PATCH /api/v1/orders/:id/status - admin status change
pub async fn update_status(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderUpdateStatus>,
) -> AppResult<impl IntoResponse> {
    let order = service(&state).update_status(id, payload.status).await?;
    let detail = repo(&state).to_detail(order).await?;

    Ok(ok(detail))
}
