//! Order workflow integration tests against a temporary SQLite file.

use sqlx::SqlitePool;
use tempfile::TempDir;

use store_server::core::Config;
use store_server::db;
use store_server::db::models::{OrderCreate, OrderItemCreate, OrderStatus, UserRole};
use store_server::orders::OrderService;
use store_server::utils::AppError;

async fn setup() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
    let config = Config::from_env().with_database_url(url);
    let pool = db::init_pool(&config).await.expect("pool init");
    (pool, dir)
}

async fn insert_user(pool: &SqlitePool, email: &str, role: UserRole) -> i64 {
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, is_active, created_at, updated_at) \
         VALUES (?, ?, 'x', ?, 1, ?, ?)",
    )
    .bind(email)
    .bind(email)
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("insert user")
    .last_insert_rowid()
}

async fn insert_category(pool: &SqlitePool, name: &str, slug: &str) -> i64 {
    sqlx::query("INSERT INTO categories (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .expect("insert category")
        .last_insert_rowid()
}

async fn insert_product(pool: &SqlitePool, category_id: i64, price: f64, stock: i64) -> i64 {
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO products \
         (name, description, price, stock, category_id, is_active, created_at, updated_at) \
         VALUES ('Test Product', NULL, ?, ?, ?, 1, ?, ?)",
    )
    .bind(price)
    .bind(stock)
    .bind(category_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("insert product")
    .last_insert_rowid()
}

async fn stock_of(pool: &SqlitePool, product_id: i64) -> i64 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("stock query")
}

async fn order_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .expect("count orders")
}

fn single_line(product_id: i64, quantity: i64) -> OrderCreate {
    OrderCreate {
        items: vec![OrderItemCreate {
            product_id,
            quantity,
        }],
    }
}

#[tokio::test]
async fn place_order_decrements_stock_and_derives_total() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(user_id, &single_line(product_id, 3))
        .await
        .expect("order placed");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price, 30.0);
    assert_eq!(stock_of(&pool, product_id).await, 2);

    let unit_price: f64 =
        sqlx::query_scalar("SELECT unit_price FROM order_items WHERE order_id = ?")
            .bind(order.id)
            .fetch_one(&pool)
            .await
            .expect("item row");
    assert_eq!(unit_price, 10.0);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_every_line() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let first = insert_product(&pool, category_id, 10.0, 5).await;
    let second = insert_product(&pool, category_id, 20.0, 1).await;

    let service = OrderService::new(pool.clone());
    let err = service
        .place_order(
            user_id,
            &OrderCreate {
                items: vec![
                    OrderItemCreate {
                        product_id: first,
                        quantity: 2,
                    },
                    OrderItemCreate {
                        product_id: second,
                        quantity: 3,
                    },
                ],
            },
        )
        .await
        .expect_err("second line exceeds stock");

    assert!(matches!(err, AppError::InsufficientStock(_)));
    // The first line's decrement must have been rolled back
    assert_eq!(stock_of(&pool, first).await, 5);
    assert_eq!(stock_of(&pool, second).await, 1);
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn inactive_product_is_rejected() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;
    sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?")
        .bind(product_id)
        .execute(&pool)
        .await
        .expect("deactivate");

    let service = OrderService::new(pool.clone());
    let err = service
        .place_order(user_id, &single_line(product_id, 1))
        .await
        .expect_err("inactive product");

    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(stock_of(&pool, product_id).await, 5);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;

    let service = OrderService::new(pool.clone());
    let err = service
        .place_order(user_id, &single_line(9999, 1))
        .await
        .expect_err("missing product");

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn total_price_is_stable_under_later_price_change() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(user_id, &single_line(product_id, 2))
        .await
        .expect("order placed");

    sqlx::query("UPDATE products SET price = 99.0 WHERE id = ?")
        .bind(product_id)
        .execute(&pool)
        .await
        .expect("price change");

    let total: f64 = sqlx::query_scalar("SELECT total_price FROM orders WHERE id = ?")
        .bind(order.id)
        .fetch_one(&pool)
        .await
        .expect("order row");
    let unit_price: f64 =
        sqlx::query_scalar("SELECT unit_price FROM order_items WHERE order_id = ?")
            .bind(order.id)
            .fetch_one(&pool)
            .await
            .expect("item row");

    assert_eq!(total, 20.0);
    assert_eq!(unit_price, 10.0);
}

#[tokio::test]
async fn cancel_restores_stock_and_is_idempotent_only_once() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(user_id, &single_line(product_id, 3))
        .await
        .expect("order placed");
    assert_eq!(stock_of(&pool, product_id).await, 2);

    let canceled = service
        .cancel_order(order.id, Some(user_id))
        .await
        .expect("cancel");
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert_eq!(stock_of(&pool, product_id).await, 5);

    let err = service
        .cancel_order(order.id, Some(user_id))
        .await
        .expect_err("second cancel");
    assert!(matches!(err, AppError::InvalidState(_)));
    // No double restore
    assert_eq!(stock_of(&pool, product_id).await, 5);
}

#[tokio::test]
async fn cancel_is_scoped_to_the_owner() {
    let (pool, _dir) = setup().await;
    let owner = insert_user(&pool, "owner@test.com", UserRole::Customer).await;
    let other = insert_user(&pool, "other@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(owner, &single_line(product_id, 1))
        .await
        .expect("order placed");

    let err = service
        .cancel_order(order.id, Some(other))
        .await
        .expect_err("foreign order");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn shipped_orders_cannot_be_canceled() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(user_id, &single_line(product_id, 2))
        .await
        .expect("order placed");
    service
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .expect("ship");

    let err = service
        .cancel_order(order.id, Some(user_id))
        .await
        .expect_err("too late");
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(stock_of(&pool, product_id).await, 3);
}

#[tokio::test]
async fn status_updates_are_permissive_until_terminal() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(user_id, &single_line(product_id, 1))
        .await
        .expect("order placed");

    // Pending -> Delivered is allowed (no enforced step order)
    let delivered = service
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .expect("deliver");
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let err = service
        .update_status(order.id, OrderStatus::Paid)
        .await
        .expect_err("terminal order");
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn canceled_orders_reject_status_updates() {
    let (pool, _dir) = setup().await;
    let user_id = insert_user(&pool, "buyer@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 5).await;

    let service = OrderService::new(pool.clone());
    let order = service
        .place_order(user_id, &single_line(product_id, 2))
        .await
        .expect("order placed");
    service
        .cancel_order(order.id, Some(user_id))
        .await
        .expect("cancel");

    // The write is guarded: a canceled order must keep its status
    let err = service
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .expect_err("terminal order");
    assert!(matches!(err, AppError::InvalidState(_)));

    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
        .bind(order.id)
        .fetch_one(&pool)
        .await
        .expect("order row");
    assert_eq!(status, "Canceled");
    assert_eq!(stock_of(&pool, product_id).await, 5);
}

#[tokio::test]
async fn concurrent_placement_of_the_last_unit_yields_one_success() {
    let (pool, _dir) = setup().await;
    let first_user = insert_user(&pool, "a@test.com", UserRole::Customer).await;
    let second_user = insert_user(&pool, "b@test.com", UserRole::Customer).await;
    let category_id = insert_category(&pool, "Books", "books").await;
    let product_id = insert_product(&pool, category_id, 10.0, 1).await;

    let service_a = OrderService::new(pool.clone());
    let service_b = OrderService::new(pool.clone());

    let a = tokio::spawn({
        let order = single_line(product_id, 1);
        async move { service_a.place_order(first_user, &order).await }
    });
    let b = tokio::spawn({
        let order = single_line(product_id, 1);
        async move { service_b.place_order(second_user, &order).await }
    });

    let (a, b) = (a.await.expect("join"), b.await.expect("join"));
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();

    assert_eq!(successes, 1, "exactly one order may consume the last unit");
    assert_eq!(stock_of(&pool, product_id).await, 0);
    assert_eq!(order_count(&pool).await, 1);

    for result in [a, b] {
        if let Err(e) = result {
            assert!(matches!(e, AppError::InsufficientStock(_)));
        }
    }
}
