//! HTTP API tests, driving the full router in-process.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use store_server::api;
use store_server::auth::JwtService;
use store_server::core::{Config, ServerState};
use store_server::db;
use store_server::db::models::{User, UserRole};

async fn setup_app() -> (Router, ServerState, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
    let config = Config::from_env().with_database_url(url);

    let pool = db::init_pool(&config).await.expect("pool init");
    let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
    let state = ServerState::new(config, pool, jwt_service);

    let app = api::build_app(&state).with_state(state.clone());
    (app, state, dir)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Insert an admin directly; registration only creates Customers.
async fn insert_admin(state: &ServerState, email: &str, password: &str) {
    let hash = User::hash_password(password).expect("hash");
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, is_active, created_at, updated_at) \
         VALUES ('Admin', ?, ?, ?, 1, ?, ?)",
    )
    .bind(email)
    .bind(hash)
    .bind(UserRole::Admin)
    .bind(now)
    .bind(now)
    .execute(state.pool())
    .await
    .expect("insert admin");
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": email, "password": password})),
        ))
        .await
        .expect("login request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _state, _dir) = setup_app().await;

    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .expect("health request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["database"], json!("ok"));
}

#[tokio::test]
async fn register_login_me_flow() {
    let (app, _state, _dir) = setup_app().await;

    let payload = json!({"name": "Alice", "email": "alice@test.com", "password": "secret1"});
    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/auth/register", None, Some(payload.clone())))
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["role"], json!("Customer"));
    assert!(body["data"].get("password_hash").is_none());

    // Duplicate email
    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/auth/register", None, Some(payload)))
        .await
        .expect("duplicate register");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));

    // Wrong password gets the unified 401
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "alice@test.com", "password": "wrong!"})),
        ))
        .await
        .expect("bad login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app, "alice@test.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], json!("alice@test.com"));

    // No token
    let response = app
        .oneshot(request("GET", "/api/v1/auth/me", None, None))
        .await
        .expect("me unauthenticated");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_writes_require_admin() {
    let (app, _state, _dir) = setup_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"name": "Bob", "email": "bob@test.com", "password": "secret1"})),
        ))
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = login(&app, "bob@test.com", "secret1").await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/categories",
            Some(&token),
            Some(json!({"name": "Books"})),
        ))
        .await
        .expect("create category");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn category_slug_conflicts_are_rejected() {
    let (app, state, _dir) = setup_app().await;
    insert_admin(&state, "admin@test.com", "admin-secret").await;
    let token = login(&app, "admin@test.com", "admin-secret").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/categories",
            Some(&token),
            Some(json!({"name": "Eletrônicos"})),
        ))
        .await
        .expect("create category");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["slug"], json!("eletronicos"));

    // Same accent-folded slug
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/categories",
            Some(&token),
            Some(json!({"name": "Eletronicos"})),
        ))
        .await
        .expect("duplicate category");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Public reads: by slug, and the counted listing
    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/categories/slug/eletronicos", None, None))
        .await
        .expect("get by slug");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/v1/categories", None, None))
        .await
        .expect("list categories");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["product_count"], json!(0));
}

#[tokio::test]
async fn order_placement_and_cancellation_over_http() {
    let (app, state, _dir) = setup_app().await;
    insert_admin(&state, "admin@test.com", "admin-secret").await;
    let admin_token = login(&app, "admin@test.com", "admin-secret").await;

    // Admin sets up the catalog
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/categories",
            Some(&admin_token),
            Some(json!({"name": "Books"})),
        ))
        .await
        .expect("create category");
    let category_id = body_json(response).await["data"]["id"].as_i64().expect("category id");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/products",
            Some(&admin_token),
            Some(json!({
                "name": "Test Book",
                "price": 10.0,
                "stock": 5,
                "category_id": category_id
            })),
        ))
        .await
        .expect("create product");
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = body_json(response).await;
    let product_id = product["data"]["id"].as_i64().expect("product id");
    assert_eq!(product["data"]["category"]["id"], json!(category_id));

    // Customer places an order
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"name": "Carol", "email": "carol@test.com", "password": "secret1"})),
        ))
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = login(&app, "carol@test.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/orders",
            Some(&token),
            Some(json!({"items": [{"product_id": product_id, "quantity": 3}]})),
        ))
        .await
        .expect("place order");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let order_id = body["data"]["id"].as_i64().expect("order id");
    assert_eq!(body["data"]["total_price"], json!(30.0));
    assert_eq!(body["data"]["status"], json!("Pending"));
    assert_eq!(body["data"]["items"][0]["unit_price"], json!(10.0));

    // Stock is down to 2
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/v1/products/{}", product_id), None, None))
        .await
        .expect("get product");
    assert_eq!(body_json(response).await["data"]["stock"], json!(2));

    // Over-stock order is rejected with the envelope error shape
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/orders",
            Some(&token),
            Some(json!({"items": [{"product_id": product_id, "quantity": 10}]})),
        ))
        .await
        .expect("over-stock order");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());

    // Cancel restores stock
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/orders/{}", order_id),
            Some(&token),
            None,
        ))
        .await
        .expect("cancel order");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], json!("Canceled"));

    let response = app
        .oneshot(request("GET", &format!("/api/v1/products/{}", product_id), None, None))
        .await
        .expect("get product");
    assert_eq!(body_json(response).await["data"]["stock"], json!(5));
}

#[tokio::test]
async fn user_listing_is_admin_only_and_guards_hold() {
    let (app, state, _dir) = setup_app().await;
    insert_admin(&state, "admin@test.com", "admin-secret").await;
    let admin_token = login(&app, "admin@test.com", "admin-secret").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"name": "Dave", "email": "dave@test.com", "password": "secret1"})),
        ))
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let customer_token = login(&app, "dave@test.com", "secret1").await;

    // Customers cannot list users
    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/users", Some(&customer_token), None))
        .await
        .expect("list users as customer");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin listing is paginated
    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/users", Some(&admin_token), None))
        .await
        .expect("list users");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["page"], json!(1));

    // Admins cannot demote themselves
    let admin_id = body["data"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|u| u["email"] == json!("admin@test.com"))
        .and_then(|u| u["id"].as_i64())
        .expect("admin id");

    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/users/{}/role", admin_id),
            Some(&admin_token),
            Some(json!({"role": "Customer"})),
        ))
        .await
        .expect("self role change");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
