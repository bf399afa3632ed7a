//! Database Seeder
//!
//! Populates a fresh database with an admin account, a sample
//! customer, categories and products. Idempotent: if the admin account
//! already exists the seeder logs and returns without writing.
//! Everything runs in one transaction; any failure rolls back.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::{User, UserRole};
use crate::utils::generate_slug;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin123";
const CUSTOMER_EMAIL: &str = "customer@example.com";
const CUSTOMER_PASSWORD: &str = "customer123";

const CATEGORIES: &[&str] = &[
    "Eletrônicos",
    "Livros",
    "Casa e Decoração",
    "Esportes",
    "Brinquedos",
];

/// (name, description, price, stock, category index)
const PRODUCTS: &[(&str, &str, f64, i64, usize)] = &[
    ("Notebook 14\"", "14-inch notebook, 16 GB RAM", 3499.90, 10, 0),
    ("Fone Bluetooth", "Wireless over-ear headphones", 299.90, 50, 0),
    ("Mouse sem fio", "Wireless optical mouse", 89.90, 120, 0),
    ("O Senhor dos Anéis", "Single-volume edition", 119.90, 35, 1),
    ("Clean Architecture", "Robert C. Martin", 89.90, 20, 1),
    ("Luminária de mesa", "Adjustable LED desk lamp", 149.90, 40, 2),
    ("Jogo de panelas", "5-piece non-stick set", 399.90, 15, 2),
    ("Bola de futebol", "Official size 5", 99.90, 60, 3),
    ("Halteres 5kg", "Pair of 5 kg dumbbells", 129.90, 25, 3),
    ("Quebra-cabeça 1000", "1000-piece jigsaw puzzle", 59.90, 30, 4),
];

/// Seed the database. Safe to run more than once.
pub async fn seed_database(pool: &SqlitePool) -> anyhow::Result<()> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(ADMIN_EMAIL)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        tracing::info!("Database already seeded, nothing to do");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let admin_hash = User::hash_password(ADMIN_PASSWORD)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    let customer_hash = User::hash_password(CUSTOMER_PASSWORD)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;

    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind("Admin")
    .bind(ADMIN_EMAIL)
    .bind(&admin_hash)
    .bind(UserRole::Admin)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind("Sample Customer")
    .bind(CUSTOMER_EMAIL)
    .bind(&customer_hash)
    .bind(UserRole::Customer)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let slug = generate_slug(name);
        let id = sqlx::query("INSERT INTO categories (name, slug) VALUES (?, ?)")
            .bind(name)
            .bind(&slug)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        category_ids.push(id);
    }

    for (name, description, price, stock, category_idx) in PRODUCTS {
        sqlx::query(
            "INSERT INTO products \
             (name, description, price, stock, category_id, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(category_ids[*category_idx])
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        categories = CATEGORIES.len(),
        products = PRODUCTS.len(),
        "Database seeded"
    );

    Ok(())
}
