//! Product Repository

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::RepoResult;
use crate::db::models::{Product, ProductCreate, ProductFilter, ProductUpdate};
use crate::utils::PageParams;

#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Filtered, paginated listing with a total-count query
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: &PageParams,
    ) -> RepoResult<(Vec<Product>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products WHERE 1=1");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE 1=1");
        apply_filters(&mut qb, filter);
        qb.push(" ORDER BY name LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        Ok((products, total))
    }

    pub async fn create(&self, data: &ProductCreate) -> RepoResult<Product> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO products \
             (name, description, price, stock, category_id, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.stock)
        .bind(data.category_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.require(id).await
    }

    /// Update fields that were provided
    pub async fn update(&self, id: i64, data: &ProductUpdate) -> RepoResult<Product> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(name) = &data.name {
            qb.push(", name = ");
            qb.push_bind(name.clone());
        }
        if let Some(description) = &data.description {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }
        if let Some(price) = data.price {
            qb.push(", price = ");
            qb.push_bind(price);
        }
        if let Some(stock) = data.stock {
            qb.push(", stock = ");
            qb.push_bind(stock);
        }
        if let Some(category_id) = data.category_id {
            qb.push(", category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(is_active) = data.is_active {
            qb.push(", is_active = ");
            qb.push_bind(is_active);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.build().execute(&self.pool).await?;

        self.require(id).await
    }

    /// Set the absolute stock level (admin stock endpoint)
    pub async fn set_stock(&self, id: i64, stock: i64) -> RepoResult<Product> {
        sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(stock)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require(id).await
    }

    /// Soft delete: flips is_active off, keeps the row for order history
    pub async fn deactivate(&self, id: i64) -> RepoResult<Product> {
        sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require(id).await
    }

    async fn require(&self, id: i64) -> RepoResult<Product> {
        self.find_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &ProductFilter) {
    if let Some(name) = &filter.name {
        qb.push(" AND name LIKE ");
        qb.push_bind(format!("%{}%", name));
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ");
        qb.push_bind(category_id);
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max_price);
    }
    qb.push(" AND is_active = ");
    qb.push_bind(filter.is_active);
}
