//! Category Repository

use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::{Category, CategoryWithCount};

#[derive(Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> RepoResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    /// All categories with the number of products referencing each
    pub async fn list_with_count(&self) -> RepoResult<Vec<CategoryWithCount>> {
        sqlx::query_as::<_, CategoryWithCount>(
            "SELECT c.id, c.name, c.slug, COUNT(p.id) AS product_count \
             FROM categories c \
             LEFT JOIN products p ON p.category_id = c.id \
             GROUP BY c.id \
             ORDER BY c.name",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    /// Slug collision check, optionally excluding one category (updates)
    pub async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
        let count: i64 = match exclude_id {
            Some(id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = ?")
                    .bind(slug)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count > 0)
    }

    pub async fn create(&self, name: &str, slug: &str) -> RepoResult<Category> {
        let id = sqlx::query("INSERT INTO categories (name, slug) VALUES (?, ?)")
            .bind(name)
            .bind(slug)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.require(id).await
    }

    pub async fn update(&self, id: i64, name: &str, slug: &str) -> RepoResult<Category> {
        sqlx::query("UPDATE categories SET name = ?, slug = ? WHERE id = ?")
            .bind(name)
            .bind(slug)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.require(id).await
    }

    /// Hard delete. Callers must run the product guard first.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of products referencing this category (delete guard)
    pub async fn count_products(&self, category_id: i64) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = ?")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn require(&self, id: i64) -> RepoResult<Category> {
        self.find_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}
