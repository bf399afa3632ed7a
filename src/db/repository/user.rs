//! User Repository

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::RepoResult;
use crate::db::models::{User, UserFilter, UserRole, UserUpdate};
use crate::utils::PageParams;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Filtered, paginated listing with a total-count query
    pub async fn list(
        &self,
        filter: &UserFilter,
        page: &PageParams,
    ) -> RepoResult<(Vec<User>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1=1");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE 1=1");
        apply_filters(&mut qb, filter);
        qb.push(" ORDER BY name LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> RepoResult<User> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (name, email, password_hash, role, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.require(id).await
    }

    /// Update profile fields that were provided
    pub async fn update(&self, id: i64, data: &UserUpdate) -> RepoResult<User> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(name) = &data.name {
            qb.push(", name = ");
            qb.push_bind(name.clone());
        }
        if let Some(email) = &data.email {
            qb.push(", email = ");
            qb.push_bind(email.clone());
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.build().execute(&self.pool).await?;

        self.require(id).await
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> RepoResult<User> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require(id).await
    }

    pub async fn set_role(&self, id: i64, role: UserRole) -> RepoResult<User> {
        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require(id).await
    }

    pub async fn set_status(&self, id: i64, is_active: bool) -> RepoResult<User> {
        sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require(id).await
    }

    /// Hard delete. Callers must run the referential guard first.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of orders referencing this user (delete guard)
    pub async fn count_orders(&self, user_id: i64) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn require(&self, id: i64) -> RepoResult<User> {
        self.find_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        qb.push(" AND role = ");
        qb.push_bind(role);
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ");
        qb.push_bind(is_active);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR email LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}
