//! Order Repository
//!
//! Read side of orders. Writes (placement, cancellation, status
//! changes) live in [`crate::orders::OrderService`] because they are
//! transactional.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::RepoResult;
use crate::db::models::{Order, OrderDetail, OrderFilter, OrderItemDetail};
use crate::utils::PageParams;

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Filtered, paginated listing, newest first
    ///
    /// `owner_id` scopes the listing to one user's orders; admins pass
    /// `None` and may instead filter by `filter.user_id`.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        owner_id: Option<i64>,
        page: &PageParams,
    ) -> RepoResult<(Vec<Order>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1=1");
        apply_filters(&mut count_qb, filter, owner_id);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM orders WHERE 1=1");
        apply_filters(&mut qb, filter, owner_id);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let orders = qb.build_query_as::<Order>().fetch_all(&self.pool).await?;

        Ok((orders, total))
    }

    /// Fetch one order, optionally requiring it to belong to `owner_id`
    pub async fn find_by_id(&self, id: i64, owner_id: Option<i64>) -> RepoResult<Option<Order>> {
        match owner_id {
            Some(uid) => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ? AND user_id = ?")
                    .bind(id)
                    .bind(uid)
                    .fetch_optional(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
    }

    /// Item lines with product names joined in
    ///
    /// LEFT JOIN keeps lines whose product was since hard-deleted.
    pub async fn item_details(&self, order_id: i64) -> RepoResult<Vec<OrderItemDetail>> {
        sqlx::query_as::<_, OrderItemDetail>(
            "SELECT oi.id, oi.product_id, oi.quantity, oi.unit_price, p.name AS product_name \
             FROM order_items oi \
             LEFT JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = ? \
             ORDER BY oi.id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Assemble the full detail view: owner info plus item lines
    pub async fn to_detail(&self, order: Order) -> RepoResult<OrderDetail> {
        let owner: Option<(String, String)> =
            sqlx::query_as("SELECT name, email FROM users WHERE id = ?")
                .bind(order.user_id)
                .fetch_optional(&self.pool)
                .await?;
        let items = self.item_details(order.id).await?;

        let (user_name, user_email) = match owner {
            Some((name, email)) => (Some(name), Some(email)),
            None => (None, None),
        };

        Ok(OrderDetail {
            id: order.id,
            user_id: order.user_id,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
            user_name,
            user_email,
            items,
        })
    }
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &OrderFilter, owner_id: Option<i64>) {
    if let Some(uid) = owner_id {
        qb.push(" AND user_id = ");
        qb.push_bind(uid);
    } else if let Some(uid) = filter.user_id {
        qb.push(" AND user_id = ");
        qb.push_bind(uid);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
}
