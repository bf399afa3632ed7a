//! Order Model
//!
//! An order is created transactionally with its items; total_price is
//! derived at creation and frozen. Item unit_price is a snapshot of
//! the product price at order time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order status, stored as TEXT
///
/// Terminal states (Delivered, Canceled) admit no further mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "PascalCase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }

    /// Whether no further status mutation is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// Whether the owner may still cancel from this state
    pub fn is_cancelable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order item row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Item line with the product name joined in
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub product_name: Option<String>,
}

/// Full order view: owner info and item lines
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: i64,
    pub user_id: i64,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub items: Vec<OrderItemDetail>,
}

/// One requested line of a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemCreate {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Order placement payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1), nested)]
    pub items: Vec<OrderItemCreate>,
}

/// Status update payload (admin)
#[derive(Debug, Clone, Deserialize)]
pub struct OrderUpdateStatus {
    pub status: OrderStatus,
}

/// List filters for orders
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Admin only; non-admins are always scoped to their own orders
    pub user_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_order_payload_validation() {
        let empty = OrderCreate { items: vec![] };
        assert!(empty.validate().is_err());

        let zero_quantity = OrderCreate {
            items: vec![OrderItemCreate {
                product_id: 1,
                quantity: 0,
            }],
        };
        assert!(zero_quantity.validate().is_err());

        let valid = OrderCreate {
            items: vec![OrderItemCreate {
                product_id: 1,
                quantity: 2,
            }],
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_cancelable_states() {
        assert!(OrderStatus::Pending.is_cancelable());
        assert!(OrderStatus::Paid.is_cancelable());
        assert!(!OrderStatus::Shipped.is_cancelable());
        assert!(!OrderStatus::Delivered.is_cancelable());
        assert!(!OrderStatus::Canceled.is_cancelable());
    }
}
