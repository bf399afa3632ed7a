//! Database Models
//!
//! Row types (sqlx::FromRow) plus the create/update payloads accepted
//! by the API, mirroring the relational schema in [`crate::db`].

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::{Category, CategoryCreate, CategoryUpdate, CategoryWithCount};
pub use order::{
    Order, OrderCreate, OrderDetail, OrderFilter, OrderItem, OrderItemCreate, OrderItemDetail,
    OrderStatus, OrderUpdateStatus,
};
pub use product::{
    Product, ProductCreate, ProductFilter, ProductUpdate, ProductUpdateStock, ProductResponse,
};
pub use user::{
    User, UserCreate, UserFilter, UserLogin, UserResponse, UserRole, UserUpdate,
    UserUpdatePassword, UserUpdateRole, UserUpdateStatus,
};
