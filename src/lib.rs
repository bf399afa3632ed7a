//! Store Server - e-commerce backend
//!
//! # Architecture
//!
//! - **HTTP API** (`api`): RESTful routes and handlers (axum)
//! - **Database** (`db`): embedded SQLite store (sqlx), models and repositories
//! - **Auth** (`auth`): JWT + Argon2 authentication
//! - **Orders** (`orders`): transactional order placement and lifecycle
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # Config, state, server, startup errors
//! ├── auth/          # JWT service, extractors
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # Pool, schema, models, repositories, seeder
//! ├── orders/        # Order workflow (the stateful business logic)
//! └── utils/         # Errors, envelope, logger, slug, pagination
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::logger::init_logger;
pub use utils::{AppError, AppResult};

// Security logging macro - structured auth events via tracing
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load environment and initialize logging. Called once at startup.
pub fn setup_environment() -> anyhow::Result<()> {
    // .env is optional; env vars always win
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    utils::logger::init_logger_with_level(&log_level);

    Ok(())
}
