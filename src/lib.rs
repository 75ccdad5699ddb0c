pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod utils;

pub use app::{build_router, AppState};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use utils::{build_pagination_summary, compute_offset, PaginationDefaults, PaginationInfo};
