//! HTTP handlers.

mod health_handler;
mod static_files;
mod user_handler;

pub use health_handler::{health_check, health_routes, HealthResponse};
pub use static_files::StaticFiles;
pub use user_handler::{user_routes, ListUsersQuery, LookupQuery, SetPasswordRequest};
