//! HTTP host for the services marketplace.
//!
//! Wires the account service into an Axum router behind the configured
//! middleware chain, and provides the `plataforma` command line.

pub mod cli;
pub mod commands;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
