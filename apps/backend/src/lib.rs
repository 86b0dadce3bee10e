#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod trace_ctx;
pub mod utils;
pub mod ws;

pub use config::db::{db_url, DbKind, DbOwner, DbProfile};
pub use config::ServerConfig;
pub use error::AppError;
pub use infra::db::connect_db;
pub use infra::state::{build_state, StateBuilder};
pub use middleware::cors::cors_middleware;
pub use middleware::request_context::RequestContext;
pub use state::app_state::AppState;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
