//! Self-service admin for payment service providers.
//!
//! Library crate behind the `selfservice` binary; integration tests in
//! `tests/` drive it through `api::router`.

pub mod api;
pub mod clients;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod go_live;
pub mod middleware;
pub mod models;
pub mod state;
pub mod switch_psp;
pub mod views;

pub use state::AppState;
