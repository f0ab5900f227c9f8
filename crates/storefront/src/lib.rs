//! Cartwheel storefront library.
//!
//! The shopper-facing JSON API: accounts, catalog, cart, checkout, and order
//! history on top of `cartwheel-core` and `PostgreSQL`. The binary in
//! `main.rs` only adds process concerns (Sentry, tracing subscriber, signals).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::StorefrontConfig;
pub use routes::app;
pub use state::AppState;
