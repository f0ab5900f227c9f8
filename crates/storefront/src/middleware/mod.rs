//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (record in span and Sentry scope, echo in response)
//! 4. CORS (configured frontend origin)
//! 5. Rate limiting (governor, register and login only)
//!
//! Authentication is not a layer: handlers opt in with `RequireUser`.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{Bearer, RequireUser};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
