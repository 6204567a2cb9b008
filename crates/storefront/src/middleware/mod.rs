//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (configured origin, credentials allowed)
//! 5. Security headers
//! 6. Login rate limiter (login route only)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{ClientIp, RequireUser};
pub use rate_limit::{login_limit_response, login_rate_limiter};
pub use request_id::{
    propagate_request_id_layer, request_id_middleware, set_request_id_layer,
};
pub use security_headers::security_headers_middleware;
