//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (admin frontend origin, credentials allowed)
//! 5. Security headers
//!
//! Authentication is per handler through [`RequireAdmin`] and
//! [`RequireSuperAdmin`].

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, RequireSuperAdmin};
pub use request_id::{
    propagate_request_id_layer, request_id_middleware, set_request_id_layer,
};
pub use security_headers::security_headers_middleware;
