//! Request ID propagation for tracing and Sentry correlation.
//!
//! `tower-http` assigns an `x-request-id` (keeping one supplied by an upstream
//! proxy) and copies it onto the response. The middleware here tags the
//! tracing span and the Sentry scope with that id.

use axum::{
    extract::Request,
    http::{HeaderName, Request as HttpRequest},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Span;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layer that assigns a UUID v4 request id when none was supplied.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid)
}

/// Layer that echoes the request id on the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER))
}

/// The request id as a string, if one has been assigned.
#[must_use]
pub fn request_id_of<B>(request: &HttpRequest<B>) -> Option<String> {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|h| h.to_str().ok())
        })
        .map(str::to_owned)
}

/// Record the request id in the current span and the Sentry scope.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    if let Some(request_id) = request_id_of(&request) {
        Span::current().record("request_id", &request_id);
        sentry::configure_scope(|scope| {
            scope.set_tag("request_id", &request_id);
        });
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_from_header() {
        let req = HttpRequest::builder()
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request_id_of(&req).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_request_id_absent() {
        let req = HttpRequest::builder().body(()).unwrap();
        assert!(request_id_of(&req).is_none());
    }
}
