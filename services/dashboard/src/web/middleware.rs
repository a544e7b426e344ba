//! services/dashboard/src/web/middleware.rs
//!
//! Request tracing middleware.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The id assigned to the request being handled.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

/// Middleware that tags every request with a fresh id.
///
/// The id lands in the request extensions, in a tracing span wrapping the
/// handler, and in the `x-request-id` response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4();
    let span = info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(RequestId(id));

    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| info!(status = %response.status(), "request finished"));

    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
