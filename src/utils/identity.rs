// src/utils/identity.rs

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Authenticated user id, injected by `identity_middleware`.
/// The engine never authenticates; the surrounding platform does and
/// forwards the id with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

pub const USER_ID_HEADER: &str = "x-user-id";

/// Axum Middleware: Identity.
///
/// Requires an `X-User-Id` header carrying the authenticated user's id.
/// If present and numeric, injects `UserId` into the request extensions
/// for handlers to use. Otherwise returns 401 Unauthorized.
pub async fn identity_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok());

    match user_id {
        Some(id) => {
            req.extensions_mut().insert(UserId(id));
            Ok(next.run(req).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
