use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// The authenticated user for the current request, as asserted by the
/// upstream identity layer.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Identity-extraction middleware.
///
/// Sessions, OAuth, and password handling live in a separate identity
/// layer that fronts this service; it asserts the caller's identity via
/// the `X-User-Id` header, which this middleware requires and trusts.
/// Requests without a parseable user id are rejected before reaching any
/// handler.
pub async fn require_user(mut req: Request, next: Next) -> Response {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok());

    match user_id {
        Some(id) => {
            req.extensions_mut().insert(UserId(id));
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            "Missing or invalid X-User-Id header",
        )
            .into_response(),
    }
}
