//! Shared-token check for dispatcher and admin routes.
//!
//! Every protected request must carry `X-Auth: <token>` equal to the
//! configured token. This is a placeholder gate, not an identity system.

use crate::error::Error;
use crate::server::error::AppError;
use crate::server::AppContext;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

pub const AUTH_HEADER: &str = "x-auth";

/// Compare the presented token with the configured one.
pub fn check_token(expected: &str, presented: Option<&str>) -> Result<(), Error> {
    match presented {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(Error::Unauthorized("invalid token".into())),
        None => Err(Error::Unauthorized("missing X-Auth header".into())),
    }
}

/// Middleware rejecting requests without the shared token.
pub async fn token_auth_middleware(
    State(ctx): State<AppContext>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok());

    check_token(&ctx.config.server.auth_token, presented)?;

    Ok(next.run(request).await)
}
