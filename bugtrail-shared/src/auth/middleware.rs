/// Authentication middleware for Axum
///
/// Validates the `Authorization: Bearer <token>` header on protected routes
/// and attaches an [`AuthUser`] to request extensions. The user record is
/// re-loaded from the database on every request, so a deleted account stops
/// working immediately even while its token is still within its 30-day
/// validity window, and role changes take effect on the next request.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use bugtrail_shared::auth::access::AuthUser;
/// use bugtrail_shared::auth::middleware::jwt_auth_middleware;
/// use sqlx::PgPool;
///
/// async fn handler(Extension(user): Extension<AuthUser>) -> String {
///     format!("Hello, {}!", user.id)
/// }
///
/// fn router(pool: PgPool, secret: String) -> Router {
///     Router::new()
///         .route("/api/projects", get(handler))
///         .layer(middleware::from_fn(move |req, next| {
///             jwt_auth_middleware(pool.clone(), secret.clone(), req, next)
///         }))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;

use super::access::AuthUser;
use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token is valid but the user no longer exists
    UserGone,

    /// Database error
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::UserGone => {
                (StatusCode::UNAUTHORIZED, "Account no longer exists").into_response()
            }
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// JWT authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - Authorization header is missing or not a Bearer token
/// - Token validation fails (signature, expiry, issuer)
/// - The user in the token no longer exists
pub async fn jwt_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    // Fresh lookup so deleted accounts and role changes are seen immediately
    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UserGone)?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        let cases = [
            (AuthError::MissingCredentials, StatusCode::UNAUTHORIZED),
            (
                AuthError::InvalidFormat("bad".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AuthError::InvalidToken("bad".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (AuthError::UserGone, StatusCode::UNAUTHORIZED),
            (
                AuthError::DatabaseError("oops".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_database_error_does_not_leak_details() {
        let response = AuthError::DatabaseError("connection refused at 10.0.0.5".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
