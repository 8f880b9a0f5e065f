/// JWT token generation and validation module
///
/// Session tokens are signed with HS256 (HMAC-SHA256) and identify a user by
/// ID. There is a single token kind: the 30-day session token handed out at
/// login and presented as `Authorization: Bearer <token>` on every protected
/// request. The bearer of a token re-proves nothing per request; the server
/// re-loads the user record instead (see [`super::middleware`]).
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 30 days
/// - **Validation**: Signature, expiration, issuer, and not-before checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use bugtrail_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped into every token
const ISSUER: &str = "bugtrail";

/// Session token lifetime
pub const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {ISSUER}")]
    InvalidIssuer,
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "bugtrail")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "bugtrail"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates new claims with the standard 30-day expiration
    pub fn new(user_id: Uuid) -> Self {
        Self::with_expiration(user_id, Duration::days(TOKEN_LIFETIME_DAYS))
    }

    /// Creates claims with a custom expiration
    ///
    /// Used by tests to mint already-expired tokens; production code goes
    /// through [`Claims::new`].
    pub fn with_expiration(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired
/// - Issuer is "bugtrail"
/// - Token is not used before nbf time
///
/// # Errors
///
/// Returns `JwtError::Expired` for an expired token, `JwtError::InvalidIssuer`
/// for a wrong issuer, and `JwtError::ValidationError` for any other failure
/// (bad signature, malformed token).
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_lifetime() {
        let claims = Claims::new(Uuid::new_v4());
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, TOKEN_LIFETIME_DAYS * 24 * 60 * 60);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, "bugtrail");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4());
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "a-completely-different-secret-key");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::with_expiration(Uuid::new_v4(), Duration::days(-1));
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.token", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}
