/// User model and database operations
///
/// Users carry an account-wide role (`admin` or `member`) and the transient
/// OTP fields used by the registration and password-reset flows. A user
/// becomes eligible for login only once `verified` is true.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     verified BOOLEAN NOT NULL DEFAULT FALSE,
///     otp_code VARCHAR(6),
///     otp_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are normalized with [`normalize_email`] before every insert and
/// lookup, so the unique index operates on the canonical form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account-wide role
///
/// Coarse permission level checked before any resource is loaded. Fine-
/// grained access additionally depends on project membership and ownership
/// (see `auth::access`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can create projects, assign tickets, and bypass ownership checks
    Admin,

    /// Regular collaborator; rights derive from project membership
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }

    /// Whether this role may create tickets and comments
    pub fn can_contribute(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Member)
    }
}

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The OTP
/// fields are populated while a registration or reset flow is in progress
/// and cleared on completion.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Normalized (trimmed, lowercased) email address, unique
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account-wide role
    pub role: UserRole,

    /// Whether the email address has been verified via OTP
    pub verified: bool,

    /// Pending one-time code, if a flow is in progress
    #[serde(skip_serializing)]
    pub otp_code: Option<String>,

    /// Expiry of the pending one-time code
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new (unverified) user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address; pass through [`normalize_email`] first
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,
}

/// Normalizes an email address to its canonical stored form
///
/// Trims surrounding whitespace and lowercases. Every code path that inserts
/// or looks up by email goes through this, matching the store's unique index.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, verified, \
                            otp_code, otp_expires_at, created_at, updated_at";

impl User {
    /// Creates a new unverified user
    ///
    /// # Errors
    ///
    /// Returns an error on a unique-constraint violation (email already
    /// registered) or database failure.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by normalized email address
    ///
    /// The caller is expected to have normalized the input already; this
    /// method normalizes again so a raw address still matches.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Overwrites name and password of a not-yet-verified account
    ///
    /// Used when someone restarts registration for an email that has a
    /// pending (unverified) record: the new submission wins.
    pub async fn overwrite_pending(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(name)
        .bind(password_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stores a freshly generated OTP and its expiry on the user record
    pub async fn save_otp(
        pool: &PgPool,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp_code = $2, otp_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the account verified and clears the OTP fields
    pub async fn mark_verified(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets a new password hash and clears the OTP fields
    ///
    /// Completes the forgot/reset flow.
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dev@Example.COM "), "dev@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_role_serde_wire_format() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<UserRole>("\"member\"").unwrap(),
            UserRole::Member
        );
    }

    #[test]
    fn test_role_can_contribute() {
        assert!(UserRole::Admin.can_contribute());
        assert!(UserRole::Member.can_contribute());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::Member,
            verified: true,
            otp_code: Some("123456".to_string()),
            otp_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("123456"));
    }
}
