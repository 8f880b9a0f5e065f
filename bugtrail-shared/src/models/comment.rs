/// Comment model and database operations
///
/// Comments hang off a ticket and carry an immutable author reference.
/// Deletion rights (admin or the author) are checked by the caller via
/// `auth::access::can_delete_comment`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     ticket_id UUID NOT NULL,
///     author_id UUID NOT NULL,
///     text TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Ticket this comment belongs to; immutable
    pub ticket_id: Uuid,

    /// Author; immutable
    pub author_id: Uuid,

    /// Comment body
    pub text: String,

    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

impl Comment {
    /// Creates a new comment
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (ticket_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, author_id, text, created_at
            "#,
        )
        .bind(data.ticket_id)
        .bind(data.author_id)
        .bind(data.text)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, ticket_id, author_id, text, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Lists comments on a ticket, newest first
    pub async fn list_by_ticket(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, ticket_id, author_id, text, created_at
            FROM comments
            WHERE ticket_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Deletes a comment by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
