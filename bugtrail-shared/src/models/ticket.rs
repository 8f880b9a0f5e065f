/// Ticket model and database operations
///
/// Tickets belong to a project and carry an immutable creator reference plus
/// an optional assignee. Who may update or delete a ticket is decided by the
/// predicates in `auth::access`, not here.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE ticket_priority AS ENUM ('low', 'medium', 'high');
/// CREATE TYPE ticket_status AS ENUM ('To Do', 'In Progress', 'Done');
///
/// CREATE TABLE tickets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL,
///     created_by UUID NOT NULL,
///     assignee UUID,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     priority ticket_priority NOT NULL DEFAULT 'medium',
///     status ticket_status NOT NULL DEFAULT 'To Do',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The status labels are the exact strings clients see; they are preserved
/// verbatim through serde and the Postgres enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

/// Ticket workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status")]
pub enum TicketStatus {
    #[sqlx(rename = "To Do")]
    #[serde(rename = "To Do")]
    ToDo,

    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,

    #[sqlx(rename = "Done")]
    #[serde(rename = "Done")]
    Done,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::ToDo => "To Do",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Done => "Done",
        }
    }
}

/// Ticket model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    /// Unique ticket ID
    pub id: Uuid,

    /// Owning project; immutable
    pub project_id: Uuid,

    /// User who created the ticket; immutable
    pub created_by: Uuid,

    /// Currently assigned user, if any
    pub assignee: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Longer description (may be empty)
    pub description: String,

    /// Priority, defaults to medium
    pub priority: TicketPriority,

    /// Workflow status, defaults to `To Do`
    pub status: TicketStatus,

    /// When the ticket was created
    pub created_at: DateTime<Utc>,

    /// When the ticket was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new ticket
///
/// The assignee is stored as given without a membership check; the
/// dedicated assign operation is the validated path.
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub assignee: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
}

/// Equality/substring filters for listing tickets within a project
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Exact status match
    pub status: Option<TicketStatus>,

    /// Exact priority match
    pub priority: Option<TicketPriority>,

    /// Exact assignee match
    pub assignee: Option<Uuid>,

    /// Case-insensitive substring match on the title
    pub search: Option<String>,
}

const TICKET_COLUMNS: &str = "id, project_id, created_by, assignee, title, description, \
                              priority, status, created_at, updated_at";

impl Ticket {
    /// Creates a new ticket in `To Do` status
    pub async fn create(pool: &PgPool, data: CreateTicket) -> Result<Self, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO tickets (project_id, created_by, assignee, title, description, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TICKET_COLUMNS}
            "#,
        ))
        .bind(data.project_id)
        .bind(data.created_by)
        .bind(data.assignee)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(ticket)
    }

    /// Finds a ticket by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    /// Lists tickets in a project, newest first, with optional filters
    ///
    /// Each filter narrows the result; an empty filter returns every ticket
    /// in the project. The title search is a case-insensitive substring
    /// match.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        filter: &TicketFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets
            WHERE project_id = $1
              AND ($2::ticket_status IS NULL OR status = $2)
              AND ($3::ticket_priority IS NULL OR priority = $3)
              AND ($4::uuid IS NULL OR assignee = $4)
              AND ($5::text IS NULL OR title ILIKE '%' || $5 || '%')
            ORDER BY created_at DESC
            "#,
        ))
        .bind(project_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assignee)
        .bind(filter.search.as_deref())
        .fetch_all(pool)
        .await?;

        Ok(tickets)
    }

    /// Persists the mutable fields of this ticket
    ///
    /// Load-modify-save: the handler mutates a fetched `Ticket` in memory
    /// (after its authorization checks) and writes the whole mutable field
    /// set back. Concurrent writers are last-write-wins, which is accepted
    /// for this workload.
    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            UPDATE tickets
            SET title = $2, description = $3, priority = $4, status = $5,
                assignee = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "#,
        ))
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.priority)
        .bind(self.status)
        .bind(self.assignee)
        .fetch_one(pool)
        .await?;

        Ok(ticket)
    }

    /// Deletes a ticket by ID
    ///
    /// Comments referencing the ticket are left in place (no cascade).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::ToDo).unwrap(),
            "\"To Do\""
        );
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::from_str::<TicketStatus>("\"Done\"").unwrap(),
            TicketStatus::Done
        );
    }

    #[test]
    fn test_priority_wire_strings() {
        assert_eq!(
            serde_json::to_string(&TicketPriority::Medium).unwrap(),
            "\"medium\""
        );
        assert_eq!(
            serde_json::from_str::<TicketPriority>("\"high\"").unwrap(),
            TicketPriority::High
        );
    }

    #[test]
    fn test_status_as_str_matches_serde() {
        for status in [
            TicketStatus::ToDo,
            TicketStatus::InProgress,
            TicketStatus::Done,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_empty_filter() {
        let filter = TicketFilter::default();
        assert!(filter.status.is_none());
        assert!(filter.priority.is_none());
        assert!(filter.assignee.is_none());
        assert!(filter.search.is_none());
    }
}
