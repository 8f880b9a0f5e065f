/// Project model and database operations
///
/// A project has an immutable owner and an embedded team-member set. The
/// owner is inserted into the member set at creation and can never be
/// removed, so `owner ∈ member_ids` holds for the lifetime of the row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     member_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The member set is a plain array rather than a join table: membership
/// checks are then pure functions over a single fetched row (see
/// `auth::access`), and deleting a project cannot cascade anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub owner_id: Uuid,

    /// Project title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Team-member set; always contains the owner
    pub member_ids: Vec<Uuid>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Owner (and sole initial member)
    pub owner_id: Uuid,

    /// Project title
    pub title: String,

    /// Description (may be empty)
    pub description: String,
}

/// Input for updating a project
///
/// Only non-None fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
}

const PROJECT_COLUMNS: &str =
    "id, owner_id, title, description, member_ids, created_at, updated_at";

impl Project {
    /// Creates a new project with the owner as sole member
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (owner_id, title, description, member_ids)
            VALUES ($1, $2, $3, ARRAY[$1])
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists projects where the user is owner or member, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_id = $1 OR $1 = ANY(member_ids)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates title/description; only supplied fields change
    ///
    /// Returns the updated project, or None if it doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Adds a user to the in-memory member set
    ///
    /// Returns false without touching the set when the user is already a
    /// member (the owner always is). Persist with [`save`](Self::save).
    pub fn add_team_member(&mut self, user_id: Uuid) -> bool {
        if self.owner_id == user_id || self.member_ids.contains(&user_id) {
            return false;
        }
        self.member_ids.push(user_id);
        true
    }

    /// Removes a user from the in-memory member set
    ///
    /// Idempotent: removing a non-member leaves the set unchanged, and the
    /// owner is never removed. Returns whether the set changed. Persist
    /// with [`save`](Self::save).
    pub fn remove_team_member(&mut self, user_id: Uuid) -> bool {
        if user_id == self.owner_id {
            return false;
        }
        let before = self.member_ids.len();
        self.member_ids.retain(|id| *id != user_id);
        self.member_ids.len() != before
    }

    /// Persists the mutable fields of this row
    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET title = $2, description = $3, member_ids = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.member_ids)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project by ID
    ///
    /// Tickets and comments referencing the project are left in place;
    /// there is no cascade in this schema.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project(owner: Uuid) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "API rewrite".to_string(),
            description: String::new(),
            member_ids: vec![owner],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_in_member_set() {
        let owner = Uuid::new_v4();
        let project = sample_project(owner);
        assert!(project.member_ids.contains(&owner));
    }

    #[test]
    fn test_update_default_is_noop_shape() {
        let update = UpdateProject::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
    }

    #[test]
    fn test_add_team_member_rejects_duplicates() {
        let owner = Uuid::new_v4();
        let mut project = sample_project(owner);
        let member = Uuid::new_v4();

        assert!(project.add_team_member(member));
        assert!(!project.add_team_member(member));
        assert_eq!(
            project.member_ids.iter().filter(|id| **id == member).count(),
            1
        );
        // The owner is a member from creation
        assert!(!project.add_team_member(owner));
    }

    #[test]
    fn test_remove_team_member_is_idempotent() {
        let owner = Uuid::new_v4();
        let mut project = sample_project(owner);
        let member = Uuid::new_v4();
        project.add_team_member(member);

        assert!(project.remove_team_member(member));
        let after_first = project.member_ids.clone();

        // Second removal of the same user changes nothing
        assert!(!project.remove_team_member(member));
        assert_eq!(project.member_ids, after_first);

        // Removing someone who was never a member changes nothing either
        assert!(!project.remove_team_member(Uuid::new_v4()));
        assert_eq!(project.member_ids, after_first);
    }

    #[test]
    fn test_owner_cannot_be_removed_from_team() {
        let owner = Uuid::new_v4();
        let mut project = sample_project(owner);

        assert!(!project.remove_team_member(owner));
        assert!(project.member_ids.contains(&owner));
    }
}
