/// Project endpoints
///
/// Projects are admin-created containers with an owner and a team-member
/// set. Reading requires membership, with no role-based bypass; reshaping
/// the project (update, delete, team changes) requires the owner or an
/// admin.
///
/// # Endpoints
///
/// - `POST /api/projects` - Create project (admin only)
/// - `GET /api/projects` - List projects the requester belongs to
/// - `GET /api/projects/:id` - Fetch one project
/// - `PUT /api/projects/:id` - Update title/description
/// - `DELETE /api/projects/:id` - Delete project (no cascade)
/// - `POST /api/projects/:id/add-member` - Add a member by email
/// - `POST /api/projects/:id/remove-member` - Remove a member by user ID

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use bugtrail_shared::{
    auth::access::{self, AuthUser},
    models::{
        project::{CreateProject, Project, UpdateProject},
        user::{normalize_email, User},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create-project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// Update-project request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
}

/// Add-member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Remove-member request
#[derive(Debug, Deserialize)]
pub struct RemoveMemberRequest {
    pub user_id: Uuid,
}

/// Loads a project or 404s
async fn load_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Creates a project with the requester as owner and sole member
///
/// # Errors
///
/// - `403 Forbidden`: Requester is not an admin
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Only admins can create projects".to_string(),
        ));
    }

    req.validate().map_err(ApiError::from_validation)?;

    let project = Project::create(
        &state.db,
        CreateProject {
            owner_id: user.id,
            title: req.title,
            description: req.description,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %user.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// Lists projects where the requester is owner or member
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, user.id).await?;
    Ok(Json(projects))
}

/// Fetches a single project
///
/// # Errors
///
/// - `403 Forbidden`: Requester is not a member
/// - `404 Not Found`: No such project
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    Ok(Json(project))
}

/// Updates a project's title and/or description
///
/// # Errors
///
/// - `403 Forbidden`: Requester is neither owner nor admin
/// - `404 Not Found`: No such project
pub async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(ApiError::from_validation)?;

    let project = load_project(&state, id).await?;

    if !access::can_write_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin can modify this project".to_string(),
        ));
    }

    let updated = Project::update(
        &state.db,
        id,
        UpdateProject {
            title: req.title,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes a project
///
/// Tickets and comments under the project are left in place; there is no
/// cascade.
///
/// # Errors
///
/// - `403 Forbidden`: Requester is neither owner nor admin
/// - `404 Not Found`: No such project
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let project = load_project(&state, id).await?;

    if !access::can_write_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin can delete this project".to_string(),
        ));
    }

    Project::delete(&state.db, id).await?;

    tracing::info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a user to the project team, looked up by email
///
/// # Errors
///
/// - `403 Forbidden`: Requester is neither owner nor admin
/// - `404 Not Found`: Project or user not found
/// - `409 Conflict`: User is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(ApiError::from_validation)?;

    let mut project = load_project(&state, id).await?;

    if !access::can_write_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin can manage the team".to_string(),
        ));
    }

    let target = User::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !project.add_team_member(target.id) {
        return Err(ApiError::Conflict("User is already a member".to_string()));
    }

    let updated = project.save(&state.db).await?;

    tracing::info!(project_id = %id, member_id = %target.id, "member added");
    Ok(Json(updated))
}

/// Removes a user from the project team
///
/// Removing someone who is not a member is a no-op and still returns the
/// project; the owner can never be removed.
///
/// # Errors
///
/// - `400 Bad Request`: Target is the project owner
/// - `403 Forbidden`: Requester is neither owner nor admin
/// - `404 Not Found`: No such project
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveMemberRequest>,
) -> ApiResult<Json<Project>> {
    let mut project = load_project(&state, id).await?;

    if !access::can_write_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin can manage the team".to_string(),
        ));
    }

    if req.user_id == project.owner_id {
        return Err(ApiError::BadRequest(
            "The project owner cannot be removed".to_string(),
        ));
    }

    project.remove_team_member(req.user_id);
    let updated = project.save(&state.db).await?;

    tracing::info!(project_id = %id, member_id = %req.user_id, "member removed");
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_description() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{ "title": "Tracker" }"#).unwrap();
        assert_eq!(req.description, "");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_empty_title() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{ "title": "" }"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_partial() {
        let req: UpdateProjectRequest =
            serde_json::from_str(r#"{ "description": "new text" }"#).unwrap();
        assert!(req.title.is_none());
        assert_eq!(req.description.as_deref(), Some("new text"));
        assert!(req.validate().is_ok());
    }
}
