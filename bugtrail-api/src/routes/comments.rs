/// Comment endpoints
///
/// Comments hang off tickets. Posting and reading require membership in the
/// ticket's project; deletion additionally requires being the author or an
/// admin.
///
/// # Endpoints
///
/// - `POST /api/comments/:ticket_id` - Post a comment
/// - `GET /api/comments/:ticket_id` - List a ticket's comments
/// - `DELETE /api/comments/:id` - Delete a comment

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
        comment::{Comment, CreateComment},
        project::Project,
        ticket::Ticket,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create-comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Text must be 1-5000 characters"))]
    pub text: String,
}

/// Resolves a ticket's owning project for the membership check
async fn project_of_ticket(state: &AppState, ticket_id: Uuid) -> ApiResult<Project> {
    let ticket = Ticket::find_by_id(&state.db, ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    Project::find_by_id(&state.db, ticket.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Posts a comment on a ticket
///
/// # Errors
///
/// - `403 Forbidden`: Requester is not a member of the ticket's project
/// - `404 Not Found`: No such ticket
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    if !user.role.can_contribute() {
        return Err(ApiError::Forbidden(
            "Not allowed to post comments".to_string(),
        ));
    }

    req.validate().map_err(ApiError::from_validation)?;

    let project = project_of_ticket(&state, ticket_id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    let comment = Comment::create(
        &state.db,
        CreateComment {
            ticket_id,
            author_id: user.id,
            text: req.text,
        },
    )
    .await?;

    tracing::info!(comment_id = %comment.id, ticket_id = %ticket_id, "comment posted");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Lists a ticket's comments, newest first
///
/// # Errors
///
/// - `403 Forbidden`: Requester is not a member of the ticket's project
/// - `404 Not Found`: No such ticket
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let project = project_of_ticket(&state, ticket_id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    let comments = Comment::list_by_ticket(&state.db, ticket_id).await?;
    Ok(Json(comments))
}

/// Deletes a comment
///
/// # Errors
///
/// - `403 Forbidden`: Not a member, or neither author nor admin
/// - `404 Not Found`: No such comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    let project = project_of_ticket(&state, comment.ticket_id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    if !access::can_delete_comment(&user, comment.author_id) {
        return Err(ApiError::Forbidden(
            "Only the author or an admin can delete this comment".to_string(),
        ));
    }

    Comment::delete(&state.db, id).await?;

    tracing::info!(comment_id = %id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_empty_text() {
        let req: CreateCommentRequest = serde_json::from_str(r#"{ "text": "" }"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateCommentRequest =
            serde_json::from_str(r#"{ "text": "looks like a regression" }"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
