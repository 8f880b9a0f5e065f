/// Ticket endpoints
///
/// Tickets live inside a project; every operation first proves the
/// requester belongs to that project, admins included. Editing is open to
/// the creator, the current assignee, and admins; deletion to the creator
/// and admins. Handing a ticket to a third party is an admin action, both
/// through the partial update and the dedicated assign route.
///
/// # Endpoints
///
/// - `POST /api/tickets` - Create ticket
/// - `GET /api/tickets/project/:project_id` - List a project's tickets
/// - `GET /api/tickets/:id` - Fetch one ticket
/// - `PUT /api/tickets/:id` - Partial update
/// - `PUT /api/tickets/:id/assign` - Assign to a member (admin only)
/// - `DELETE /api/tickets/:id` - Delete ticket

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bugtrail_shared::{
    auth::access::{self, AuthUser},
    models::{
        project::Project,
        ticket::{CreateTicket, Ticket, TicketFilter, TicketPriority, TicketStatus},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create-ticket request
///
/// `project_id` and `assignee` arrive as strings: a malformed project id is
/// a hard 400, while a malformed assignee is silently treated as
/// unassigned. Existing clients depend on both behaviors.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    pub project_id: String,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub priority: Option<TicketPriority>,

    pub assignee: Option<String>,
}

/// Partial-update request
///
/// `assignee` is tri-state: absent leaves it alone, `null` (or an empty
/// string) clears it, and a user id sets it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTicketRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub priority: Option<TicketPriority>,

    pub status: Option<TicketStatus>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub assignee: Option<Option<String>>,
}

/// Assign request
///
/// The assign route only ever sets a member; unassignment goes through the
/// partial update. `Option` keeps a missing or `null` field out of the
/// deserializer's hands so the handler can answer 400 instead of 422.
#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    pub assignee: Option<String>,
}

/// Filter query parameters for listing
///
/// `assignee` arrives as a string; a value that is not a UUID drops the
/// filter instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct TicketListQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee: Option<String>,
    pub search: Option<String>,
}

/// Keeps "field present but null" distinguishable from "field absent"
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Resolves the assign route's target, rejecting absent or malformed ids
fn parse_assign_target(assignee: Option<&str>) -> Result<Uuid, ApiError> {
    assignee
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid assignee id".to_string()))
}

/// Drops an assignee filter value that is not a well-formed UUID
fn assignee_filter(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|s| Uuid::parse_str(s).ok())
}

/// Loads a ticket and its owning project, or 404s
async fn load_ticket_and_project(
    state: &AppState,
    ticket_id: Uuid,
) -> ApiResult<(Ticket, Project)> {
    let ticket = Ticket::find_by_id(&state.db, ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    // Orphaned tickets (project deleted, no cascade) are unreachable
    let project = Project::find_by_id(&state.db, ticket.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok((ticket, project))
}

/// Creates a ticket in `To Do` status
///
/// The assignee, when given, is stored without a membership check; the
/// validated path is the assign route.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed project id
/// - `403 Forbidden`: Requester is not a member of the project
/// - `404 Not Found`: No such project
pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    if !user.role.can_contribute() {
        return Err(ApiError::Forbidden(
            "Not allowed to create tickets".to_string(),
        ));
    }

    req.validate().map_err(ApiError::from_validation)?;

    let project_id = Uuid::parse_str(&req.project_id)
        .map_err(|_| ApiError::BadRequest("Invalid project id".to_string()))?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    // A malformed assignee id is treated as "unassigned", not rejected
    let assignee = req
        .assignee
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok());

    let ticket = Ticket::create(
        &state.db,
        CreateTicket {
            project_id,
            created_by: user.id,
            assignee,
            title: req.title,
            description: req.description,
            priority: req.priority.unwrap_or(TicketPriority::Medium),
        },
    )
    .await?;

    tracing::info!(ticket_id = %ticket.id, project_id = %project_id, "ticket created");
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Lists a project's tickets, newest first, with optional filters
///
/// Filters are exact matches on status, priority, and assignee plus a
/// case-insensitive substring search on the title.
///
/// # Errors
///
/// - `403 Forbidden`: Requester is not a member of the project
/// - `404 Not Found`: No such project
pub async fn list_project_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<TicketListQuery>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    let filter = TicketFilter {
        status: query.status,
        priority: query.priority,
        assignee: assignee_filter(query.assignee.as_deref()),
        search: query.search.filter(|s| !s.is_empty()),
    };

    let tickets = Ticket::list_by_project(&state.db, project_id, &filter).await?;
    Ok(Json(tickets))
}

/// Fetches a single ticket
///
/// # Errors
///
/// - `403 Forbidden`: Requester is not a member of the owning project
/// - `404 Not Found`: No such ticket
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Ticket>> {
    let (ticket, project) = load_ticket_and_project(&state, id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    Ok(Json(ticket))
}

/// Partially updates a ticket
///
/// # Errors
///
/// - `403 Forbidden`: Not a member; not creator/assignee/admin; or a
///   non-admin tried to assign someone else
/// - `404 Not Found`: No such ticket
pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTicketRequest>,
) -> ApiResult<Json<Ticket>> {
    req.validate().map_err(ApiError::from_validation)?;

    let (mut ticket, project) = load_ticket_and_project(&state, id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    if !access::can_write_ticket(&user, ticket.created_by, ticket.assignee) {
        return Err(ApiError::Forbidden(
            "Only the creator, assignee, or an admin can edit this ticket".to_string(),
        ));
    }

    if let Some(title) = req.title {
        ticket.title = title;
    }
    if let Some(description) = req.description {
        ticket.description = description;
    }
    if let Some(priority) = req.priority {
        ticket.priority = priority;
    }
    if let Some(status) = req.status {
        ticket.status = status;
    }

    match req.assignee {
        None => {}
        Some(new_assignee) => {
            // Empty string counts as clearing; a malformed id is ignored
            let parsed = match new_assignee.as_deref() {
                None | Some("") => Some(None),
                Some(s) => Uuid::parse_str(s).ok().map(Some),
            };

            if let Some(new_value) = parsed {
                if !access::can_set_assignee(&user, new_value) {
                    return Err(ApiError::Forbidden(
                        "Only admins can assign tickets to other users".to_string(),
                    ));
                }
                ticket.assignee = new_value;
            }
        }
    }

    let saved = ticket.save(&state.db).await?;
    Ok(Json(saved))
}

/// Assigns a ticket to a project member (admin only)
///
/// Unlike the loose create path, this route validates that the target user
/// belongs to the ticket's project. Unassignment is not an assign
/// operation; clearing goes through the partial update.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or malformed assignee id, or target is not
///   a member
/// - `403 Forbidden`: Requester is not an admin
/// - `404 Not Found`: No such ticket
pub async fn assign_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignTicketRequest>,
) -> ApiResult<Json<Ticket>> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Only admins can assign tickets".to_string(),
        ));
    }

    let (mut ticket, project) = load_ticket_and_project(&state, id).await?;

    let target = parse_assign_target(req.assignee.as_deref())?;

    if !access::is_member(&project, target) {
        return Err(ApiError::BadRequest(
            "Assignee is not a member of this project".to_string(),
        ));
    }

    ticket.assignee = Some(target);
    let saved = ticket.save(&state.db).await?;

    tracing::info!(ticket_id = %id, assignee = %target, "ticket assigned");
    Ok(Json(saved))
}

/// Deletes a ticket
///
/// Comments on the ticket are left in place; there is no cascade.
///
/// # Errors
///
/// - `403 Forbidden`: Requester is neither creator nor admin
/// - `404 Not Found`: No such ticket
pub async fn delete_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let (ticket, project) = load_ticket_and_project(&state, id).await?;

    if !access::can_read_project(&user, &project) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    if !access::can_delete_ticket(&user, ticket.created_by) {
        return Err(ApiError::Forbidden(
            "Only the creator or an admin can delete this ticket".to_string(),
        ));
    }

    Ticket::delete(&state.db, id).await?;

    tracing::info!(ticket_id = %id, "ticket deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_assignee_tri_state() {
        // Absent: leave unchanged
        let req: UpdateTicketRequest = serde_json::from_str(r#"{ "title": "x" }"#).unwrap();
        assert!(req.assignee.is_none());

        // Null: clear
        let req: UpdateTicketRequest =
            serde_json::from_str(r#"{ "assignee": null }"#).unwrap();
        assert_eq!(req.assignee, Some(None));

        // Value: set
        let req: UpdateTicketRequest =
            serde_json::from_str(r#"{ "assignee": "3fa85f64-5717-4562-b3fc-2c963f66afa6" }"#)
                .unwrap();
        assert_eq!(
            req.assignee,
            Some(Some("3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string()))
        );
    }

    #[test]
    fn test_create_request_priority_defaults_absent() {
        let req: CreateTicketRequest = serde_json::from_str(
            r#"{ "project_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "title": "Crash" }"#,
        )
        .unwrap();
        assert!(req.priority.is_none());
        assert!(req.assignee.is_none());
        assert_eq!(req.description, "");
    }

    #[test]
    fn test_list_query_status_wire_format() {
        let query: TicketListQuery =
            serde_urlencoded::from_str("status=To%20Do&priority=high").unwrap();
        assert_eq!(query.status, Some(TicketStatus::ToDo));
        assert_eq!(query.priority, Some(TicketPriority::High));
        assert!(query.assignee.is_none());
    }

    #[test]
    fn test_list_query_rejects_unknown_status() {
        assert!(serde_urlencoded::from_str::<TicketListQuery>("status=Started").is_err());
    }

    #[test]
    fn test_list_query_ignores_malformed_assignee() {
        let query: TicketListQuery =
            serde_urlencoded::from_str("assignee=not-a-uuid").unwrap();
        assert_eq!(query.assignee.as_deref(), Some("not-a-uuid"));
        assert!(assignee_filter(query.assignee.as_deref()).is_none());

        let id = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        assert_eq!(
            assignee_filter(Some(id)),
            Some(Uuid::parse_str(id).unwrap())
        );
    }

    #[test]
    fn test_assign_target_requires_well_formed_id() {
        // Absent and null both land here as None
        assert!(matches!(
            parse_assign_target(None),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_assign_target(Some("not-a-uuid")),
            Err(ApiError::BadRequest(_))
        ));

        let id = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        assert_eq!(
            parse_assign_target(Some(id)).unwrap(),
            Uuid::parse_str(id).unwrap()
        );
    }
}
