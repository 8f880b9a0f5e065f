/// Authorization predicates
///
/// Every fine-grained access decision in the API funnels through the pure
/// functions in this module. Handlers fetch the resource (and, for tickets
/// and comments, its owning project), then ask a single question here. The
/// functions take plain data and return `bool`, so the whole policy is unit
/// testable without a database.
///
/// Two tiers of policy exist:
///
/// - Account role (`admin` / `member`), checked by handlers before loading
///   anything for role-gated operations such as project creation.
/// - The predicates here, which combine role with project membership,
///   ownership, and authorship after the resource is loaded.

use uuid::Uuid;

use crate::models::project::Project;
use crate::models::user::UserRole;

/// Request identity attached by the auth middleware
///
/// Carries the ID and role of the user as they exist in the database right
/// now, not as they were when the token was minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Whether a user belongs to a project's team
///
/// The owner is always a member; the member set contains the owner from
/// creation, but ownership is checked explicitly so the invariant does not
/// silently depend on the stored array.
pub fn is_member(project: &Project, user_id: Uuid) -> bool {
    project.owner_id == user_id || project.member_ids.contains(&user_id)
}

/// Read access to a project and everything under it
///
/// Membership only. The admin role does not open other teams' projects;
/// an admin who needs to see one joins its team like anyone else. Admin
/// privilege applies to the write and delete predicates below, after this
/// gate has passed.
pub fn can_read_project(user: &AuthUser, project: &Project) -> bool {
    is_member(project, user.id)
}

/// Write access to the project itself
///
/// Covers update, delete, and team changes (add/remove member). Plain
/// members can read and work tickets but never reshape the project.
pub fn can_write_project(user: &AuthUser, project: &Project) -> bool {
    user.is_admin() || project.owner_id == user.id
}

/// Whether a user may update a ticket's fields
///
/// Admins, the ticket's creator, and its current assignee may edit.
pub fn can_write_ticket(
    user: &AuthUser,
    created_by: Uuid,
    assignee: Option<Uuid>,
) -> bool {
    user.is_admin() || created_by == user.id || assignee == Some(user.id)
}

/// Whether a user may delete a ticket
///
/// Narrower than editing: the assignee works the ticket but does not own
/// its existence.
pub fn can_delete_ticket(user: &AuthUser, created_by: Uuid) -> bool {
    user.is_admin() || created_by == user.id
}

/// Whether a user may change a ticket's assignee to `new_assignee`
///
/// Clearing the assignee is always allowed for anyone who can edit the
/// ticket. Assigning a user requires admin rights or self-assignment;
/// handing work to a third party is an admin action.
pub fn can_set_assignee(user: &AuthUser, new_assignee: Option<Uuid>) -> bool {
    match new_assignee {
        None => true,
        Some(target) => user.is_admin() || target == user.id,
    }
}

/// Whether a user may delete a comment
///
/// Admins and the comment's author. Membership in the ticket's project is
/// checked separately by the handler before this runs.
pub fn can_delete_comment(user: &AuthUser, author_id: Uuid) -> bool {
    user.is_admin() || author_id == user.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project_with(owner: Uuid, members: Vec<Uuid>) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "Tracker".to_string(),
            description: String::new(),
            member_ids: members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn admin() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role: UserRole::Admin,
        }
    }

    fn member(id: Uuid) -> AuthUser {
        AuthUser {
            id,
            role: UserRole::Member,
        }
    }

    #[test]
    fn test_owner_is_always_member() {
        let owner = Uuid::new_v4();
        // Empty member array; ownership alone must suffice
        let project = project_with(owner, vec![]);
        assert!(is_member(&project, owner));
    }

    #[test]
    fn test_non_member_is_rejected() {
        let project = project_with(Uuid::new_v4(), vec![Uuid::new_v4()]);
        assert!(!is_member(&project, Uuid::new_v4()));
    }

    #[test]
    fn test_team_member_can_read_but_not_write_project() {
        let owner = Uuid::new_v4();
        let teammate = Uuid::new_v4();
        let project = project_with(owner, vec![owner, teammate]);

        let user = member(teammate);
        assert!(can_read_project(&user, &project));
        assert!(!can_write_project(&user, &project));
    }

    #[test]
    fn test_owner_can_write_project() {
        let owner = Uuid::new_v4();
        let project = project_with(owner, vec![owner]);
        assert!(can_write_project(&member(owner), &project));
    }

    #[test]
    fn test_admin_without_membership_cannot_read() {
        // Foreign owner, empty member set: the admin is not on the team
        let project = project_with(Uuid::new_v4(), vec![]);
        let user = admin();
        assert!(!is_member(&project, user.id));
        assert!(!can_read_project(&user, &project));
    }

    #[test]
    fn test_admin_can_write_any_project() {
        let project = project_with(Uuid::new_v4(), vec![]);
        assert!(can_write_project(&admin(), &project));
    }

    #[test]
    fn test_ticket_write_creator_assignee_admin() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        assert!(can_write_ticket(&member(creator), creator, Some(assignee)));
        assert!(can_write_ticket(&member(assignee), creator, Some(assignee)));
        assert!(!can_write_ticket(&member(stranger), creator, Some(assignee)));
        assert!(can_write_ticket(&admin(), creator, Some(assignee)));
    }

    #[test]
    fn test_ticket_delete_excludes_assignee() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();

        assert!(can_delete_ticket(&member(creator), creator));
        assert!(!can_delete_ticket(&member(assignee), creator));
        assert!(can_delete_ticket(&admin(), creator));
    }

    #[test]
    fn test_reassignment_rules() {
        let user = member(Uuid::new_v4());
        let other = Uuid::new_v4();

        // Clearing is open to anyone who may edit the ticket
        assert!(can_set_assignee(&user, None));
        // Self-assignment is allowed
        assert!(can_set_assignee(&user, Some(user.id)));
        // Assigning a third party requires admin
        assert!(!can_set_assignee(&user, Some(other)));
        assert!(can_set_assignee(&admin(), Some(other)));
    }

    #[test]
    fn test_comment_delete_author_or_admin() {
        let author = Uuid::new_v4();

        assert!(can_delete_comment(&member(author), author));
        assert!(!can_delete_comment(&member(Uuid::new_v4()), author));
        assert!(can_delete_comment(&admin(), author));
    }
}
