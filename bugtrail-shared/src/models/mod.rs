/// Database models for BugTrail
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, roles, and transient OTP state
/// - `project`: Projects with owner and embedded team-member set
/// - `ticket`: Tickets within a project (priority, status, assignee)
/// - `comment`: Comments on tickets
///
/// Referential fields between models are plain UUIDs; there are no
/// foreign-key constraints at the store level, so all referential and
/// membership integrity is enforced by the callers before each mutation.

pub mod comment;
pub mod project;
pub mod ticket;
pub mod user;
