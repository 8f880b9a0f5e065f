/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, and OTP flows
/// - `projects`: Project CRUD and team management
/// - `tickets`: Ticket CRUD, filtering, and assignment
/// - `comments`: Ticket comments

pub mod auth;
pub mod comments;
pub mod health;
pub mod projects;
pub mod tickets;
