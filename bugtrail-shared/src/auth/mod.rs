/// Authentication and authorization for BugTrail
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Signed session tokens (HS256, 30-day lifetime)
/// - [`otp`]: One-time code generation and verification
/// - [`middleware`]: Bearer-token request identity (`AuthUser`)
/// - [`access`]: Pure authorization predicates over fetched resources
///
/// # Request flow
///
/// Every protected request passes through two tiers, in order:
///
/// 1. **Role gate**: coarse, checked against `AuthUser::role` before any
///    resource is loaded (e.g. project creation is admin-only).
/// 2. **Membership/ownership predicate**: fine, evaluated by the pure
///    functions in [`access`] after the handler has fetched the resource
///    (and, transitively, its owning project).

pub mod access;
pub mod jwt;
pub mod middleware;
pub mod otp;
pub mod password;
