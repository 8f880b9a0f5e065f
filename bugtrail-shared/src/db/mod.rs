/// Database layer: connection pooling and migrations
///
/// # Modules
///
/// - [`pool`]: PostgreSQL connection pool with health checking
/// - [`migrations`]: Migration runner built on `sqlx::migrate!`

pub mod migrations;
pub mod pool;
