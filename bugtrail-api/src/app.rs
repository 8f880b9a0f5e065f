/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use bugtrail_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = bugtrail_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use bugtrail_shared::auth::middleware::jwt_auth_middleware;
use bugtrail_shared::email::{EmailSender, HttpMailer, NoopMailer};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound email sender
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    /// Creates new application state
    ///
    /// Picks the mail sender from config: the HTTP provider when one is
    /// configured, otherwise the log-only sender.
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer: Arc<dyn EmailSender> = match &config.email {
            Some(email) => Arc::new(HttpMailer::new(
                email.api_url.clone(),
                email.api_key.clone(),
                email.from.clone(),
            )),
            None => Arc::new(NoopMailer),
        };

        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Creates state with an explicit mail sender (tests)
    pub fn with_mailer(db: PgPool, config: Config, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── /auth/                       # Public
///     │   ├── POST /register/send-otp
///     │   ├── POST /register/verify-otp
///     │   ├── POST /login
///     │   ├── POST /forgot-password
///     │   ├── POST /reset-password
///     │   └── POST /resend-otp
///     ├── /projects/                   # Authenticated
///     │   ├── POST /                   GET /
///     │   ├── GET /:id   PUT /:id   DELETE /:id
///     │   ├── POST /:id/add-member
///     │   └── POST /:id/remove-member
///     ├── /tickets/                    # Authenticated
///     │   ├── POST /
///     │   ├── GET /project/:project_id
///     │   ├── GET /:id   PUT /:id   DELETE /:id
///     │   └── PUT /:id/assign
///     └── /comments/                   # Authenticated
///         ├── POST /:id  GET /:id     # :id = ticket
///         └── DELETE /:id              # :id = comment
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route-group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no token exists yet during these flows
    let auth_routes = Router::new()
        .route("/register/send-otp", post(routes::auth::register_send_otp))
        .route(
            "/register/verify-otp",
            post(routes::auth::register_verify_otp),
        )
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password))
        .route("/resend-otp", post(routes::auth::resend_otp));

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/add-member", post(routes::projects::add_member))
        .route("/:id/remove-member", post(routes::projects::remove_member));

    let ticket_routes = Router::new()
        .route("/", post(routes::tickets::create_ticket))
        .route(
            "/project/:project_id",
            get(routes::tickets::list_project_tickets),
        )
        .route(
            "/:id",
            get(routes::tickets::get_ticket)
                .put(routes::tickets::update_ticket)
                .delete(routes::tickets::delete_ticket),
        )
        .route("/:id/assign", put(routes::tickets::assign_ticket));

    // :id is the ticket for POST/GET and the comment for DELETE
    let comment_routes = Router::new().route(
        "/:id",
        post(routes::comments::create_comment)
            .get(routes::comments::list_comments)
            .delete(routes::comments::delete_comment),
    );

    let protected = Router::new()
        .nest("/projects", project_routes)
        .nest("/tickets", ticket_routes)
        .nest("/comments", comment_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new().nest("/auth", auth_routes).merge(protected);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Delegates to the shared middleware, which validates the Bearer token and
/// re-loads the user; failures surface through the unified error type.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    jwt_auth_middleware(
        state.db.clone(),
        state.config.jwt.secret.clone(),
        req,
        next,
    )
    .await
    .map_err(crate::error::ApiError::from)
}
