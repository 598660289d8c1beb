use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use authz::config::AuthzConfig;
use authz::{AuthzEngine, Authorizers, ResourceKind, SharedAuthorizer};

pub mod credential;
pub mod error;
pub mod handlers;
pub mod models;
pub mod protect;
pub mod server;

// Re-export server functions for convenience
pub use server::{start_server, start_server_with_shutdown, ApiConfig};

use credential::SessionCookie;
use protect::ProtectLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<user::UserDatabase>,
    pub db: Arc<database::Database>,
    pub engine: AuthzEngine,
    pub authorizers: Authorizers,
    pub authz: Arc<AuthzConfig>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        users: user::UserDatabase,
        db: database::Database,
        authz: AuthzConfig,
        config: ApiConfig,
    ) -> Self {
        let users = Arc::new(users);
        let db = Arc::new(db);

        let engine = AuthzEngine::new(users.clone());
        let authorizers = Authorizers::new(users.clone(), db.clone(), authz.action_table());

        Self {
            users,
            db,
            engine,
            authorizers,
            authz: Arc::new(authz),
            config: Arc::new(config),
        }
    }

    /// A gate running `predicates` in order, configured from this state.
    pub fn protect(&self, predicates: Vec<SharedAuthorizer>) -> ProtectLayer {
        ProtectLayer::new(self.engine.clone(), predicates)
            .with_cookie(SessionCookie::new(self.config.cookie_name.clone()))
            .with_body_limit(self.config.body_limit)
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::profile::get_profile,
        handlers::admin::admin_dashboard,
        handlers::submission::create_submission,
        handlers::submission::get_submission,
        handlers::submission::comment_submission,
        handlers::submission::comment_submission_batch,
        handlers::submission::get_submission_file,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::DatabaseHealth,
            models::ProfileResponse,
            models::AdminResponse,
            models::CreateSubmissionForm,
            models::SubmissionResponse,
            models::SubmissionFileResponse,
            models::CommentForm,
            models::CommentResponse,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "The authenticated caller"),
        (name = "submissions", description = "Submissions, files and review actions"),
        (name = "admin", description = "Administrator endpoints"),
    ),
    info(
        title = "Gatekeeper API",
        version = "1.0.0",
        description = "Submission service behind per-request authorization",
    ),
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the main API router with all routes and middleware
///
/// Every gated route declares its checks here; they run in the listed order.
pub fn create_router(state: AppState) -> Router {
    let az = &state.authorizers;
    let roles = &state.authz.roles;

    let api_v1 = Router::new()
        // Public
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(openapi_json))
        // Any authenticated user
        .route(
            "/profile",
            get(handlers::profile::get_profile).route_layer(state.protect(vec![])),
        )
        // Submissions
        .route(
            "/submissions",
            post(handlers::submission::create_submission).route_layer(state.protect(vec![
                az.has_any_role(roles.staff.clone()),
                az.within_limit(ResourceKind::Submission, state.authz.submission_limit),
            ])),
        )
        .route(
            "/submissions/:submission_id",
            get(handlers::submission::get_submission)
                .route_layer(state.protect(vec![az.owns_resource(ResourceKind::Submission)])),
        )
        .route(
            "/submissions/:submission_id/comment",
            post(handlers::submission::comment_submission)
                .route_layer(state.protect(vec![az.can_perform_action()])),
        )
        .route(
            "/submission-batch/:submission_ids/comment",
            post(handlers::submission::comment_submission_batch).route_layer(state.protect(vec![
                az.owns_resource(ResourceKind::SubmissionBatch),
                az.can_perform_action(),
            ])),
        )
        .route(
            "/files/:file_id",
            get(handlers::submission::get_submission_file)
                .route_layer(state.protect(vec![az.owns_resource(ResourceKind::SubmissionFile)])),
        )
        // Administrators
        .route(
            "/admin",
            get(handlers::admin::admin_dashboard)
                .route_layer(state.protect(vec![az.has_all_roles(roles.administrators.clone())])),
        );

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
