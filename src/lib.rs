use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

// Routing split by access level (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};
use services::{ArticleService, AuthService};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::signup, handlers::login, handlers::get_published_articles,
        handlers::create_article, handlers::get_my_articles, handlers::get_article,
        handlers::update_article, handlers::delete_article
    ),
    components(
        schemas(
            models::Role, models::ArticleStatus, models::PublicUser, models::Article,
            models::SignupRequest, models::LoginRequest, models::LoginResponse,
            models::CreateArticleRequest, models::UpdateArticleRequest,
            models::ArticlePage, models::PageMeta, models::ErrorResponse,
        )
    ),
    tags(
        (name = "newsroom", description = "News publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cloneable container for the repository and configuration.
/// Services are cheap to build per request from these two handles.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.repo.clone(), self.config.clone())
    }

    pub fn article_service(&self) -> ArticleService {
        ArticleService::new(self.repo.clone())
    }
}

// --- Axum FromRef Extractor Implementations ---

// `AuthUser` pulls these out of the state when resolving a bearer token.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// Header carrying the per-request correlation id, generated when absent.
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// auth_middleware
///
/// Gate for the authenticated routes. Resolving `AuthUser` verifies the token (or
/// the local `x-user-id` header) and loads the caller; a failure answers 401 and
/// the handler never runs. On success the caller is stored in the request
/// extensions, where the handler's own `AuthUser` extractor picks it up.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// Browser access is open: any origin, method, and header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any)
}

/// create_router
///
/// Builds the newsroom HTTP surface: OpenAPI docs, signup/login/feed without
/// auth, article management behind `auth_middleware`. Every response carries an
/// `x-request-id` and is logged with its latency.
pub fn create_router(state: AppState) -> Router {
    let protected = authenticated::authenticated_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    // Outermost first: the id is assigned before the request span opens.
    let observability = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER));

    app.layer(observability).layer(cors_layer())
}

/// Opens the `http_request` span that every log line of a request nests under.
fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
