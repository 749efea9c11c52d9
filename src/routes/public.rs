use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints: health, signup/login, and the public feed.
/// The feed handler only ever returns published, non-deleted articles; that
/// restriction lives in the repository query, not in the route.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/signup
        .route("/auth/signup", post(handlers::signup))
        // POST /auth/login
        .route("/auth/login", post(handlers::login))
        // GET /articles?page=&size=&category=&author=&q=
        .route("/articles", get(handlers::get_published_articles))
}
