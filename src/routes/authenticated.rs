use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Article management. The router is wrapped in the authentication layer in
/// `create_router`; every handler also receives the resolved `AuthUser` and hands
/// it to the article service, which enforces the author role and ownership.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /articles
        .route("/articles", post(handlers::create_article))
        // GET /articles/me
        // Declared as a static segment so it wins over `/articles/{id}`.
        .route("/articles/me", get(handlers::get_my_articles))
        // GET/PUT/DELETE /articles/{id}
        .route(
            "/articles/{id}",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
}
