use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use newsroom::{
    AppConfig, AppState, InMemoryRepository, config::Env, create_router,
    repository::RepositoryState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

fn test_state() -> AppState {
    let config = AppConfig {
        env: Env::Production,
        jwt_secret: "api-test-secret".to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(InMemoryRepository::new()) as RepositoryState, config)
}

async fn spawn_app() -> TestApp {
    let router = create_router(test_state());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn signup(&self, name: &str, email: &str, role: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/signup"))
            .json(&json!({
                "name": name, "email": email, "password": "Str0ng!Pass", "role": role
            }))
            .send()
            .await
            .expect("signup request failed")
    }

    /// Registers a user and returns a bearer token for it.
    async fn token_for(&self, name: &str, email: &str, role: &str) -> String {
        assert_eq!(self.signup(name, email, role).await.status(), 201);
        let body: Value = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": "Str0ng!Pass" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    async fn create_article(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/articles"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

// --- Live Server Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_signup_login_and_publish_flow() {
    let app = spawn_app().await;
    let token = app.token_for("Jane Doe", "jane@example.com", "author").await;

    let response = app
        .create_article(
            &token,
            json!({ "title": "Launch", "content": "Body", "category": "Tech", "status": "published" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["authorName"], "Jane Doe");
    assert_eq!(created["data"]["status"], "published");

    let feed: Value = app
        .client
        .get(app.url("/articles?author=JANE&page=1&size=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(feed["data"]["pagination"]["total"], 1);
    assert_eq!(feed["data"]["pagination"]["totalPages"], 1);
    assert_eq!(feed["data"]["items"][0]["title"], "Launch");
}

#[tokio::test]
async fn test_duplicate_signup_is_conflict() {
    let app = spawn_app().await;
    assert_eq!(app.signup("Jane Doe", "jane@example.com", "author").await.status(), 201);

    let response = app.signup("Jane Doe", "JANE@example.com", "reader").await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_reader_cannot_manage_articles() {
    let app = spawn_app().await;
    let token = app.token_for("Rita Reader", "rita@example.com", "reader").await;

    let response = app
        .create_article(&token, json!({ "title": "T", "content": "C", "category": "X" }))
        .await;
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .get(app.url("/articles/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_ownership_and_soft_delete_over_http() {
    let app = spawn_app().await;
    let jane = app.token_for("Jane Doe", "jane@example.com", "author").await;
    let john = app.token_for("John Smith", "john@example.com", "author").await;

    let created: Value = app
        .create_article(&jane, json!({ "title": "Mine", "content": "C", "category": "X" }))
        .await
        .json()
        .await
        .unwrap();
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/articles/{id}");

    let response = app
        .client
        .put(app.url(&path))
        .bearer_auth(&john)
        .json(&json!({ "title": "Stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .delete(app.url(&path))
        .bearer_auth(&jane)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // After deletion, the other author sees 404, not 403.
    let response = app
        .client
        .get(app.url(&path))
        .bearer_auth(&john)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

// --- In-Process Router Tests ---

#[tokio::test]
async fn test_protected_route_requires_token() {
    let router = create_router(test_state());

    let response = router
        .oneshot(Request::get("/articles/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::get("/articles/me")
                .header("authorization", "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::post("/auth/signup")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_non_numeric_page_is_bad_request() {
    let router = create_router(test_state());

    let response = router
        .oneshot(Request::get("/articles?page=abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
