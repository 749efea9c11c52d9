use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    models::{
        ApiResponse, Article, ArticlePage, CreateArticleRequest, ErrorResponse, FeedQuery,
        LoginRequest, LoginResponse, PublicUser, SignupRequest, UpdateArticleRequest,
    },
    validation,
};
use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

// --- Auth ---

/// signup
///
/// [Public Route] Registers a new user. The response never contains the password hash.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created (enveloped)", body = PublicUser),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), AppError> {
    let user = state.auth_service().signup(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User registered successfully", user)),
    ))
}

/// login
///
/// [Public Route] Exchanges credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued (enveloped)", body = LoginResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let response = state.auth_service().login(&payload).await?;
    Ok(Json(ApiResponse::ok("Login successful", response)))
}

// --- Articles ---

/// get_published_articles
///
/// [Public Route] The public feed: published, non-deleted articles with optional
/// category, author-name, and title filters.
#[utoipa::path(
    get,
    path = "/articles",
    params(FeedQuery),
    responses(
        (status = 200, description = "One page of the feed (enveloped)", body = ArticlePage),
        (status = 400, description = "Invalid pagination", body = ErrorResponse)
    )
)]
pub async fn get_published_articles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<ApiResponse<ArticlePage>>, AppError> {
    let (filter, page, size) = validation::feed_params(&query);
    let page = state
        .article_service()
        .find_published(filter, page, size)
        .await?;
    Ok(Json(ApiResponse::ok("Articles retrieved successfully", page)))
}

/// create_article
///
/// [Authenticated Route] Creates an article owned by the caller. Authors only.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created (enveloped)", body = Article),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an author", body = ErrorResponse)
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Article>>), AppError> {
    let article = state.article_service().create(&user, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Article created successfully", article)),
    ))
}

/// get_my_articles
///
/// [Authenticated Route] Every non-deleted article owned by the caller, drafts included.
#[utoipa::path(
    get,
    path = "/articles/me",
    responses(
        (status = 200, description = "Own articles (enveloped)", body = [Article]),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an author", body = ErrorResponse)
    )
)]
pub async fn get_my_articles(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Article>>>, AppError> {
    let articles = state.article_service().find_all_by_author(&user).await?;
    Ok(Json(ApiResponse::ok("Articles retrieved successfully", articles)))
}

/// get_article
///
/// [Authenticated Route] A single article owned by the caller.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found (enveloped)", body = Article),
        (status = 403, description = "Owned by another author", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    let article = state.article_service().find_one(id, &user, false).await?;
    Ok(Json(ApiResponse::ok("Article retrieved successfully", article)))
}

/// update_article
///
/// [Authenticated Route] Partial update; only provided fields change.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated (enveloped)", body = Article),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Owned by another author", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    let article = state
        .article_service()
        .update(id, &user, &payload)
        .await?;
    Ok(Json(ApiResponse::ok("Article updated successfully", article)))
}

/// delete_article
///
/// [Authenticated Route] Soft-deletes an article owned by the caller.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Owned by another author", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.article_service().remove(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
