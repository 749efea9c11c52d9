use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Enumerations (Mapped to Postgres enum types) ---

/// Role
///
/// The RBAC field of a user. Stored as the Postgres enum `user_role` and always
/// emitted in lowercase. Input is matched case-insensitively by [`Role::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Author,
    Reader,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "author" => Some(Role::Author),
            "reader" => Some(Role::Reader),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::Reader => "reader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ArticleStatus
///
/// Publication state. Only `published` articles are visible in the public feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "article_status", rename_all = "lowercase")]
#[ts(export)]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(ArticleStatus::Draft),
            "published" => Some(ArticleStatus::Published),
            _ => None,
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Row of the `users` table. Carries the bcrypt hash, so it is never serialized;
/// handlers convert it into [`PublicUser`] before it leaves the process.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Normalized (trimmed, lowercased). Unique index `users_email_key`.
    pub email: String,
    // bcrypt hash.
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// PublicUser
///
/// The externally visible projection of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Article
///
/// Row of the `articles` table joined with the owning user's name.
/// `author_id` is written once at insert time and no update statement touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: ArticleStatus,
    pub author_id: Uuid,
    // Loaded via a JOIN on `users`.
    pub author_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // Soft-delete marker. Always `None` on rows returned by default reads.
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// --- Validated Inputs (Service -> Repository) ---

/// Insert payload for a user whose fields have passed validation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Insert payload for an article whose fields have passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: ArticleStatus,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<ArticleStatus>,
}

/// Normalized public-feed filters. Blank inputs are dropped to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    // Exact match.
    pub category: Option<String>,
    // Case-insensitive partial match on the author's name.
    pub author: Option<String>,
    // Case-insensitive partial match on the title.
    pub q: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Input payload for `POST /auth/signup`. Every field defaults to empty so that
/// missing fields are reported together with the other validation failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct SignupRequest {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "Str0ng!Pass")]
    pub password: String,
    #[schema(example = "author")]
    pub role: String,
}

/// LoginRequest
///
/// Input payload for `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateArticleRequest
///
/// Input payload for `POST /articles`. `status` defaults to `draft`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "draft")]
    pub status: Option<String>,
}

/// UpdateArticleRequest
///
/// Partial update payload for `PUT /articles/{id}`. Only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// FeedQuery
///
/// Query parameters accepted by the public feed (`GET /articles`).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Page size between 1 and 100 (default 10).
    pub size: Option<i64>,
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive partial match on the author's name.
    pub author: Option<String>,
    /// Case-insensitive partial match on the title.
    pub q: Option<String>,
}

// --- Response Schemas (Output) ---

/// LoginResponse
///
/// Issued access token plus the authenticated user's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: PublicUser,
}

/// PageMeta
///
/// Pagination metadata for the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageMeta {
    pub page: i64,
    pub size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    /// Builds the metadata block; `total_pages` is `ceil(total / size)`.
    pub fn new(page: i64, size: i64, total: i64) -> Self {
        let total_pages = if size > 0 { (total + size - 1) / size } else { 0 };
        Self {
            page,
            size,
            total,
            total_pages,
        }
    }
}

/// ArticlePage
///
/// One page of the public feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticlePage {
    pub items: Vec<Article>,
    pub pagination: PageMeta,
}

// --- Response Envelope ---

/// ApiResponse
///
/// Uniform envelope for successful responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            errors: Vec::new(),
        }
    }
}

/// ErrorResponse
///
/// Uniform envelope for failed responses. `data` is always `null` and `errors`
/// lists every violated rule, not only the first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[ts(type = "null")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    pub errors: Vec<String>,
}
