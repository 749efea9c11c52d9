use crate::models::{Article, ArticleChanges, ArticleStatus, FeedFilter, NewArticle, NewUser, User};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;

pub use memory::InMemoryRepository;

/// RepositoryError
///
/// Persistence failures. Unique-constraint violations are split out so callers can
/// turn a lost insert race into the same conflict outcome as an explicit pre-check.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::UniqueViolation(
                    db_err.constraint().unwrap_or("unknown").to_string(),
                )
            }
            _ => RepositoryError::Database(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The contract for all persistence operations. Services depend on this trait only,
/// so the Postgres implementation and the in-memory one are interchangeable.
///
/// Every article read excludes soft-deleted rows unless the method takes an explicit
/// `include_deleted` flag and the caller sets it.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Fails with `UniqueViolation` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    // `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    // --- Articles ---
    async fn create_article(&self, author_id: Uuid, article: NewArticle) -> RepoResult<Article>;
    async fn find_article_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> RepoResult<Option<Article>>;
    // Newest first.
    async fn find_articles_by_author(&self, author_id: Uuid) -> RepoResult<Vec<Article>>;
    // Returns `None` if the article is missing or soft-deleted.
    async fn update_article(&self, id: Uuid, changes: ArticleChanges)
    -> RepoResult<Option<Article>>;
    // Returns `false` if the article is missing or already soft-deleted.
    async fn soft_delete_article(&self, id: Uuid) -> RepoResult<bool>;

    // --- Public feed ---
    async fn count_published(&self, filter: &FeedFilter) -> RepoResult<i64>;
    // Newest first.
    async fn search_published(
        &self,
        filter: &FeedFilter,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Article>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// --- SQL building blocks ---

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.content, a.category, a.status, a.author_id, \
     u.name AS author_name, a.created_at, a.updated_at, a.deleted_at";

const ARTICLE_SOURCE: &str = " FROM articles a JOIN users u ON u.id = a.author_id";

// The soft-delete predicate. Every article statement goes through `article_query`
// or appends this constant.
const NOT_DELETED: &str = "deleted_at IS NULL";

/// Which article rows a query may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Active,
    IncludeDeleted,
}

impl From<bool> for Scope {
    fn from(include_deleted: bool) -> Self {
        if include_deleted {
            Scope::IncludeDeleted
        } else {
            Scope::Active
        }
    }
}

/// Starts an article query (`SELECT <select> FROM articles a JOIN users u WHERE ...`)
/// with the soft-delete predicate applied according to `scope`.
/// Callers append further conditions with `AND`.
fn article_query(select: &str, scope: Scope) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder.push(select);
    builder.push(ARTICLE_SOURCE);
    builder.push(" WHERE TRUE");
    if scope == Scope::Active {
        builder.push(" AND a.");
        builder.push(NOT_DELETED);
    }
    builder
}

/// Appends the public-feed restrictions: published only, plus the optional filters.
fn push_feed_filters(builder: &mut QueryBuilder<'static, Postgres>, filter: &FeedFilter) {
    builder.push(" AND a.status = ");
    builder.push_bind(ArticleStatus::Published);

    if let Some(category) = &filter.category {
        builder.push(" AND a.category = ");
        builder.push_bind(category.clone());
    }
    if let Some(author) = &filter.author {
        builder.push(" AND u.name ILIKE ");
        builder.push_bind(contains_pattern(author));
    }
    if let Some(q) = &filter.q {
        builder.push(" AND a.title ILIKE ");
        builder.push_bind(contains_pattern(q));
    }
}

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let query = format!(
            "INSERT INTO users (id, name, email, password, role) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Inserts and re-selects through a CTE so the returned row carries `author_name`.
    async fn create_article(&self, author_id: Uuid, article: NewArticle) -> RepoResult<Article> {
        let query = format!(
            r#"
            WITH a AS (
                INSERT INTO articles (id, title, content, category, status, author_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {ARTICLE_COLUMNS} FROM a JOIN users u ON u.id = a.author_id
            "#
        );
        let created = sqlx::query_as::<_, Article>(&query)
            .bind(Uuid::new_v4())
            .bind(article.title)
            .bind(article.content)
            .bind(article.category)
            .bind(article.status)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_article_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> RepoResult<Option<Article>> {
        let mut builder = article_query(ARTICLE_COLUMNS, Scope::from(include_deleted));
        builder.push(" AND a.id = ");
        builder.push_bind(id);

        let article = builder
            .build_query_as::<Article>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn find_articles_by_author(&self, author_id: Uuid) -> RepoResult<Vec<Article>> {
        let mut builder = article_query(ARTICLE_COLUMNS, Scope::Active);
        builder.push(" AND a.author_id = ");
        builder.push_bind(author_id);
        builder.push(" ORDER BY a.created_at DESC, a.id");

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    /// Only the provided columns appear in the SET list. `author_id` is never among them.
    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> RepoResult<Option<Article>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("WITH a AS (UPDATE articles SET updated_at = NOW()");

        if let Some(title) = changes.title {
            builder.push(", title = ");
            builder.push_bind(title);
        }
        if let Some(content) = changes.content {
            builder.push(", content = ");
            builder.push_bind(content);
        }
        if let Some(category) = changes.category {
            builder.push(", category = ");
            builder.push_bind(category);
        }
        if let Some(status) = changes.status {
            builder.push(", status = ");
            builder.push_bind(status);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND ");
        builder.push(NOT_DELETED);
        builder.push(" RETURNING *) SELECT ");
        builder.push(ARTICLE_COLUMNS);
        builder.push(" FROM a JOIN users u ON u.id = a.author_id");

        let article = builder
            .build_query_as::<Article>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn soft_delete_article(&self, id: Uuid) -> RepoResult<bool> {
        let query = format!("UPDATE articles SET deleted_at = NOW() WHERE id = $1 AND {NOT_DELETED}");
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_published(&self, filter: &FeedFilter) -> RepoResult<i64> {
        let mut builder = article_query("COUNT(*)", Scope::Active);
        push_feed_filters(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn search_published(
        &self,
        filter: &FeedFilter,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Article>> {
        let mut builder = article_query(ARTICLE_COLUMNS, Scope::Active);
        push_feed_filters(&mut builder, filter);
        builder.push(" ORDER BY a.created_at DESC, a.id LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }
}
