//! Postgres-backed repository tests. Run with a reachable database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use newsroom::{
    models::{ArticleChanges, ArticleStatus, FeedFilter, NewArticle, NewUser, Role, User},
    repository::{PostgresRepository, Repository, RepositoryError},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Every test works on its own users and categories so runs can share one database.
fn unique(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

async fn create_test_user(repo: &PostgresRepository, name: &str, role: Role) -> User {
    repo.create_user(NewUser {
        name: name.to_string(),
        email: format!("{}@test.com", unique("user")),
        password_hash: "hash".to_string(),
        role,
    })
    .await
    .expect("Failed to create test user")
}

fn new_article(title: &str, category: &str, status: ArticleStatus) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        content: "Body".to_string(),
        category: category.to_string(),
        status,
    }
}

// --- Tests ---

#[test]
#[ignore = "requires Postgres (DATABASE_URL)"]
async fn test_duplicate_email_is_unique_violation() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let email = format!("{}@test.com", unique("dup"));

    let user = |name: &str| NewUser {
        name: name.to_string(),
        email: email.clone(),
        password_hash: "hash".to_string(),
        role: Role::Reader,
    };

    repo.create_user(user("First")).await.unwrap();
    let err = repo.create_user(user("Second")).await.unwrap_err();

    assert!(matches!(err, RepositoryError::UniqueViolation(_)));
}

#[test]
#[ignore = "requires Postgres (DATABASE_URL)"]
async fn test_create_and_get_article() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, "Test Author", Role::Author).await;

    let created = repo
        .create_article(author.id, new_article("Hello", "Tech", ArticleStatus::Draft))
        .await
        .unwrap();
    assert_eq!(created.author_id, author.id);
    assert_eq!(created.author_name, "Test Author");
    assert_eq!(created.status, ArticleStatus::Draft);

    let fetched = repo
        .find_article_by_id(created.id, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, created);
}

#[test]
#[ignore = "requires Postgres (DATABASE_URL)"]
async fn test_partial_update_and_soft_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, "Test Author", Role::Author).await;
    let created = repo
        .create_article(author.id, new_article("Before", "Tech", ArticleStatus::Draft))
        .await
        .unwrap();

    let updated = repo
        .update_article(
            created.id,
            ArticleChanges {
                status: Some(ArticleStatus::Published),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Before");
    assert_eq!(updated.status, ArticleStatus::Published);
    assert!(updated.updated_at >= created.updated_at);

    assert!(repo.soft_delete_article(created.id).await.unwrap());
    assert!(!repo.soft_delete_article(created.id).await.unwrap());

    assert!(repo.find_article_by_id(created.id, false).await.unwrap().is_none());
    let retained = repo
        .find_article_by_id(created.id, true)
        .await
        .unwrap()
        .unwrap();
    assert!(retained.deleted_at.is_some());

    let changes = ArticleChanges {
        title: Some("After".to_string()),
        ..ArticleChanges::default()
    };
    assert!(repo.update_article(created.id, changes).await.unwrap().is_none());
    assert!(repo.find_articles_by_author(author.id).await.unwrap().is_empty());
}

#[test]
#[ignore = "requires Postgres (DATABASE_URL)"]
async fn test_feed_filters_and_paging() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let category = unique("cat");
    let john = create_test_user(&repo, &unique("John"), Role::Author).await;
    let joanna = create_test_user(&repo, &unique("Joanna"), Role::Author).await;

    for i in 0..3 {
        repo.create_article(
            john.id,
            new_article(&format!("Rust {i}"), &category, ArticleStatus::Published),
        )
        .await
        .unwrap();
    }
    repo.create_article(
        joanna.id,
        new_article("Go 100%", &category, ArticleStatus::Published),
    )
    .await
    .unwrap();
    repo.create_article(
        joanna.id,
        new_article("Rust Draft", &category, ArticleStatus::Draft),
    )
    .await
    .unwrap();

    let in_category = FeedFilter {
        category: Some(category.clone()),
        ..FeedFilter::default()
    };
    assert_eq!(repo.count_published(&in_category).await.unwrap(), 4);

    let page = repo.search_published(&in_category, 3, 3).await.unwrap();
    assert_eq!(page.len(), 1);

    let rust_by_john = FeedFilter {
        author: Some(john.name.to_uppercase()),
        q: Some("rust".to_string()),
        ..in_category.clone()
    };
    assert_eq!(repo.count_published(&rust_by_john).await.unwrap(), 3);

    // `%` in the search term is literal, not a wildcard.
    let literal_percent = FeedFilter {
        q: Some("100%".to_string()),
        ..in_category.clone()
    };
    let found = repo.search_published(&literal_percent, 10, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Go 100%");

    let wildcard_only = FeedFilter {
        q: Some("%".to_string()),
        ..in_category
    };
    assert_eq!(repo.count_published(&wildcard_only).await.unwrap(), 1);
}
