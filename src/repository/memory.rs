use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError, Scope};
use crate::models::{
    Article, ArticleChanges, ArticleStatus, FeedFilter, NewArticle, NewUser, User,
};

/// Stored article without the joined author name.
#[derive(Debug, Clone)]
struct ArticleRow {
    // Insertion order; breaks ties between equal timestamps.
    seq: u64,
    id: Uuid,
    title: String,
    content: String,
    category: String,
    status: ArticleStatus,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    articles: Vec<ArticleRow>,
    next_seq: u64,
}

/// InMemoryRepository
///
/// A `Repository` held in process memory. It enforces the same rules as the
/// Postgres schema: unique emails, a foreign key from article to author, and the
/// soft-delete scope on every read.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Tables {
    fn to_article(&self, row: &ArticleRow) -> Article {
        let author_name = self
            .users
            .get(&row.author_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        Article {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            category: row.category.clone(),
            status: row.status,
            author_id: row.author_id,
            author_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }

    fn visible(row: &ArticleRow, scope: Scope) -> bool {
        scope == Scope::IncludeDeleted || row.deleted_at.is_none()
    }

    fn matches_feed(&self, row: &ArticleRow, filter: &FeedFilter) -> bool {
        if row.deleted_at.is_some() || row.status != ArticleStatus::Published {
            return false;
        }
        if let Some(category) = &filter.category {
            if &row.category != category {
                return false;
            }
        }
        if let Some(author) = &filter.author {
            let name = self
                .users
                .get(&row.author_id)
                .map(|u| u.name.to_lowercase())
                .unwrap_or_default();
            if !name.contains(&author.to_lowercase()) {
                return false;
            }
        }
        if let Some(q) = &filter.q {
            if !row.title.to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Newest first, latest insert first on equal timestamps.
    fn newest_first<'a>(rows: impl Iterator<Item = &'a ArticleRow>) -> Vec<&'a ArticleRow> {
        let mut rows: Vec<&ArticleRow> = rows.collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        rows
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation("users_email_key".to_string()));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_article(&self, author_id: Uuid, article: NewArticle) -> RepoResult<Article> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&author_id) {
            return Err(RepositoryError::Database(sqlx::Error::RowNotFound));
        }
        let now = Utc::now();
        let seq = tables.next_seq;
        tables.next_seq += 1;
        let row = ArticleRow {
            seq,
            id: Uuid::new_v4(),
            title: article.title,
            content: article.content,
            category: article.category,
            status: article.status,
            author_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = tables.to_article(&row);
        tables.articles.push(row);
        Ok(created)
    }

    async fn find_article_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> RepoResult<Option<Article>> {
        let tables = self.lock();
        let scope = Scope::from(include_deleted);
        Ok(tables
            .articles
            .iter()
            .find(|row| row.id == id && Tables::visible(row, scope))
            .map(|row| tables.to_article(row)))
    }

    async fn find_articles_by_author(&self, author_id: Uuid) -> RepoResult<Vec<Article>> {
        let tables = self.lock();
        let rows = tables
            .articles
            .iter()
            .filter(|row| row.author_id == author_id && Tables::visible(row, Scope::Active));
        Ok(Tables::newest_first(rows)
            .into_iter()
            .map(|row| tables.to_article(row))
            .collect())
    }

    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> RepoResult<Option<Article>> {
        let mut tables = self.lock();
        let Some(row) = tables
            .articles
            .iter_mut()
            .find(|row| row.id == id && row.deleted_at.is_none())
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(content) = changes.content {
            row.content = content;
        }
        if let Some(category) = changes.category {
            row.category = category;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        row.updated_at = Utc::now();

        let row = row.clone();
        Ok(Some(tables.to_article(&row)))
    }

    async fn soft_delete_article(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.lock();
        match tables
            .articles
            .iter_mut()
            .find(|row| row.id == id && row.deleted_at.is_none())
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_published(&self, filter: &FeedFilter) -> RepoResult<i64> {
        let tables = self.lock();
        let total = tables
            .articles
            .iter()
            .filter(|row| tables.matches_feed(row, filter))
            .count();
        Ok(total as i64)
    }

    async fn search_published(
        &self,
        filter: &FeedFilter,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Article>> {
        let tables = self.lock();
        let rows = tables
            .articles
            .iter()
            .filter(|row| tables.matches_feed(row, filter));
        Ok(Tables::newest_first(rows)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|row| tables.to_article(row))
            .collect())
    }
}
