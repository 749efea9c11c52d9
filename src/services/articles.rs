use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Article, ArticlePage, CreateArticleRequest, FeedFilter, PageMeta, UpdateArticleRequest},
    repository::RepositoryState,
    validation,
};

/// ArticleService
///
/// Role- and ownership-gated article management plus the public feed.
///
/// Check order for a single article: author role, payload, existence, ownership.
/// A missing article is reported as not-found before ownership is looked at, so
/// a caller can never learn whether an id belongs to someone else's deleted row.
#[derive(Clone)]
pub struct ArticleService {
    repo: RepositoryState,
}

impl ArticleService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    fn require_author(user: &AuthUser) -> Result<(), AppError> {
        if user.is_author() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only authors can manage articles".to_string(),
            ))
        }
    }

    async fn owned_article(
        &self,
        id: Uuid,
        user: &AuthUser,
        include_deleted: bool,
    ) -> Result<Article, AppError> {
        let article = self
            .repo
            .find_article_by_id(id, include_deleted)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))?;

        if article.author_id != user.id {
            return Err(AppError::Forbidden(
                "You do not have access to this article".to_string(),
            ));
        }
        Ok(article)
    }

    #[instrument(skip(self, author, req), fields(author_id = %author.id))]
    pub async fn create(
        &self,
        author: &AuthUser,
        req: &CreateArticleRequest,
    ) -> Result<Article, AppError> {
        Self::require_author(author)?;
        let new_article = validation::validate_new_article(req)?;

        let article = self.repo.create_article(author.id, new_article).await?;
        info!(article_id = %article.id, "article created");
        Ok(article)
    }

    #[instrument(skip(self, author), fields(author_id = %author.id))]
    pub async fn find_all_by_author(&self, author: &AuthUser) -> Result<Vec<Article>, AppError> {
        Self::require_author(author)?;
        Ok(self.repo.find_articles_by_author(author.id).await?)
    }

    /// `include_deleted` widens the lookup to soft-deleted rows; the HTTP layer
    /// always passes `false`.
    #[instrument(skip(self, author), fields(author_id = %author.id))]
    pub async fn find_one(
        &self,
        id: Uuid,
        author: &AuthUser,
        include_deleted: bool,
    ) -> Result<Article, AppError> {
        Self::require_author(author)?;
        self.owned_article(id, author, include_deleted).await
    }

    #[instrument(skip(self, author, req), fields(author_id = %author.id))]
    pub async fn update(
        &self,
        id: Uuid,
        author: &AuthUser,
        req: &UpdateArticleRequest,
    ) -> Result<Article, AppError> {
        Self::require_author(author)?;
        let changes = validation::validate_article_changes(req)?;
        self.owned_article(id, author, false).await?;

        // The row may have been soft-deleted since the ownership check.
        let article = self
            .repo
            .update_article(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))?;
        info!(article_id = %article.id, "article updated");
        Ok(article)
    }

    #[instrument(skip(self, author), fields(author_id = %author.id))]
    pub async fn remove(&self, id: Uuid, author: &AuthUser) -> Result<(), AppError> {
        Self::require_author(author)?;
        self.owned_article(id, author, false).await?;

        if !self.repo.soft_delete_article(id).await? {
            return Err(AppError::NotFound(format!("Article {id} not found")));
        }
        info!(article_id = %id, "article soft-deleted");
        Ok(())
    }

    /// Public feed. The count and the page are independent reads and run concurrently.
    #[instrument(skip(self))]
    pub async fn find_published(
        &self,
        filter: FeedFilter,
        page: i64,
        size: i64,
    ) -> Result<ArticlePage, AppError> {
        validation::validate_page(page, size)?;
        let offset = (page - 1).saturating_mul(size);

        let (total, items) = tokio::try_join!(
            self.repo.count_published(&filter),
            self.repo.search_published(&filter, size, offset),
        )?;

        Ok(ArticlePage {
            items,
            pagination: PageMeta::new(page, size, total),
        })
    }
}
