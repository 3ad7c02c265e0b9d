use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        Article, ArticleInput, CategoryCount, NewUser, PendingArticle, PendingStatus,
        UpdateAccountRequest, User,
    },
    slug::{slugify, unique_slug},
    storage::{Catalog, StorageError, StorageState},
    workflow::{AlreadyReviewed, Review, ReviewDecision},
};

/// RepoError
///
/// Domain failures of repository operations. Handlers translate these into HTTP
/// responses through `AppError`.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Input failed field validation.
    #[error("{0}")]
    Invalid(&'static str),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("User with this email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    AlreadyReviewed(#[from] AlreadyReviewed),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Repository Trait
///
/// Defines the abstract contract for every domain operation over the three
/// collections: published articles, the pending-article review workflow, and users.
/// Handlers depend only on this trait, so tests can substitute their own
/// implementation.
///
/// Read operations return owned copies; the only way to change stored state is
/// through the mutating methods.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Published Articles ---
    async fn get_articles(&self) -> Vec<Article>;
    async fn get_article(&self, id: &str) -> Option<Article>;
    async fn get_articles_by_category(&self, category: &str) -> Vec<Article>;
    async fn get_articles_by_subcategory(&self, category: &str, subcategory: &str)
    -> Vec<Article>;
    async fn count_by_subcategory(&self, category: &str, subcategory: &str) -> usize;
    // One entry per distinct category, in order of first appearance.
    async fn categories_with_counts(&self) -> Vec<CategoryCount>;
    // Case-insensitive match on title, content, tags, category and subcategory.
    async fn search_articles(&self, query: &str) -> Vec<Article>;

    // Admin authoring. The id is a unique slug of the title.
    async fn add_article(&self, input: ArticleInput) -> Result<Article, RepoError>;
    // Replaces in place. `Ok(None)` when no article has that id.
    async fn edit_article(&self, id: &str, input: ArticleInput)
    -> Result<Option<Article>, RepoError>;
    async fn delete_article(&self, id: &str) -> Result<bool, RepoError>;

    // --- Pending-Article Workflow ---
    async fn submit_article(
        &self,
        input: ArticleInput,
        author_name: String,
        author_email: String,
    ) -> Result<PendingArticle, RepoError>;
    async fn get_pending(&self, id: &str) -> Option<PendingArticle>;
    async fn get_all_pending(&self) -> Vec<PendingArticle>;
    async fn get_pending_by_status(&self, status: PendingStatus) -> Vec<PendingArticle>;
    // Marks the submission approved and publishes a new article, atomically.
    async fn approve_pending(&self, id: &str, review: Review) -> Result<Article, RepoError>;
    async fn reject_pending(&self, id: &str, review: Review)
    -> Result<PendingArticle, RepoError>;

    // --- Users ---
    async fn get_users(&self) -> Vec<User>;
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;
    // Uniqueness check and insert happen under one write lock.
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError>;
    async fn update_user(
        &self,
        id: Uuid,
        update: UpdateAccountRequest,
    ) -> Result<Option<User>, RepoError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the repository across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Catalog Helpers ---

impl Catalog {
    fn article_index(&self, id: &str) -> Option<usize> {
        self.articles.iter().position(|a| a.id == id)
    }

    fn pending_index(&self, id: &str) -> Option<usize> {
        self.pending_articles.iter().position(|p| p.id == id)
    }

    fn user_index(&self, id: Uuid) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }

    /// `email` must already be normalized with [`normalize_email`].
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| Some(u.id) != except && u.email == email)
    }

    /// A slug of `title` that no article other than the one at `except` uses.
    fn unique_article_id(&self, title: &str, except: Option<usize>) -> String {
        unique_slug(&slugify(title), |candidate| {
            self.articles
                .iter()
                .enumerate()
                .any(|(i, a)| Some(i) != except && a.id == candidate)
        })
    }

    /// `slug-<millis>`, bumping the timestamp while the id is already in use.
    fn unique_pending_id(&self, title: &str, now: DateTime<Utc>) -> String {
        let slug = slugify(title);
        let mut millis = now.timestamp_millis();
        loop {
            let id = format!("{slug}-{millis}");
            if self.pending_index(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}

/// Stored form of an email address. Lookups and uniqueness checks compare against
/// this same form, so any spelling that was accepted at signup finds the account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn not_found(entity: &'static str, id: &str) -> RepoError {
    RepoError::NotFound {
        entity,
        id: id.to_string(),
    }
}

/// CatalogRepository
///
/// The concrete `Repository`, backed by any `StorageService`.
///
/// The whole catalog is held in memory behind a single `RwLock`, which serializes
/// writers. Every mutation runs against a draft copy; the draft is saved and only
/// then published, so a failed save leaves the visible state exactly as it was.
/// This is what makes approval (mark reviewed + publish article) all-or-nothing.
pub struct CatalogRepository {
    storage: StorageState,
    catalog: RwLock<Catalog>,
}

impl CatalogRepository {
    /// Opens the repository, loading the current catalog from `storage`.
    pub async fn open(storage: StorageState) -> Result<Self, StorageError> {
        let catalog = storage.load().await?;
        tracing::info!(
            users = catalog.users.len(),
            articles = catalog.articles.len(),
            pending = catalog.pending_articles.len(),
            "catalog loaded"
        );
        Ok(Self {
            storage,
            catalog: RwLock::new(catalog),
        })
    }

    /// mutate
    ///
    /// Applies `apply` to a draft of the catalog under the write lock, persists the
    /// draft, and publishes it. Any error from `apply` or from the save discards the draft.
    async fn mutate<T, F>(&self, op: &'static str, apply: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut Catalog) -> Result<T, RepoError> + Send,
        T: Send,
    {
        let mut current = self.catalog.write().await;
        let mut draft = current.clone();
        let out = apply(&mut draft)?;
        if let Err(e) = self.storage.save(&draft).await {
            tracing::error!("{op} failed to persist: {:?}", e);
            return Err(e.into());
        }
        *current = draft;
        Ok(out)
    }

    fn filter_articles(catalog: &Catalog, pred: impl Fn(&Article) -> bool) -> Vec<Article> {
        catalog.articles.iter().filter(|a| pred(a)).cloned().collect()
    }
}

#[async_trait]
impl Repository for CatalogRepository {
    async fn get_articles(&self) -> Vec<Article> {
        self.catalog.read().await.articles.clone()
    }

    async fn get_article(&self, id: &str) -> Option<Article> {
        let catalog = self.catalog.read().await;
        catalog.articles.iter().find(|a| a.id == id).cloned()
    }

    async fn get_articles_by_category(&self, category: &str) -> Vec<Article> {
        let catalog = self.catalog.read().await;
        Self::filter_articles(&catalog, |a| a.category == category)
    }

    async fn get_articles_by_subcategory(
        &self,
        category: &str,
        subcategory: &str,
    ) -> Vec<Article> {
        let catalog = self.catalog.read().await;
        Self::filter_articles(&catalog, |a| {
            a.category == category && a.subcategory == subcategory
        })
    }

    async fn count_by_subcategory(&self, category: &str, subcategory: &str) -> usize {
        let catalog = self.catalog.read().await;
        catalog
            .articles
            .iter()
            .filter(|a| a.category == category && a.subcategory == subcategory)
            .count()
    }

    async fn categories_with_counts(&self) -> Vec<CategoryCount> {
        let catalog = self.catalog.read().await;
        let mut counts: Vec<CategoryCount> = Vec::new();
        for article in &catalog.articles {
            match counts.iter_mut().find(|c| c.value == article.category) {
                Some(entry) => entry.count += 1,
                None => counts.push(CategoryCount {
                    value: article.category.clone(),
                    label: capitalize(&article.category),
                    count: 1,
                }),
            }
        }
        counts
    }

    async fn search_articles(&self, query: &str) -> Vec<Article> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return vec![];
        }
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        let catalog = self.catalog.read().await;
        Self::filter_articles(&catalog, |a| {
            hit(&a.title)
                || hit(&a.content)
                || a.tags.iter().any(|t| hit(t))
                || hit(&a.category)
                || hit(&a.subcategory)
        })
    }

    async fn add_article(&self, input: ArticleInput) -> Result<Article, RepoError> {
        input.validate().map_err(RepoError::Invalid)?;
        self.mutate("add_article", |catalog| {
            let now = Utc::now();
            let article = Article {
                id: catalog.unique_article_id(&input.title, None),
                title: input.title,
                category: input.category,
                subcategory: input.subcategory.unwrap_or_default(),
                content: input.content,
                tags: input.tags,
                created_at: now,
                updated_at: now,
            };
            catalog.articles.push(article.clone());
            Ok(article)
        })
        .await
    }

    async fn edit_article(
        &self,
        id: &str,
        input: ArticleInput,
    ) -> Result<Option<Article>, RepoError> {
        input.validate().map_err(RepoError::Invalid)?;
        let result = self
            .mutate("edit_article", |catalog| {
                let index = catalog
                    .article_index(id)
                    .ok_or_else(|| not_found("Article", id))?;
                let new_id = catalog.unique_article_id(&input.title, Some(index));
                let existing = &mut catalog.articles[index];
                *existing = Article {
                    id: new_id,
                    title: input.title,
                    category: input.category,
                    subcategory: input.subcategory.unwrap_or_default(),
                    content: input.content,
                    tags: input.tags,
                    created_at: existing.created_at,
                    updated_at: Utc::now(),
                };
                Ok(existing.clone())
            })
            .await;

        match result {
            Ok(article) => Ok(Some(article)),
            Err(RepoError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_article(&self, id: &str) -> Result<bool, RepoError> {
        let result = self
            .mutate("delete_article", |catalog| {
                let index = catalog
                    .article_index(id)
                    .ok_or_else(|| not_found("Article", id))?;
                catalog.articles.remove(index);
                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(RepoError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn submit_article(
        &self,
        input: ArticleInput,
        author_name: String,
        author_email: String,
    ) -> Result<PendingArticle, RepoError> {
        input.validate().map_err(RepoError::Invalid)?;
        self.mutate("submit_article", |catalog| {
            let now = Utc::now();
            let id = catalog.unique_pending_id(&input.title, now);
            let pending = PendingArticle::submission(id, input, author_name, author_email, now);
            catalog.pending_articles.push(pending.clone());
            Ok(pending)
        })
        .await
    }

    async fn get_pending(&self, id: &str) -> Option<PendingArticle> {
        let catalog = self.catalog.read().await;
        catalog.pending_articles.iter().find(|p| p.id == id).cloned()
    }

    async fn get_all_pending(&self) -> Vec<PendingArticle> {
        self.catalog.read().await.pending_articles.clone()
    }

    async fn get_pending_by_status(&self, status: PendingStatus) -> Vec<PendingArticle> {
        let catalog = self.catalog.read().await;
        catalog
            .pending_articles
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect()
    }

    async fn approve_pending(&self, id: &str, review: Review) -> Result<Article, RepoError> {
        self.mutate("approve_pending", |catalog| {
            let index = catalog
                .pending_index(id)
                .ok_or_else(|| not_found("Pending article", id))?;
            let now = review.at;
            catalog.pending_articles[index].apply_review(ReviewDecision::Approve, review)?;

            let submission = &catalog.pending_articles[index];
            let article_id = catalog.unique_article_id(&submission.title, None);
            let article = submission.to_article(article_id, now);
            catalog.articles.push(article.clone());
            Ok(article)
        })
        .await
    }

    async fn reject_pending(
        &self,
        id: &str,
        review: Review,
    ) -> Result<PendingArticle, RepoError> {
        self.mutate("reject_pending", |catalog| {
            let index = catalog
                .pending_index(id)
                .ok_or_else(|| not_found("Pending article", id))?;
            let submission = &mut catalog.pending_articles[index];
            submission.apply_review(ReviewDecision::Reject, review)?;
            Ok(submission.clone())
        })
        .await
    }

    async fn get_users(&self) -> Vec<User> {
        self.catalog.read().await.users.clone()
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        let catalog = self.catalog.read().await;
        catalog.users.iter().find(|u| u.id == id).cloned()
    }

    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        let catalog = self.catalog.read().await;
        catalog
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let email = normalize_email(&new_user.email);
        self.mutate("create_user", |catalog| {
            if catalog.email_taken(&email, None) {
                return Err(RepoError::DuplicateEmail);
            }
            let user = User {
                id: Uuid::new_v4(),
                email,
                display_name: new_user.display_name,
                password_hash: new_user.password_hash,
                created_at: Utc::now(),
            };
            catalog.users.push(user.clone());
            Ok(user)
        })
        .await
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: UpdateAccountRequest,
    ) -> Result<Option<User>, RepoError> {
        let id_str = id.to_string();
        let result = self
            .mutate("update_user", |catalog| {
                let index = catalog
                    .user_index(id)
                    .ok_or_else(|| not_found("User", &id_str))?;
                if let Some(email) = update.email.as_deref().map(normalize_email) {
                    if catalog.email_taken(&email, Some(id)) {
                        return Err(RepoError::DuplicateEmail);
                    }
                    catalog.users[index].email = email;
                }
                if let Some(display_name) = update.display_name {
                    catalog.users[index].display_name = Some(display_name);
                }
                Ok(catalog.users[index].clone())
            })
            .await;

        match result {
            Ok(user) => Ok(Some(user)),
            Err(RepoError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        let id_str = id.to_string();
        let result = self
            .mutate("delete_user", |catalog| {
                let index = catalog
                    .user_index(id)
                    .ok_or_else(|| not_found("User", &id_str))?;
                catalog.users.remove(index);
                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(RepoError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
