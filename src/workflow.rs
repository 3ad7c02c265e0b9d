//! Review state machine for community submissions.
//!
//! A `PendingArticle` starts in `pending` and moves exactly once, to `approved` or
//! `rejected`. Both targets are terminal. Approval additionally yields a new
//! published `Article` built from the submission's content fields; the submission
//! itself is never turned into the article.

use chrono::{DateTime, Utc};

use crate::models::{Article, ArticleInput, PendingArticle, PendingStatus};

/// Reviewer identity recorded for the shared admin session.
pub const ADMIN_REVIEWER: &str = "admin";

/// ReviewDecision
///
/// The two transitions available out of `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    /// The status a submission ends up in after this decision.
    pub fn target(self) -> PendingStatus {
        match self {
            ReviewDecision::Approve => PendingStatus::Approved,
            ReviewDecision::Reject => PendingStatus::Rejected,
        }
    }
}

/// Review
///
/// Metadata stamped onto a submission when it leaves `pending`.
#[derive(Debug, Clone)]
pub struct Review {
    pub reviewer: String,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

impl Review {
    pub fn new(reviewer: impl Into<String>, notes: Option<String>) -> Self {
        Self {
            reviewer: reviewer.into(),
            // Blank notes are the same as no notes.
            notes: notes.filter(|n| !n.trim().is_empty()),
            at: Utc::now(),
        }
    }
}

/// AlreadyReviewed
///
/// Raised when a transition is attempted on a submission that is no longer pending.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pending article {id} has already been reviewed ({status})")]
pub struct AlreadyReviewed {
    pub id: String,
    pub status: PendingStatus,
}

impl PendingArticle {
    /// submission
    ///
    /// Builds a fresh `pending` submission. The caller supplies the id so that the
    /// repository can guarantee uniqueness against what is already stored.
    pub fn submission(
        id: String,
        input: ArticleInput,
        author_name: String,
        author_email: String,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        PendingArticle {
            id,
            title: input.title,
            category: input.category,
            subcategory: input.subcategory.unwrap_or_default(),
            content: input.content,
            tags: input.tags,
            author_name,
            author_email,
            submitted_at,
            status: PendingStatus::Pending,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        }
    }

    pub fn is_reviewed(&self) -> bool {
        self.status != PendingStatus::Pending
    }

    /// apply_review
    ///
    /// Performs the single allowed transition. On error the submission is untouched.
    pub fn apply_review(
        &mut self,
        decision: ReviewDecision,
        review: Review,
    ) -> Result<(), AlreadyReviewed> {
        if self.is_reviewed() {
            return Err(AlreadyReviewed {
                id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = decision.target();
        self.reviewed_at = Some(review.at);
        self.reviewed_by = Some(review.reviewer);
        self.review_notes = review.notes;
        Ok(())
    }

    /// to_article
    ///
    /// Constructs the published record for an approved submission under `article_id`.
    pub fn to_article(&self, article_id: String, now: DateTime<Utc>) -> Article {
        Article {
            id: article_id,
            title: self.title.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
