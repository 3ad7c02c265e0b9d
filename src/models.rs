use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Records (Persisted in the Catalog) ---

/// User
///
/// A registered community member. Stored with its password hash, so this type is never
/// returned to clients directly; handlers convert it into a `UserProfile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    // Stored lowercased; uniqueness is enforced case-insensitively by the repository.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    // Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Article
///
/// A published, publicly visible article. `id` is the slug derived from `title`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub category: String,
    // Empty string when the article has no subcategory.
    #[serde(default)]
    pub subcategory: String,
    // Rich HTML body.
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// PendingStatus
///
/// Review state of a community submission. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PendingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PendingStatus::Pending => "pending",
            PendingStatus::Approved => "approved",
            PendingStatus::Rejected => "rejected",
        })
    }
}

/// PendingArticle
///
/// A community submission awaiting (or having received) admin review. Its id is
/// `slug-<submission millis>`, so identical titles never collide here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PendingArticle {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_name: String,
    pub author_email: String,
    #[ts(type = "string")]
    pub submitted_at: DateTime<Utc>,
    pub status: PendingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

// --- Repository Inputs ---

/// ArticleInput
///
/// The editable content fields shared by admin authoring, admin editing and
/// community submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArticleInput {
    /// Checks the required fields. Whitespace-only values count as missing.
    pub fn validate(&self) -> Result<(), &'static str> {
        let missing = |s: &str| s.trim().is_empty();
        if missing(&self.title) || missing(&self.category) || missing(&self.content) {
            return Err("Missing required fields: title, category, content");
        }
        Ok(())
    }
}

/// NewUser
///
/// Everything the repository needs to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Input payload for `POST /api/auth/signup`. Missing fields deserialize as empty
/// strings so the handler can answer with a 400 instead of a framework rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// AdminLoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub password: String,
}

/// TagsInput
///
/// Submission tags arrive either as a JSON array or as a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(untagged)]
#[ts(export)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    /// Normalises either form into a list of trimmed, non-empty tags.
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsInput::List(tags) => tags,
            TagsInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// SubmitArticleRequest
///
/// Input payload for `POST /api/submit-article`. Author identity is never read from
/// the body; it comes from the session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubmitArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagsInput>,
}

impl From<SubmitArticleRequest> for ArticleInput {
    fn from(req: SubmitArticleRequest) -> Self {
        ArticleInput {
            title: req.title,
            category: req.category,
            subcategory: req.subcategory,
            content: req.content,
            tags: req.tags.map(TagsInput::into_tags).unwrap_or_default(),
        }
    }
}

/// ReviewRequest
///
/// Input payload for the approve and reject endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReviewRequest {
    #[serde(default)]
    pub article_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

/// UpdateAccountRequest
///
/// Partial update of the caller's own account. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAccountRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// --- Response Schemas (Output) ---

/// UserProfile
///
/// The client-facing view of a `User`: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// AuthResponse
///
/// Returned by signup and login alongside the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// MessageResponse
///
/// Generic acknowledgement body (`{success, message}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// SubmitArticleResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubmitArticleResponse {
    pub success: bool,
    pub message: String,
    pub article_id: String,
}

/// ApproveArticleResponse
///
/// Carries the newly published article created by the approval.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApproveArticleResponse {
    pub success: bool,
    pub message: String,
    pub article: Article,
}

/// CategoryCount
///
/// One entry of the category index: raw value, display label, number of articles.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CategoryCount {
    pub value: String,
    pub label: String,
    pub count: usize,
}

/// CountResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CountResponse {
    pub count: usize,
}

/// SessionUser
///
/// The identity carried by a valid user session token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
}

/// SessionStatus
///
/// Output of `GET /api/session`: which sessions the request currently carries.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    pub admin: bool,
}

/// ErrorBody
///
/// Shape of every error response (`{"error": "..."}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}
