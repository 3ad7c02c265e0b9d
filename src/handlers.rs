use crate::{
    AppState,
    auth::{AdminSession, AuthUser, SessionGuard},
    credentials::{self, Credentials},
    error::{AppError, AppResult},
    models::{
        self, AdminLoginRequest, ApproveArticleResponse, Article, ArticleInput, AuthResponse,
        CategoryCount, CountResponse, ErrorBody, LoginRequest, MessageResponse, NewUser,
        PendingArticle, PendingStatus, ReviewRequest, SessionStatus, SessionUser, SignupRequest,
        SubmitArticleRequest, SubmitArticleResponse, UpdateAccountRequest, UserProfile,
    },
    repository::RepoError,
    workflow::Review,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;

// --- Filter Structs ---

/// ArticleFilter
///
/// Query parameters for `GET /api/articles`. A subcategory is only applied together
/// with a category.
#[derive(Deserialize, utoipa::IntoParams, Default)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// SearchQuery
#[derive(Deserialize, utoipa::IntoParams, Default)]
pub struct SearchQuery {
    /// Free-text search term.
    pub q: Option<String>,
}

/// PendingFilter
#[derive(Deserialize, utoipa::IntoParams, Default)]
pub struct PendingFilter {
    /// One of `pending`, `approved`, `rejected`. All submissions when absent.
    pub status: Option<PendingStatus>,
}

// --- Helpers ---

/// Runs an argon2 operation off the async executor.
async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))
}

fn session_cookie(credentials: &Credentials, token: &str) -> [(header::HeaderName, String); 1] {
    [(header::SET_COOKIE, credentials.user_cookie(token))]
}

// --- Authentication Handlers ---

/// signup
///
/// [Public Route] Creates an account and starts a user session.
///
/// *Flow*: validate email and password policy, hash the password off-thread, insert
/// the user (the repository re-checks email uniqueness under its write lock), then
/// issue the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid email or password", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    let email = req.email.trim().to_string();

    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }
    if !credentials::is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    credentials::validate_password(&req.password).map_err(|m| AppError::Validation(m.into()))?;

    // Fast path; the authoritative check happens inside create_user.
    if state.repo.get_user_by_email(&email).await.is_some() {
        return Err(RepoError::DuplicateEmail.into());
    }

    let creds = state.credentials.clone();
    let password = req.password;
    let password_hash = blocking(move || creds.hash_password(&password)).await??;

    let display_name = req
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| email.split('@').next().map(str::to_string));

    let user = state
        .repo
        .create_user(NewUser {
            email,
            display_name,
            password_hash,
        })
        .await?;

    let token = state.credentials.issue_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        session_cookie(&state.credentials, &token),
        Json(AuthResponse {
            success: true,
            user: UserProfile::from(&user),
        }),
    ))
}

/// login
///
/// [Public Route] Verifies email + password and starts a user session. Unknown email
/// and wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Bad credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    let email = req.email.trim();

    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }
    if !credentials::is_valid_email(email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }

    let bad_credentials = AppError::Unauthenticated("Invalid email or password");
    let Some(user) = state.repo.get_user_by_email(email).await else {
        tracing::warn!("login failed: unknown email");
        return Err(bad_credentials);
    };

    let creds = state.credentials.clone();
    let password = req.password;
    let hash = user.password_hash.clone();
    if !blocking(move || creds.verify_password(&password, &hash)).await? {
        tracing::warn!(user_id = %user.id, "login failed: wrong password");
        return Err(bad_credentials);
    }

    let token = state.credentials.issue_token(user.id, &user.email)?;
    Ok((
        session_cookie(&state.credentials, &token),
        Json(AuthResponse {
            success: true,
            user: UserProfile::from(&user),
        }),
    ))
}

/// logout
///
/// [Public Route] Clears the user session cookie. The token itself is not revoked
/// and remains valid until it expires.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Cookie cleared", body = MessageResponse))
)]
pub async fn logout(State(credentials): State<Credentials>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, credentials.clear_user_cookie())],
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

/// admin_login
///
/// [Public Route] Compares the submitted password with the configured admin secret
/// and, on success, sets the admin sentinel cookie.
#[utoipa::path(
    post,
    path = "/api/admin-login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin session started", body = MessageResponse),
        (status = 400, description = "Missing password", body = ErrorBody),
        (status = 401, description = "Wrong password", body = ErrorBody)
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    if req.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }
    if req.password != state.config.admin_password {
        tracing::warn!("admin login failed");
        return Err(AppError::Unauthenticated("Invalid password"));
    }

    tracing::info!("admin session started");
    Ok((
        [(header::SET_COOKIE, state.credentials.admin_cookie())],
        Json(MessageResponse::ok("Admin session started")),
    ))
}

/// admin_logout
///
/// [Public Route] Clears the admin cookie.
#[utoipa::path(
    post,
    path = "/api/admin-logout",
    responses((status = 200, description = "Cookie cleared", body = MessageResponse))
)]
pub async fn admin_logout(State(credentials): State<Credentials>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, credentials.clear_admin_cookie())],
        Json(MessageResponse::ok("Admin session ended")),
    )
}

/// get_session
///
/// [Public Route] Idempotent probe reporting which sessions the request carries.
/// Never fails: an invalid cookie just reads as "not authenticated".
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn get_session(
    State(credentials): State<Credentials>,
    headers: HeaderMap,
) -> Json<SessionStatus> {
    let guard = SessionGuard::new(&credentials);
    let user = guard
        .authenticate_user(&headers)
        .into_option()
        .map(|u| SessionUser {
            user_id: u.user_id,
            email: u.email,
        });
    let admin = guard.authenticate_admin(&headers).into_option().is_some();

    Json(SessionStatus {
        authenticated: user.is_some(),
        user,
        admin,
    })
}

// --- Public Article Handlers ---

/// list_articles
///
/// [Public Route] Lists published articles, optionally filtered by category and
/// subcategory.
#[utoipa::path(
    get,
    path = "/api/articles",
    params(ArticleFilter),
    responses((status = 200, description = "Articles", body = [Article]))
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> Json<Vec<models::Article>> {
    let articles = match (filter.category, filter.subcategory) {
        (Some(category), Some(sub)) => {
            state.repo.get_articles_by_subcategory(&category, &sub).await
        }
        (Some(category), None) => state.repo.get_articles_by_category(&category).await,
        (None, _) => state.repo.get_articles().await,
    };
    Json(articles)
}

/// get_article
///
/// [Public Route] Retrieves one published article by slug.
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(("id" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<models::Article>> {
    match state.repo.get_article(&id).await {
        Some(article) => Ok(Json(article)),
        None => Err(RepoError::NotFound {
            entity: "Article",
            id,
        }
        .into()),
    }
}

/// search_articles
///
/// [Public Route] Case-insensitive search over title, content, tags, category and
/// subcategory. An empty query returns no results.
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses((status = 200, description = "Matches", body = [Article]))
)]
pub async fn search_articles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<models::Article>> {
    let q = query.q.unwrap_or_default();
    Json(state.repo.search_articles(&q).await)
}

/// get_categories
///
/// [Public Route] Category index with per-category article counts.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = [CategoryCount]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Json<Vec<CategoryCount>> {
    Json(state.repo.categories_with_counts().await)
}

/// count_subcategory
///
/// [Public Route] Number of published articles in one subcategory.
#[utoipa::path(
    get,
    path = "/api/categories/{category}/subcategories/{subcategory}/count",
    params(
        ("category" = String, Path, description = "Category"),
        ("subcategory" = String, Path, description = "Subcategory")
    ),
    responses((status = 200, description = "Count", body = CountResponse))
)]
pub async fn count_subcategory(
    State(state): State<AppState>,
    Path((category, subcategory)): Path<(String, String)>,
) -> Json<CountResponse> {
    let count = state.repo.count_by_subcategory(&category, &subcategory).await;
    Json(CountResponse { count })
}

// --- Authenticated Handlers ---

/// submit_article
///
/// [Authenticated Route] Queues a community submission for review.
///
/// *Identity*: author email comes from the session token and author name from the
/// stored display name (falling back to the email); nothing in the body can set them.
#[utoipa::path(
    post,
    path = "/api/submit-article",
    request_body = SubmitArticleRequest,
    responses(
        (status = 200, description = "Submitted", body = SubmitArticleResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
pub async fn submit_article(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<SubmitArticleRequest>, JsonRejection>,
) -> AppResult<Json<SubmitArticleResponse>> {
    let Json(req) = payload?;
    let input = ArticleInput::from(req);

    let author_name = state
        .repo
        .get_user(user.user_id)
        .await
        .and_then(|u| u.display_name)
        .unwrap_or_else(|| user.email.clone());

    let pending = state
        .repo
        .submit_article(input, author_name, user.email)
        .await?;
    tracing::info!(pending_id = %pending.id, user_id = %user.user_id, "article submitted");

    Ok(Json(SubmitArticleResponse {
        success: true,
        message: "Article submitted successfully! It will be reviewed by our team.".into(),
        article_id: pending.id,
    }))
}

/// get_account
///
/// [Authenticated Route] The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 404, description = "Account no longer exists", body = ErrorBody)
    )
)]
pub async fn get_account(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<UserProfile>> {
    match state.repo.get_user(user_id).await {
        Some(user) => Ok(Json(UserProfile::from(&user))),
        None => Err(RepoError::NotFound {
            entity: "User",
            id: user_id.to_string(),
        }
        .into()),
    }
}

/// update_account
///
/// [Authenticated Route] Partial update of display name and/or email. Because the
/// session token embeds the email, a fresh session cookie is issued.
#[utoipa::path(
    put,
    path = "/api/account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 400, description = "Invalid email", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn update_account(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(mut req) = payload?;

    if let Some(email) = req.email.as_deref() {
        if !credentials::is_valid_email(email.trim()) {
            return Err(AppError::Validation("Invalid email format".into()));
        }
    }
    req.display_name = req
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let Some(user) = state.repo.update_user(user_id, req).await? else {
        return Err(RepoError::NotFound {
            entity: "User",
            id: user_id.to_string(),
        }
        .into());
    };

    let token = state.credentials.issue_token(user.id, &user.email)?;
    Ok((
        session_cookie(&state.credentials, &token),
        Json(UserProfile::from(&user)),
    ))
}

// --- Admin Handlers ---

/// approve_article
///
/// [Admin Route] Approves a pending submission and publishes it as a new article.
///
/// *Atomicity*: the status change and the new article are committed in one
/// repository write; if persisting fails neither is visible.
#[utoipa::path(
    post,
    path = "/api/approve-article",
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Approved and published", body = ApproveArticleResponse),
        (status = 400, description = "Missing id or already reviewed", body = ErrorBody),
        (status = 401, description = "Not admin", body = ErrorBody),
        (status = 404, description = "No such pending article", body = ErrorBody)
    )
)]
pub async fn approve_article(
    admin: AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> AppResult<Json<ApproveArticleResponse>> {
    let Json(req) = payload?;
    if req.article_id.trim().is_empty() {
        return Err(AppError::Validation("Article ID is required".into()));
    }

    let review = Review::new(admin.reviewer, req.review_notes);
    let article = state.repo.approve_pending(&req.article_id, review).await?;
    tracing::info!(pending_id = %req.article_id, article_id = %article.id, "article approved");

    Ok(Json(ApproveArticleResponse {
        success: true,
        message: "Article approved and published successfully!".into(),
        article,
    }))
}

/// reject_article
///
/// [Admin Route] Rejects a pending submission. No article is created.
#[utoipa::path(
    post,
    path = "/api/reject-article",
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Rejected", body = MessageResponse),
        (status = 400, description = "Missing id or already reviewed", body = ErrorBody),
        (status = 401, description = "Not admin", body = ErrorBody),
        (status = 404, description = "No such pending article", body = ErrorBody)
    )
)]
pub async fn reject_article(
    admin: AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    if req.article_id.trim().is_empty() {
        return Err(AppError::Validation("Article ID is required".into()));
    }

    let review = Review::new(admin.reviewer, req.review_notes);
    state.repo.reject_pending(&req.article_id, review).await?;
    tracing::info!(pending_id = %req.article_id, "article rejected");

    Ok(Json(MessageResponse::ok("Article rejected successfully")))
}

/// list_pending
///
/// [Admin Route] The review queue, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/admin/pending",
    params(PendingFilter),
    responses((status = 200, description = "Submissions", body = [PendingArticle]))
)]
pub async fn list_pending(
    _admin: AdminSession,
    State(state): State<AppState>,
    Query(filter): Query<PendingFilter>,
) -> Json<Vec<PendingArticle>> {
    let pending = match filter.status {
        Some(status) => state.repo.get_pending_by_status(status).await,
        None => state.repo.get_all_pending().await,
    };
    Json(pending)
}

/// get_pending
///
/// [Admin Route] One submission by id, whatever its status.
#[utoipa::path(
    get,
    path = "/api/admin/pending/{id}",
    params(("id" = String, Path, description = "Pending article id")),
    responses(
        (status = 200, description = "Found", body = PendingArticle),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_pending(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PendingArticle>> {
    match state.repo.get_pending(&id).await {
        Some(pending) => Ok(Json(pending)),
        None => Err(RepoError::NotFound {
            entity: "Pending article",
            id,
        }
        .into()),
    }
}

/// create_article
///
/// [Admin Route] Publishes an article directly, bypassing review.
#[utoipa::path(
    post,
    path = "/api/admin/articles",
    request_body = ArticleInput,
    responses(
        (status = 201, description = "Created", body = Article),
        (status = 400, description = "Missing fields", body = ErrorBody)
    )
)]
pub async fn create_article(
    _admin: AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<ArticleInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let article = state.repo.add_article(input).await?;
    tracing::info!(article_id = %article.id, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// update_article
///
/// [Admin Route] Replaces an article's content in place. A new title moves the
/// article to a new slug.
#[utoipa::path(
    put,
    path = "/api/admin/articles/{id}",
    params(("id" = String, Path, description = "Article slug")),
    request_body = ArticleInput,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_article(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ArticleInput>, JsonRejection>,
) -> AppResult<Json<Article>> {
    let Json(input) = payload?;
    match state.repo.edit_article(&id, input).await? {
        Some(article) => Ok(Json(article)),
        None => Err(RepoError::NotFound {
            entity: "Article",
            id,
        }
        .into()),
    }
}

/// delete_article
///
/// [Admin Route] Removes a published article.
#[utoipa::path(
    delete,
    path = "/api/admin/articles/{id}",
    params(("id" = String, Path, description = "Article slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_article(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if state.repo.delete_article(&id).await? {
        tracing::info!(article_id = %id, "article deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RepoError::NotFound {
            entity: "Article",
            id,
        }
        .into())
    }
}

/// list_users
///
/// [Admin Route] All registered accounts, without password hashes.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Users", body = [UserProfile]))
)]
pub async fn list_users(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<Vec<UserProfile>> {
    let users = state.repo.get_users().await;
    Json(users.iter().map(UserProfile::from).collect())
}
