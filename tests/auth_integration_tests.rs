use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
    response::IntoResponse,
};
use catchpedia::{
    AppConfig, AppState, CatalogRepository, Credentials, MemoryStorage, RepositoryState,
    auth::{AdminSession, AuthUser, Session, SessionGuard, read_cookie},
    credentials::{ADMIN_COOKIE, USER_COOKIE},
};
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn credentials() -> Credentials {
    Credentials::new(TEST_JWT_SECRET, Duration::hours(1), 1, false)
}

fn create_token(user_id: Uuid, ttl: Duration) -> String {
    Credentials::new(TEST_JWT_SECRET, ttl, 1, false)
        .issue_token(user_id, "test@example.com")
        .unwrap()
}

async fn create_app_state() -> AppState {
    let repo = CatalogRepository::open(Arc::new(MemoryStorage::new()))
        .await
        .unwrap();
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    AppState::new(Arc::new(repo) as RepositoryState, config)
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(cookie: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri("/".parse::<Uri>().unwrap());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- User Session ---

#[tokio::test]
async fn test_auth_success_with_valid_cookie() {
    let token = create_token(TEST_USER_ID, Duration::hours(1));
    let app_state = create_app_state().await;

    let mut parts = get_request_parts(Some(&format!("{USER_COOKIE}={token}")));
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    let user = auth_user.expect("valid cookie should authenticate");
    assert_eq!(user.user_id, TEST_USER_ID);
    assert_eq!(user.email, "test@example.com");
}

#[tokio::test]
async fn test_auth_finds_cookie_among_others() {
    let token = create_token(TEST_USER_ID, Duration::hours(1));
    let cookie = format!("theme=dark; {USER_COOKIE}={token}; {ADMIN_COOKIE}=1");

    let mut parts = get_request_parts(Some(&cookie));
    let auth_user = AuthUser::from_request_parts(&mut parts, &credentials()).await;

    assert_eq!(auth_user.unwrap().user_id, TEST_USER_ID);
}

#[tokio::test]
async fn test_auth_failure_with_missing_cookie() {
    let app_state = create_app_state().await;
    let mut parts = get_request_parts(None);

    let rejection = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    // Past the validator's default 60s leeway.
    let token = create_token(TEST_USER_ID, Duration::hours(-2));
    let mut parts = get_request_parts(Some(&format!("{USER_COOKIE}={token}")));

    let result = AuthUser::from_request_parts(&mut parts, &credentials()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let forged = Credentials::new("someone-elses-secret", Duration::hours(1), 1, false)
        .issue_token(TEST_USER_ID, "test@example.com")
        .unwrap();
    let mut parts = get_request_parts(Some(&format!("{USER_COOKIE}={forged}")));

    let result = AuthUser::from_request_parts(&mut parts, &credentials()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_auth_failure_with_garbage_and_cleared_cookie() {
    for cookie in [
        format!("{USER_COOKIE}=not.a.jwt"),
        format!("{USER_COOKIE}="),
        format!("other_{USER_COOKIE}={}", create_token(TEST_USER_ID, Duration::hours(1))),
    ] {
        let mut parts = get_request_parts(Some(&cookie));
        let result = AuthUser::from_request_parts(&mut parts, &credentials()).await;
        assert!(result.is_err(), "cookie {cookie:?} must not authenticate");
    }
}

// --- Admin Session ---

#[tokio::test]
async fn test_admin_sentinel_grants_admin() {
    let app_state = create_app_state().await;
    let mut parts = get_request_parts(Some(&format!("{ADMIN_COOKIE}=1")));

    let admin = AdminSession::from_request_parts(&mut parts, &app_state)
        .await
        .expect("sentinel cookie should grant admin");

    assert_eq!(admin.reviewer, "admin");
}

#[tokio::test]
async fn test_admin_requires_exact_sentinel() {
    for cookie in [
        None,
        Some(format!("{ADMIN_COOKIE}=0")),
        Some(format!("{ADMIN_COOKIE}=true")),
        Some(format!("{ADMIN_COOKIE}=")),
        Some(format!("{ADMIN_COOKIE}=11")),
    ] {
        let mut parts = get_request_parts(cookie.as_deref());
        let rejection = AdminSession::from_request_parts(&mut parts, &credentials())
            .await
            .unwrap_err();
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::UNAUTHORIZED,
            "cookie {cookie:?} must not grant admin"
        );
    }
}

#[tokio::test]
async fn test_user_session_does_not_imply_admin() {
    let token = create_token(TEST_USER_ID, Duration::hours(1));
    let mut parts = get_request_parts(Some(&format!("{USER_COOKIE}={token}")));

    let result = AdminSession::from_request_parts(&mut parts, &credentials()).await;

    assert!(result.is_err());
}

// --- Guard ---

#[test]
fn test_guard_checks_are_independent() {
    let creds = credentials();
    let guard = SessionGuard::new(&creds);
    let token = create_token(TEST_USER_ID, Duration::hours(1));
    let parts = get_request_parts(Some(&format!("{ADMIN_COOKIE}=1; {USER_COOKIE}={token}")));

    assert!(matches!(
        guard.authenticate_user(&parts.headers),
        Session::Authenticated(AuthUser { user_id, .. }) if user_id == TEST_USER_ID
    ));
    assert!(matches!(
        guard.authenticate_admin(&parts.headers),
        Session::Authenticated(_)
    ));

    let anonymous = get_request_parts(None);
    assert_eq!(guard.authenticate_user(&anonymous.headers), Session::Unauthenticated);
    assert_eq!(guard.authenticate_admin(&anonymous.headers), Session::Unauthenticated);
}

#[test]
fn test_read_cookie_across_multiple_headers() {
    let mut parts = get_request_parts(Some("a=1; b=2"));
    parts
        .headers
        .append(header::COOKIE, header::HeaderValue::from_static("c=3"));

    assert_eq!(read_cookie(&parts.headers, "b"), Some("2"));
    assert_eq!(read_cookie(&parts.headers, "c"), Some("3"));
    assert_eq!(read_cookie(&parts.headers, "d"), None);
}
