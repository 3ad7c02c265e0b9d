use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::{
    credentials::{ADMIN_COOKIE, ADMIN_SENTINEL, Credentials, USER_COOKIE},
    error::AppError,
    workflow::ADMIN_REVIEWER,
};

/// Session
///
/// Outcome of a guard check. Deliberately carries no reason on failure, so callers
/// cannot leak which check rejected the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Session<T> {
    Authenticated(T),
    Unauthenticated,
}

impl<T> Session<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Unauthenticated => None,
        }
    }
}

/// AuthUser
///
/// The resolved identity of a request carrying a valid user session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// AdminSession
///
/// Proof that the request carries the admin sentinel cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    /// Identity recorded as the reviewer on moderation actions.
    pub reviewer: String,
}

/// read_cookie
///
/// Finds `name` among all `Cookie` headers of the request and returns its raw value.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// SessionGuard
///
/// Two independent, stateless checks over the request headers:
///
/// 1. **User**: the `catchpedia_user` cookie must hold a token that verifies against
///    the credential service (signature and expiry).
/// 2. **Admin**: the `catchpedia_admin` cookie must equal the fixed sentinel. This is
///    not tamper-evident; anyone able to set that cookie value is admin.
///
/// Neither check consults storage, and there is no revocation list: a token stays
/// valid until it expires even after the user logs out.
pub struct SessionGuard<'a> {
    credentials: &'a Credentials,
}

impl<'a> SessionGuard<'a> {
    pub fn new(credentials: &'a Credentials) -> Self {
        Self { credentials }
    }

    pub fn authenticate_user(&self, headers: &HeaderMap) -> Session<AuthUser> {
        let claims = read_cookie(headers, USER_COOKIE)
            .filter(|token| !token.is_empty())
            .and_then(|token| self.credentials.verify_token(token));

        match claims {
            Some(claims) => Session::Authenticated(AuthUser {
                user_id: claims.sub,
                email: claims.email,
            }),
            None => Session::Unauthenticated,
        }
    }

    pub fn authenticate_admin(&self, headers: &HeaderMap) -> Session<AdminSession> {
        match read_cookie(headers, ADMIN_COOKIE) {
            Some(ADMIN_SENTINEL) => Session::Authenticated(AdminSession {
                reviewer: ADMIN_REVIEWER.to_string(),
            }),
            _ => Session::Unauthenticated,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. Rejects with a 401
/// `{"error": "Authentication required"}` whenever the user guard does not
/// authenticate the request.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Credentials: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credentials = Credentials::from_ref(state);
        SessionGuard::new(&credentials)
            .authenticate_user(&parts.headers)
            .into_option()
            .ok_or(AppError::Unauthenticated("Authentication required"))
    }
}

/// AdminSession Extractor Implementation
///
/// Rejects with a 401 `{"error": "Unauthorized"}`. There is no separate 403: a
/// request without the admin cookie is simply unauthenticated for admin routes.
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    Credentials: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credentials = Credentials::from_ref(state);
        SessionGuard::new(&credentials)
            .authenticate_admin(&parts.headers)
            .into_option()
            .ok_or(AppError::Unauthenticated("Unauthorized"))
    }
}
