//! Credential service: password hashing, session tokens, and cookie encoding.
//!
//! Password hashes are Argon2id PHC strings with a random salt from [`OsRng`].
//! Session tokens are HS256 JWTs carrying `{sub, email, iat, exp}`. Nothing here
//! performs I/O.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::config::AppConfig;

/// Name of the cookie holding the signed user session token.
pub const USER_COOKIE: &str = "catchpedia_user";
/// Name of the cookie holding the admin sentinel.
pub const ADMIN_COOKIE: &str = "catchpedia_admin";
/// The exact value the admin cookie must carry.
pub const ADMIN_SENTINEL: &str = "1";
/// Admin cookie lifetime in seconds (24h).
pub const ADMIN_COOKIE_MAX_AGE: i64 = 24 * 60 * 60;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Claims
///
/// The payload of a user session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    pub email: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration (UTC Unix timestamp).
    pub exp: i64,
}

/// CredentialError
///
/// Failures while producing credentials. Verification never errors; it fails closed.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Credentials
///
/// Issues and checks user credentials with the process-wide secret and cost settings.
#[derive(Clone)]
pub struct Credentials {
    jwt_secret: String,
    session_ttl: Duration,
    hash_cost: u32,
    secure_cookies: bool,
}

impl Credentials {
    pub fn new(
        jwt_secret: impl Into<String>,
        session_ttl: Duration,
        hash_cost: u32,
        secure_cookies: bool,
    ) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_ttl,
            hash_cost,
            secure_cookies,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            Duration::hours(config.session_ttl_hours),
            config.password_hash_cost,
            config.secure_cookies(),
        )
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    fn hasher(&self) -> Result<Argon2<'static>, CredentialError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            self.hash_cost.max(1),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(CredentialError::Params)?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash_password(&self, plain: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()?
            .hash_password(plain.as_bytes(), &salt)
            .map_err(CredentialError::Hash)?;
        Ok(hash.to_string())
    }

    /// verify_password
    ///
    /// Checks `plain` against a stored PHC hash. The cost parameters are read from
    /// the hash itself, so hashes made under an older cost still verify. A malformed
    /// hash counts as a mismatch.
    pub fn verify_password(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("stored password hash is malformed: {}", e);
                return false;
            }
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Sign a session token for `sub` that expires after the configured TTL.
    pub fn issue_token(&self, sub: Uuid, email: &str) -> Result<String, CredentialError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    /// verify_token
    ///
    /// Returns the claims of a well-formed, correctly signed, unexpired token and
    /// `None` for anything else.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        let key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("rejected session token: {:?}", e.kind());
                None
            }
        }
    }

    // --- Cookie Encoding ---

    fn cookie(&self, name: &str, value: &str, max_age: i64) -> String {
        let secure = if self.secure_cookies { "Secure; " } else { "" };
        format!("{name}={value}; Path=/; SameSite=Lax; {secure}Max-Age={max_age}; HttpOnly")
    }

    /// `Set-Cookie` value carrying a user session token.
    pub fn user_cookie(&self, token: &str) -> String {
        self.cookie(USER_COOKIE, token, self.session_ttl.num_seconds())
    }

    /// `Set-Cookie` value that clears the user session.
    pub fn clear_user_cookie(&self) -> String {
        self.cookie(USER_COOKIE, "", 0)
    }

    /// `Set-Cookie` value granting the admin session.
    pub fn admin_cookie(&self) -> String {
        self.cookie(ADMIN_COOKIE, ADMIN_SENTINEL, ADMIN_COOKIE_MAX_AGE)
    }

    /// `Set-Cookie` value that clears the admin session.
    pub fn clear_admin_cookie(&self) -> String {
        self.cookie(ADMIN_COOKIE, "", 0)
    }
}

// --- Input Policy ---

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// validate_password
///
/// Enforces the signup password policy, returning the message for the first rule
/// the password breaks.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("unit-test-secret", Duration::hours(1), 1, false)
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let creds = credentials();
        let hash = creds.hash_password("Passw0rd!").unwrap();

        assert!(hash.starts_with("$argon2id$"), "expected argon2id PHC prefix");
        assert!(creds.verify_password("Passw0rd!", &hash));
        assert!(!creds.verify_password("passw0rd!", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!credentials().verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let creds = credentials();
        let sub = Uuid::new_v4();
        let token = creds.issue_token(sub, "a@x.com").unwrap();

        let claims = creds.verify_token(&token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = Credentials::new("another-secret", Duration::hours(1), 1, false);
        let token = other.issue_token(Uuid::new_v4(), "a@x.com").unwrap();

        assert!(credentials().verify_token(&token).is_none());
        assert!(credentials().verify_token("garbage.token.value").is_none());
        assert!(credentials().verify_token("").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = Credentials::new("unit-test-secret", Duration::hours(-2), 1, false);
        let token = expired.issue_token(Uuid::new_v4(), "a@x.com").unwrap();

        assert!(credentials().verify_token(&token).is_none());
    }

    #[test]
    fn password_policy_reports_first_broken_rule() {
        assert_eq!(
            validate_password("Short1"),
            Err("Password must be at least 8 characters long")
        );
        assert_eq!(
            validate_password("ALLUPPER123"),
            Err("Password must contain at least one lowercase letter")
        );
        assert_eq!(
            validate_password("alllower123"),
            Err("Password must contain at least one uppercase letter")
        );
        assert_eq!(
            validate_password("NoDigitsHere"),
            Err("Password must contain at least one number")
        );
        assert_eq!(validate_password("Passw0rd!"), Ok(()));
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn cookies_follow_session_settings() {
        let creds = credentials();
        assert_eq!(
            creds.user_cookie("tok"),
            "catchpedia_user=tok; Path=/; SameSite=Lax; Max-Age=3600; HttpOnly"
        );
        assert_eq!(
            creds.clear_admin_cookie(),
            "catchpedia_admin=; Path=/; SameSite=Lax; Max-Age=0; HttpOnly"
        );

        let secure = Credentials::new("s", Duration::hours(1), 1, true);
        assert!(secure.admin_cookie().contains("Secure; Max-Age=86400"));
    }

    #[test]
    fn token_and_cookie_share_the_configured_lifetime() {
        let creds = Credentials::from_config(&AppConfig::default());
        let ttl = creds.session_ttl();
        assert_eq!(ttl, Duration::hours(168));

        let token = creds.issue_token(Uuid::new_v4(), "a@x.com").unwrap();
        let claims = creds.verify_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, ttl.num_seconds());
        assert!(
            creds
                .user_cookie(&token)
                .contains(&format!("Max-Age={}", ttl.num_seconds()))
        );
    }
}
