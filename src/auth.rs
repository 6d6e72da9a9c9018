//! Account registration, sign-in and bearer token handling.
//!
//! The signing secret comes from [`AuthConfig`] when the service is built;
//! nothing here reads process-wide state.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::AuthConfig;
use crate::db::{self, Pool};
use crate::model::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("Email is already in use.")]
    EmailInUse,
    #[error("User not found")]
    UserNotFound,
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error("You are not authenticated!")]
    MissingToken,
    #[error("Token is not valid!")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub img: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the account it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    signup_ttl: Duration,
    login_ttl: Duration,
    bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("signup_ttl", &self.signup_ttl)
            .field("login_ttl", &self.login_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(cfg: &AuthConfig) -> Self {
        let secret = cfg.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            signup_ttl: minutes(cfg.signup_token_ttl_minutes),
            login_ttl: minutes(cfg.login_token_ttl_minutes),
            bcrypt_cost: cfg.bcrypt_cost,
        }
    }

    /// Runs bcrypt on the blocking thread pool.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(ok)
    }

    pub fn issue_token(&self, user_id: i64, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Validate signature and expiry and return the user id carried by the token.
    pub fn verify_token(&self, token: &str) -> Result<i64, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|err| {
            warn!(kind = ?err.kind(), "rejected bearer token");
            AuthError::InvalidToken
        })?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Create an account and return a short-lived session for it.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        pool: &Pool,
        request: SignupRequest,
    ) -> Result<AuthSession, AuthError> {
        let email = request.email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidInput("Email is required"));
        }
        if request.password.is_empty() {
            return Err(AuthError::InvalidInput("Password is required"));
        }

        if db::find_user_by_email(pool, email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let password_hash = self.hash_password(&request.password).await?;
        let user = db::create_user(
            pool,
            request.name.trim(),
            email,
            &password_hash,
            request.img.as_deref(),
        )
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::EmailInUse
            } else {
                AuthError::Storage(err)
            }
        })?;

        let token = self.issue_token(user.id, self.signup_ttl)?;
        info!(user_id = user.id, "user registered");
        Ok(AuthSession { token, user })
    }

    #[instrument(skip_all)]
    pub async fn login(&self, pool: &Pool, request: SigninRequest) -> Result<AuthSession, AuthError> {
        let creds = db::find_user_by_email(pool, request.email.trim())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .verify_password(&request.password, &creds.password_hash)
            .await?
        {
            warn!(user_id = creds.user.id, "incorrect password");
            return Err(AuthError::IncorrectPassword);
        }

        let token = self.issue_token(creds.user.id, self.login_ttl)?;
        info!(user_id = creds.user.id, "user logged in");
        Ok(AuthSession {
            token,
            user: creds.user,
        })
    }
}

// Ten years keeps chrono arithmetic on token expiry in range.
const MAX_TOKEN_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

fn minutes(value: u64) -> Duration {
    Duration::minutes(
        i64::try_from(value)
            .unwrap_or(MAX_TOKEN_TTL_MINUTES)
            .min(MAX_TOKEN_TTL_MINUTES),
    )
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
