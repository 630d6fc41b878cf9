//! Account workflow: registration, login and logout.
//!
//! Password hashing is CPU-bound and runs on the blocking pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use lostfound_auth::{
    PasswordError, PasswordHasher, SessionClaims, SessionRevocations, SessionTokens, TokenError,
};
use lostfound_catalog::{UserSummary, normalize_email};
use lostfound_core::{DomainError, error::require_text};

use super::{Repositories, WorkflowError, WorkflowResult};
use crate::repository::{RepositoryError, UserRepository};

/// Credential and session collaborators, constructed once at startup.
#[derive(Clone)]
pub struct AccountServices {
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn SessionTokens>,
    pub revocations: Arc<SessionRevocations>,
}

impl AccountServices {
    pub fn new(hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn SessionTokens>) -> Self {
        Self {
            hasher,
            tokens,
            revocations: Arc::new(SessionRevocations::new()),
        }
    }

    /// Resolve a bearer token into session claims, rejecting revoked sessions.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let claims = self.tokens.validate(token, now)?;
        if self.revocations.is_revoked(claims.sid, now) {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    /// The session behind an optional bearer token.
    ///
    /// A valid token whose user is no longer stored (in-memory backend after
    /// a restart) is `Unauthenticated`, never a downstream storage fault.
    pub async fn session(
        &self,
        repos: &Repositories,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Option<SessionClaims>> {
        let Some(token) = token else {
            return Ok(None);
        };
        let claims = self.authenticate(token, now)?;
        if repos.users.find_by_id(claims.sub).await?.is_none() {
            warn!(user_id = %claims.sub, "session user no longer exists");
            return Err(DomainError::Unauthenticated.into());
        }
        Ok(Some(claims))
    }
}

/// A logged-in session handed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub user: UserSummary,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[instrument(skip_all, err)]
pub async fn register(
    repos: &Repositories,
    accounts: &AccountServices,
    email: Option<&str>,
    password: Option<&str>,
) -> WorkflowResult<SessionGrant> {
    let email = normalize_email(email)?;
    let password = require_password(password)?;

    if repos.users.find_first_by_email(&email).await?.is_some() {
        return Err(DomainError::conflict("email is already registered").into());
    }

    let hasher = accounts.hasher.clone();
    let hash = blocking(move || hasher.hash(&password)).await?;

    let user = repos.users.create(&email, &hash).await.map_err(|e| match e {
        RepositoryError::Duplicate(_) => WorkflowError::Domain(DomainError::conflict("email is already registered")),
        other => other.into(),
    })?;

    info!(user_id = %user.id, "user registered");
    grant(accounts, user.summary())
}

#[instrument(skip_all, err)]
pub async fn login(
    repos: &Repositories,
    accounts: &AccountServices,
    email: Option<&str>,
    password: Option<&str>,
) -> WorkflowResult<SessionGrant> {
    let email = require_text("email", email)?.to_lowercase();
    let password = require_password(password)?;

    let hasher = accounts.hasher.clone();
    let Some(user) = repos.users.find_first_by_email(&email).await? else {
        // Same bcrypt work as a wrong password, so timing does not reveal
        // which emails are registered.
        blocking(move || hasher.hash(&password).map(drop)).await?;
        warn!("login failed");
        return Err(DomainError::InvalidCredentials.into());
    };

    let stored = user.password_hash.clone();
    let verified = blocking(move || hasher.verify(&password, &stored)).await?;
    if !verified {
        warn!(user_id = %user.id, "login failed");
        return Err(DomainError::InvalidCredentials.into());
    }

    info!(user_id = %user.id, "user logged in");
    grant(accounts, user.summary())
}

/// Revoke the session. Idempotent.
pub fn logout(accounts: &AccountServices, session: &SessionClaims) {
    let revoked = accounts.revocations.revoke(session, Utc::now());
    info!(user_id = %session.sub, revoked_sessions = revoked, "user logged out");
}

fn require_password(password: Option<&str>) -> Result<String, DomainError> {
    match password {
        Some(p) if !p.trim().is_empty() => Ok(p.to_string()),
        _ => Err(DomainError::invalid_input("password is required")),
    }
}

fn grant(accounts: &AccountServices, user: UserSummary) -> WorkflowResult<SessionGrant> {
    let issued = accounts.tokens.issue(user.id, Utc::now())?;
    Ok(SessionGrant {
        user,
        token: issued.token,
        expires_at: issued.claims.expires_at,
    })
}

async fn blocking<T, F>(f: F) -> WorkflowResult<T>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WorkflowError::Credential(PasswordError::Hash(format!("hashing task failed: {e}"))))?
        .map_err(WorkflowError::from)
}
