//! Session tokens (the session provider behind `AuthContext`).
//!
//! Sessions are HS256-signed tokens carrying the user id, a random session id
//! (used for revocation on logout) and an explicit validity window.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use lostfound_core::UserId;

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Session identifier, unique per login.
    pub sid: Uuid,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("session has been revoked")]
    Revoked,

    #[error("malformed session token: {0}")]
    Malformed(String),

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

/// Deterministically validate session claims.
///
/// Signature verification happens before this, in `SessionTokens::validate`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}

/// A freshly minted session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issues and validates session tokens.
pub trait SessionTokens: Send + Sync {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedSession, TokenError>;

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError>;
}

/// HMAC-SHA256 session tokens with a fixed lifetime.
#[derive(Clone)]
pub struct Hs256SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256SessionTokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        // Expiry lives in our own claims and is checked by `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation
    }
}

impl SessionTokens for Hs256SessionTokens {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedSession, TokenError> {
        let claims = SessionClaims {
            sub: user_id,
            sid: Uuid::now_v7(),
            issued_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| TokenError::Signing("session lifetime is out of range".to_string()))?,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedSession { token, claims })
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// Session ids revoked by logout, remembered until the session would have
/// expired anyway.
#[derive(Debug, Default)]
pub struct SessionRevocations {
    revoked: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl SessionRevocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a session, pruning entries that have expired. Returns the
    /// number of sessions still held as revoked.
    pub fn revoke(&self, claims: &SessionClaims, now: DateTime<Utc>) -> usize {
        let mut revoked = self.revoked.write().unwrap_or_else(PoisonError::into_inner);
        revoked.retain(|_, expires_at| *expires_at > now);
        if claims.expires_at > now {
            revoked.insert(claims.sid, claims.expires_at);
        }
        revoked.len()
    }

    pub fn is_revoked(&self, sid: Uuid, now: DateTime<Utc>) -> bool {
        let revoked = self.revoked.read().unwrap_or_else(PoisonError::into_inner);
        revoked.get(&sid).is_some_and(|expires_at| *expires_at > now)
    }
}
