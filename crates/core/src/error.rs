//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, user-facing failures (validation,
/// authorization, missing targets). Storage faults belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field or identifier was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No authenticated actor is attached to the request.
    #[error("authentication required")]
    Unauthenticated,

    /// Email/password pair did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The actor is authenticated but lacks rights over the target.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced item/claim/user does not exist.
    #[error("not found")]
    NotFound,

    /// The request collides with existing state (e.g. email already registered).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Require a trimmed, non-blank value for a named field.
pub fn require_text(field: &str, value: Option<&str>) -> DomainResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::invalid_input(format!("{field} is required"))),
    }
}

/// Trim an optional value, collapsing blank strings to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
