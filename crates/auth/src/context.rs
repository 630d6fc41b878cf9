use lostfound_core::UserId;

use crate::AuthzError;

/// Authentication context for a request.
///
/// Resolved exactly once per request by the session layer and passed by value
/// into every policy/workflow call. `None` means the request is anonymous.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AuthContext {
    user_id: Option<UserId>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The acting user, or `Unauthenticated` for anonymous requests.
    pub fn require_user(&self) -> Result<UserId, AuthzError> {
        self.user_id.ok_or(AuthzError::Unauthenticated)
    }
}
