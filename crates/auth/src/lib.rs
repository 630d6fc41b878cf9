//! `lostfound-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it decides
//! *who* is acting and *what* they may do, and hashes/verifies credentials.

pub mod context;
pub mod password;
pub mod policy;
pub mod session;

pub use context::AuthContext;
pub use password::{BcryptHasher, PasswordError, PasswordHasher};
pub use policy::{
    AuthzError, ClaimResource, ItemAction, RegisteredResource, authorize_item, can_delete_item,
    can_mutate_item, can_submit_claim, can_view_claim, can_view_item_detail,
};
pub use session::{
    Hs256SessionTokens, IssuedSession, SessionClaims, SessionRevocations, SessionTokens, TokenError, validate_claims,
};
