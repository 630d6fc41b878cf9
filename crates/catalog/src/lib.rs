//! `lostfound-catalog` — items, claims and users, plus the search filter builder.
//!
//! Pure domain types: validation and read-time shapes, no IO.

pub mod claim;
pub mod filter;
pub mod item;
pub mod user;
pub mod view;

pub use claim::{Claim, NewClaim};
pub use filter::{EchoedFilters, ItemFilter, ItemOrder, SearchCriteria, end_of_day, parse_date, start_of_day};
pub use item::{Item, ItemPatch, NewItem, parse_picked_at};
pub use user::{User, UserSummary, normalize_email};
pub use view::{ClaimOrder, ClaimView, Include, ItemView, SubmittedClaim};
