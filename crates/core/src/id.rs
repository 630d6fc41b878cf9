//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are positive integers assigned by the store. Anything a caller
//! hands us (path segments, form fields) goes through `FromStr`/`TryFrom`,
//! which rejects missing, zero, negative and non-numeric values up front.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a registered user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a lost-and-found item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

/// Identifier of an ownership claim.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(i64);

macro_rules! impl_numeric_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a value that came from the store.
            ///
            /// Store-assigned values are always positive; use `TryFrom<i64>`
            /// for anything that originates outside the store.
            pub fn from_raw(value: i64) -> Self {
                Self(value)
            }

            pub fn get(&self) -> i64 {
                self.0
            }

            /// Parse an optional caller-supplied identifier.
            pub fn parse_opt(value: Option<&str>) -> Result<Self, DomainError> {
                match value {
                    Some(s) => s.parse(),
                    None => Err(DomainError::invalid_input(concat!($name, " is required"))),
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl TryFrom<i64> for $t {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                if value <= 0 {
                    return Err(DomainError::invalid_input(format!(
                        "{}: must be a positive integer (got {value})",
                        $name
                    )));
                }
                Ok(Self(value))
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_input(concat!($name, " is required")));
                }
                let raw = trimmed
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_input(format!("{}: {}", $name, e)))?;
                Self::try_from(raw)
            }
        }
    };
}

impl_numeric_id!(UserId, "user id");
impl_numeric_id!(ItemId, "item id");
impl_numeric_id!(ClaimId, "claim id");

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_positive_integers() {
        assert_eq!("42".parse::<ItemId>().unwrap().get(), 42);
        assert_eq!(" 7 ".parse::<ItemId>().unwrap().get(), 7);
    }

    #[test]
    fn rejects_missing_zero_and_non_numeric() {
        for bad in ["", "   ", "0", "-3", "abc", "1.5", "12abc"] {
            assert!(
                matches!(bad.parse::<ItemId>(), Err(DomainError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(ItemId::parse_opt(None), Err(DomainError::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn any_non_positive_value_is_invalid(raw in i64::MIN..=0i64) {
            prop_assert!(ItemId::try_from(raw).is_err());
            prop_assert!(raw.to_string().parse::<ClaimId>().is_err());
        }

        #[test]
        fn positive_values_round_trip_through_display(raw in 1i64..=i64::MAX) {
            let id = UserId::try_from(raw).unwrap();
            prop_assert_eq!(id.to_string().parse::<UserId>().unwrap(), id);
        }
    }
}
