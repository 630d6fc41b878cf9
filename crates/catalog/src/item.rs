use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use lostfound_auth::RegisteredResource;
use lostfound_core::{DomainError, DomainResult, Entity, ItemId, UserId, error::require_text};

use crate::filter::start_of_day;

/// A reported lost-and-found object.
///
/// # Invariants
/// - `registrant_id` is set at creation and never changes.
/// - Only `name` and `place` are mutable (see [`ItemPatch`]).
/// - `owner_id` is reserved for accepted claims; nothing sets it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub place: String,
    pub picked_at: DateTime<Utc>,
    pub registrant_id: UserId,
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

impl RegisteredResource for Item {
    fn registrant_id(&self) -> UserId {
        self.registrant_id
    }
}

/// Validated input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub place: String,
    /// `None` means "now, at persistence time".
    pub picked_at: Option<DateTime<Utc>>,
    pub registrant_id: UserId,
}

impl NewItem {
    pub fn validate(
        registrant_id: UserId,
        name: Option<&str>,
        place: Option<&str>,
        picked_at: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        Ok(Self {
            name: require_text("name", name)?,
            place: require_text("place", place)?,
            picked_at,
            registrant_id,
        })
    }
}

/// Partial update of an item's mutable fields.
///
/// Absent fields stay unchanged; provided fields must not be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub place: Option<String>,
}

impl ItemPatch {
    pub fn validate(name: Option<&str>, place: Option<&str>) -> DomainResult<Self> {
        Ok(Self {
            name: name.map(|n| require_text("name", Some(n))).transpose()?,
            place: place.map(|p| require_text("place", Some(p))).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.place.is_none()
    }

    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(place) = &self.place {
            item.place = place.clone();
        }
    }
}

/// Parse a caller-supplied picked-up timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC) and `YYYY-MM-DD`
/// (midnight UTC). Blank input means "not supplied".
pub fn parse_picked_at(raw: Option<&str>) -> DomainResult<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(start_of_day(date)));
    }

    Err(DomainError::invalid_input(format!("picked_at: unrecognised timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(registrant: i64) -> Item {
        let now = Utc::now();
        Item {
            id: ItemId::from_raw(1),
            name: "black wallet".to_string(),
            place: "library".to_string(),
            picked_at: now,
            registrant_id: UserId::from_raw(registrant),
            owner_id: None,
            created_at: now,
        }
    }

    #[test]
    fn new_item_requires_name_and_place() {
        let user = UserId::from_raw(1);
        assert!(NewItem::validate(user, Some("umbrella"), Some("gate"), None).is_ok());
        assert!(matches!(
            NewItem::validate(user, None, Some("gate"), None),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            NewItem::validate(user, Some("umbrella"), Some("  "), None),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn new_item_trims_fields() {
        let new = NewItem::validate(UserId::from_raw(1), Some(" key "), Some(" lobby "), None).unwrap();
        assert_eq!(new.name, "key");
        assert_eq!(new.place, "lobby");
        assert_eq!(new.picked_at, None);
    }

    #[test]
    fn patch_changes_only_name_and_place() {
        let mut it = item(7);
        let before = it.clone();
        let patch = ItemPatch::validate(Some("red wallet"), None).unwrap();
        patch.apply(&mut it);

        assert_eq!(it.name, "red wallet");
        assert_eq!(it.place, before.place);
        assert_eq!(it.id, before.id);
        assert_eq!(it.registrant_id, before.registrant_id);
        assert_eq!(it.picked_at, before.picked_at);
    }

    #[test]
    fn patch_rejects_blank_values() {
        assert!(matches!(ItemPatch::validate(Some(""), None), Err(DomainError::InvalidInput(_))));
        assert!(ItemPatch::validate(None, None).unwrap().is_empty());
    }

    #[test]
    fn picked_at_formats() {
        let rfc = parse_picked_at(Some("2024-05-01T10:30:00+09:00")).unwrap().unwrap();
        assert_eq!(rfc.to_rfc3339(), "2024-05-01T01:30:00+00:00");

        let local = parse_picked_at(Some("2024-05-01T10:30")).unwrap().unwrap();
        assert_eq!(local.to_rfc3339(), "2024-05-01T10:30:00+00:00");

        let day = parse_picked_at(Some("2024-05-01")).unwrap().unwrap();
        assert_eq!(day.to_rfc3339(), "2024-05-01T00:00:00+00:00");

        assert_eq!(parse_picked_at(Some("  ")).unwrap(), None);
        assert!(matches!(parse_picked_at(Some("yesterday")), Err(DomainError::InvalidInput(_))));
    }
}
