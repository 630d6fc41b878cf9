use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use lostfound_catalog::{ItemPatch, SearchCriteria, parse_date};
use lostfound_core::{DomainError, DomainResult, ItemId};

// -------------------------
// Body extraction
// -------------------------

/// Unwrap a JSON body, turning extractor rejections (wrong content type,
/// syntax, field types) into `InvalidInput`.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> DomainResult<T> {
    body.map(|Json(value)| value).map_err(rejected)
}

pub fn rejected(rejection: JsonRejection) -> DomainError {
    DomainError::invalid_input(rejection.body_text())
}

// -------------------------
// Request DTOs
// -------------------------

/// Body of `/register` and `/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub place: Option<String>,
    pub picked_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub place: Option<String>,
}

impl UpdateItemRequest {
    pub fn into_patch(self) -> DomainResult<ItemPatch> {
        ItemPatch::validate(self.name.as_deref(), self.place.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitClaimRequest {
    /// Accepted as a JSON number or a numeric string.
    pub item_id: Option<Value>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub message: Option<String>,
}

impl SubmitClaimRequest {
    /// Decode a claim body that already parsed as JSON.
    pub fn from_value(value: Value) -> DomainResult<Self> {
        serde_json::from_value(value).map_err(|e| DomainError::invalid_input(e.to_string()))
    }

    pub fn item_id_text(&self) -> Option<String> {
        item_id_text(self.item_id.as_ref()?)
    }
}

/// The `item_id` of a claim body as text, read before the rest of the body
/// is decoded.
pub fn claim_item_id(body: &Value) -> Option<String> {
    item_id_text(body.get("item_id")?)
}

fn item_id_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => Some(String::new()),
    }
}

/// Query string of `GET /items`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub place: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SearchQuery {
    pub fn into_criteria(self) -> DomainResult<SearchCriteria> {
        Ok(SearchCriteria {
            from: parse_date("from", self.from.as_deref())?,
            to: parse_date("to", self.to.as_deref())?,
            keyword: self.keyword,
            place: self.place,
        })
    }
}

/// Parse an `:id` path segment.
pub fn parse_item_id(raw: &str) -> DomainResult<ItemId> {
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claim_item_id_accepts_numbers_and_strings() {
        let body: SubmitClaimRequest = serde_json::from_value(json!({ "item_id": 5 })).unwrap();
        assert_eq!(body.item_id_text().as_deref(), Some("5"));

        let body: SubmitClaimRequest = serde_json::from_value(json!({ "item_id": "7" })).unwrap();
        assert_eq!(body.item_id_text().as_deref(), Some("7"));

        let body: SubmitClaimRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.item_id_text(), None);

        let body: SubmitClaimRequest = serde_json::from_value(json!({ "item_id": [1] })).unwrap();
        assert!(ItemId::parse_opt(body.item_id_text().as_deref()).is_err());
    }

    #[test]
    fn claim_item_id_survives_a_malformed_body() {
        let raw = json!({ "item_id": 1, "name": "n", "contact": 12345 });
        assert_eq!(claim_item_id(&raw).as_deref(), Some("1"));
        assert!(matches!(SubmitClaimRequest::from_value(raw), Err(DomainError::InvalidInput(_))));

        assert_eq!(claim_item_id(&json!([1, 2])), None);
    }

    #[test]
    fn search_query_parses_dates() {
        let query = SearchQuery {
            from: Some("2024-01-31".to_string()),
            to: Some(String::new()),
            ..Default::default()
        };
        let criteria = query.into_criteria().unwrap();
        assert!(criteria.from.is_some());
        assert!(criteria.to.is_none());

        let bad = SearchQuery {
            to: Some("31/01/2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.into_criteria(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn path_ids_must_be_positive_integers() {
        assert!(parse_item_id("12").is_ok());
        assert!(parse_item_id("0").is_err());
        assert!(parse_item_id("abc").is_err());
    }
}
