//! Response envelopes.
//!
//! Every success response is `{success, message?, data, ...}`. Listings
//! carry `data: {data: [...], pagination: {...}}`, though some endpoints
//! return a bare `data: [...]`; the latter is paginated locally.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use campus_core::pagination::{paginate_local, PageCursor, PagedCollection};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

/// Server-side pagination block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub total_items: u64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

fn envelope_data(body: &str) -> Result<Value, ApiError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(format!("envelope: {e}")))?;
    Ok(envelope.data)
}

fn items<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, "Failed to decode list items");
        ApiError::Decode(format!("items: {e}"))
    })
}

/// Decode a listing response into one page.
pub fn decode_list<T: DeserializeOwned + Clone>(
    body: &str,
    cursor: PageCursor,
) -> Result<PagedCollection<T>, ApiError> {
    match envelope_data(body)? {
        Value::Array(raw) => {
            let all: Vec<T> = items(Value::Array(raw))?;
            Ok(paginate_local(&all, cursor))
        }
        Value::Object(mut map) => {
            let raw = map.remove("data").unwrap_or(Value::Array(Vec::new()));
            let page_items: Vec<T> = items(raw)?;
            match map.remove("pagination") {
                Some(Value::Null) | None => Ok(paginate_local(&page_items, cursor)),
                Some(raw) => {
                    let pagination: Pagination = serde_json::from_value(raw)
                        .map_err(|e| ApiError::Decode(format!("pagination: {e}")))?;
                    Ok(PagedCollection::new(
                        page_items,
                        PageCursor::new(pagination.current_page, cursor.page_size),
                        pagination.total_items,
                    ))
                }
            }
        }
        other => Err(ApiError::Decode(format!(
            "expected a list payload, got {}",
            json_type(&other)
        ))),
    }
}

/// Decode a single-entity response.
pub fn decode_single<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let data = envelope_data(body)?;
    serde_json::from_value(data).map_err(|e| {
        tracing::error!(error = %e, "Failed to decode entity");
        ApiError::Decode(format!("entity: {e}"))
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use campus_core::models::Department;
    use serde_json::json;

    fn dept(id: &str) -> Value {
        json!({"_id": id, "name": format!("Dept {id}"), "code": id, "status": "ACTIVE"})
    }

    #[test]
    fn paged_payload_uses_server_totals() {
        let body = json!({
            "success": true,
            "message": "ok",
            "data": {
                "data": [dept("d6"), dept("d7")],
                "pagination": {"currentPage": 2, "totalPages": 3, "totalItems": 12, "hasNext": true, "hasPrev": true}
            },
            "statusCode": 200,
            "timestamp": "2024-05-01T10:00:00Z"
        })
        .to_string();

        let page: PagedCollection<Department> = decode_list(&body, PageCursor::new(2, 5)).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!((page.page, page.total_items, page.total_pages), (2, 12, 3));
    }

    #[test]
    fn bare_list_is_paginated_locally() {
        let body = json!({"success": true, "data": [dept("a"), dept("b"), dept("c")]}).to_string();
        let page: PagedCollection<Department> = decode_list(&body, PageCursor::new(2, 2)).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "c");
        assert_eq!(page.total_items, 3);
    }

    #[test]
    fn unknown_status_fails_typed() {
        let body = json!({"success": true, "data": [
            {"_id": "x", "name": "X", "code": "X", "status": "ARCHIVED"}
        ]})
        .to_string();
        assert_matches!(
            decode_list::<Department>(&body, PageCursor::default()),
            Err(ApiError::Decode(msg)) if msg.starts_with("items")
        );
    }

    #[test]
    fn single_entity() {
        let body = json!({"success": true, "data": dept("d1")}).to_string();
        let d: Department = decode_single(&body).unwrap();
        assert_eq!(d.id, "d1");
    }

    #[test]
    fn non_json_success_body_is_a_decode_error() {
        assert_matches!(
            decode_single::<Department>("OK"),
            Err(ApiError::Decode(_))
        );
    }
}
