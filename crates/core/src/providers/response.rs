use serde_json::Value;

use crate::errors::CoreError;

/// Keys under which list endpoints have been seen to nest their items,
/// in lookup order.
const LIST_KEYS: [&str; 7] = ["data", "items", "results", "content", "transactions", "docs", "records"];

/// Keys that may hold pagination metadata next to the items.
const META_KEYS: [&str; 3] = ["meta", "pagination", "data"];

const MAX_NESTING: usize = 3;

/// Pull the item list out of a list response, whatever its shape.
///
/// Handles a bare array, `null` (no items), and objects wrapping the array
/// under one of the usual keys, nested up to three levels deep
/// (e.g. `{"data": {"items": [...], "total": 12}}`).
pub fn extract_items(body: Value) -> Result<Vec<Value>, CoreError> {
    find_items(body, 0).ok_or_else(|| {
        CoreError::Deserialization("unrecognized list response shape".into())
    })
}

fn find_items(body: Value, depth: usize) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Null => Some(Vec::new()),
        Value::Object(mut map) if depth < MAX_NESTING => LIST_KEYS
            .iter()
            .find_map(|key| map.remove(*key).and_then(|inner| find_items(inner, depth + 1))),
        _ => None,
    }
}

/// Whether another page follows `page` (1-based), if the body says so.
///
/// Recognizes `hasNextPage` / `hasMore` flags, a non-null `next` link, and
/// `page` + `totalPages` counters, either at the top level or under
/// `meta`, `pagination` or `data`. `None` when the body carries no paging
/// metadata at all (a bare array, for instance); the caller then decides
/// from the page size.
#[must_use]
pub fn has_next_page(body: &Value, page: u32) -> Option<bool> {
    let obj = body.as_object()?;

    page_hint(body, page).or_else(|| {
        META_KEYS
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(|meta| page_hint(meta, page))
    })
}

fn page_hint(value: &Value, page: u32) -> Option<bool> {
    let obj = value.as_object()?;

    for flag in ["hasNextPage", "hasMore", "has_more", "hasNext"] {
        if let Some(b) = obj.get(flag).and_then(Value::as_bool) {
            return Some(b);
        }
    }

    if let Some(next) = obj.get("next") {
        if !next.is_object() {
            return Some(!next.is_null() && next != &Value::Bool(false));
        }
    }

    let total = obj
        .get("totalPages")
        .or_else(|| obj.get("total_pages"))
        .or_else(|| obj.get("pages"))
        .and_then(Value::as_u64)?;
    let current = obj
        .get("page")
        .or_else(|| obj.get("currentPage"))
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(page));
    Some(current < total)
}
