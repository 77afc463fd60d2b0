//! Search hit normalization.
//!
//! Converts whatever the search service returned into a uniform
//! `Vec<SearchHit>`. The payload shape is not guaranteed: the call may
//! return JSON text or a decoded value, `results` may be missing, each
//! element may or may not be wrapped in `row`, and scores may live under
//! `@scores`, `scores`, or nowhere. Every lookup is optional, so
//! [`normalize`] is total over arbitrary input.
//!
//! Output order is the service's relevance ranking and is never changed.

use serde_json::{Map, Value};

use crate::models::SearchHit;

/// Normalizes a raw search-service payload into hits, in service order.
pub fn normalize(raw: &Value) -> Vec<SearchHit> {
    let decoded;
    let payload = match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(v) => {
                decoded = v;
                &decoded
            }
            Err(e) => {
                tracing::warn!(error = %e, "search payload is not valid JSON; no hits");
                return Vec::new();
            }
        },
        other => other,
    };

    let results = match payload.get("results").and_then(Value::as_array) {
        Some(results) => results,
        None => {
            tracing::debug!("search payload has no results sequence");
            return Vec::new();
        }
    };

    results.iter().map(hit_from_element).collect()
}

fn hit_from_element(element: &Value) -> SearchHit {
    let row = non_empty_object(element.get("row")).or_else(|| element.as_object());
    let scores = non_empty_object(element.get("@scores"))
        .or_else(|| non_empty_object(element.get("scores")));

    SearchHit {
        doc_id: field(row, "DOC_ID").filter(|v| !v.is_null()).cloned(),
        filename: text(row, "FILENAME"),
        relative_path: text(row, "RELATIVE_PATH"),
        person: text(row, "PERSON"),
        doc_type: text(row, "DOC_TYPE"),
        doc_date: text(row, "DOC_DATE"),
        score_semantic: number(scores, "cosine_similarity"),
        score_text: number(scores, "text_match"),
    }
}

fn non_empty_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object).filter(|m| !m.is_empty())
}

/// Key lookup: exact match first, then case-insensitive.
fn field<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Value> {
    let obj = obj?;
    obj.get(key).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn text(obj: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    match field(obj, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(obj: Option<&Map<String, Value>>, key: &str) -> Option<f64> {
    match field(obj, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
