//! Core data types that flow through the search pipeline.
//!
//! A [`SearchHit`] is built once per search call from the raw service
//! payload and never mutated afterwards. [`FilterCriteria`] is passed
//! explicitly into each filter invocation; nothing here is session state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel used by pickers to mean "no constraint".
pub const ANY_SELECTION: &str = "(any)";

/// One normalized search result. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "DOC_ID")]
    pub doc_id: Option<Value>,
    #[serde(rename = "FILENAME")]
    pub filename: Option<String>,
    #[serde(rename = "RELATIVE_PATH")]
    pub relative_path: Option<String>,
    #[serde(rename = "PERSON")]
    pub person: Option<String>,
    #[serde(rename = "DOC_TYPE")]
    pub doc_type: Option<String>,
    /// ISO-date-like text as returned by the service; may not parse.
    #[serde(rename = "DOC_DATE")]
    pub doc_date: Option<String>,
    #[serde(rename = "score_sem")]
    pub score_semantic: Option<f64>,
    #[serde(rename = "score_text")]
    pub score_text: Option<f64>,
}

/// Client-held filter predicates. `None` means the criterion is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub person: Option<String>,
    pub doc_type: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Builds criteria from raw picker selections; blank values and the
    /// `(any)` sentinel become inactive.
    pub fn from_selections(
        person: Option<&str>,
        doc_type: Option<&str>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Self {
        Self {
            person: selection(person),
            doc_type: selection(doc_type),
            date_from,
            date_to,
        }
    }

    pub fn has_date_bounds(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// True when no criterion is active.
    pub fn is_unconstrained(&self) -> bool {
        active(&self.person).is_none() && active(&self.doc_type).is_none() && !self.has_date_bounds()
    }
}

/// An exact-match criterion is active only when it holds a non-empty value.
pub(crate) fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn selection(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ANY_SELECTION)
        .map(str::to_string)
}
