//! Local re-filtering of normalized hits.
//!
//! Applies [`FilterCriteria`] on the client, regardless of any filtering the
//! search service may or may not have done. The result is always an
//! order-preserving subsequence of the input.

use chrono::NaiveDate;

use crate::models::{active, FilterCriteria, SearchHit};

/// Keeps the hits that pass every active criterion, in input order.
pub fn filter_hits(hits: Vec<SearchHit>, criteria: &FilterCriteria) -> Vec<SearchHit> {
    if criteria.is_unconstrained() {
        return hits;
    }
    hits.into_iter().filter(|h| matches(h, criteria)).collect()
}

/// Whether one hit passes every active criterion.
pub fn matches(hit: &SearchHit, criteria: &FilterCriteria) -> bool {
    if !field_matches(&hit.person, &criteria.person) {
        return false;
    }
    if !field_matches(&hit.doc_type, &criteria.doc_type) {
        return false;
    }
    if criteria.has_date_bounds() {
        let Some(date) = hit.doc_date.as_deref().and_then(parse_doc_date) else {
            return false;
        };
        if criteria.date_from.is_some_and(|from| date < from) {
            return false;
        }
        if criteria.date_to.is_some_and(|to| date > to) {
            return false;
        }
    }
    true
}

/// Strict date parse: the first 10 characters must be exactly `YYYY-MM-DD`
/// (zero-padded, no sign or whitespace) and name a real calendar day.
pub fn parse_doc_date(raw: &str) -> Option<NaiveDate> {
    let head: String = raw.chars().take(10).collect();
    let bytes = head.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shaped = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }

    let year = head[0..4].parse().ok()?;
    let month = head[5..7].parse().ok()?;
    let day = head[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn field_matches(value: &Option<String>, wanted: &Option<String>) -> bool {
    match active(wanted) {
        None => true,
        Some(wanted) => value
            .as_deref()
            .is_some_and(|v| v.to_lowercase() == wanted.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: i64, person: Option<&str>, doc_type: Option<&str>, date: Option<&str>) -> SearchHit {
        SearchHit {
            doc_id: Some(id.into()),
            person: person.map(str::to_string),
            doc_type: doc_type.map(str::to_string),
            doc_date: date.map(str::to_string),
            ..Default::default()
        }
    }

    fn ids(hits: &[SearchHit]) -> Vec<i64> {
        hits.iter()
            .filter_map(|h| h.doc_id.as_ref().and_then(|v| v.as_i64()))
            .collect()
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn sample() -> Vec<SearchHit> {
        vec![
            hit(1, Some("Alice"), Some("invoice"), Some("2025-01-15")),
            hit(2, Some("Bob"), Some("Policy"), Some("2024-12-31T10:00:00Z")),
            hit(3, None, None, None),
            hit(4, Some("alice"), Some("INVOICE"), Some("not a date")),
            hit(5, Some("ALICE"), Some("memo"), Some("2025-03-01")),
        ]
    }

    #[test]
    fn test_unconstrained_returns_input_unchanged() {
        let hits = sample();
        assert_eq!(filter_hits(hits.clone(), &FilterCriteria::default()), hits);
    }

    #[test]
    fn test_person_is_case_insensitive() {
        for wanted in ["alice", "ALICE", "Alice"] {
            let c = FilterCriteria {
                person: Some(wanted.into()),
                ..Default::default()
            };
            assert_eq!(ids(&filter_hits(sample(), &c)), vec![1, 4, 5]);
        }
    }

    #[test]
    fn test_doc_type_excludes_absent_values() {
        let c = FilterCriteria {
            doc_type: Some("invoice".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_hits(sample(), &c)), vec![1, 4]);
    }

    #[test]
    fn test_absent_and_unparsable_dates_fail_active_range() {
        let c = FilterCriteria {
            date_from: day(2000, 1, 1),
            ..Default::default()
        };
        assert_eq!(ids(&filter_hits(sample(), &c)), vec![1, 2, 5]);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let c = FilterCriteria {
            date_from: day(2024, 12, 31),
            date_to: day(2025, 1, 15),
            ..Default::default()
        };
        assert_eq!(ids(&filter_hits(sample(), &c)), vec![1, 2]);
    }

    #[test]
    fn test_only_upper_bound() {
        let c = FilterCriteria {
            date_to: day(2025, 1, 1),
            ..Default::default()
        };
        assert_eq!(ids(&filter_hits(sample(), &c)), vec![2]);
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let c = FilterCriteria {
            date_from: day(2025, 6, 1),
            date_to: day(2025, 1, 1),
            ..Default::default()
        };
        assert!(filter_hits(sample(), &c).is_empty());
    }

    #[test]
    fn test_criteria_combine() {
        let c = FilterCriteria {
            person: Some("alice".into()),
            doc_type: Some("invoice".into()),
            date_from: day(2025, 1, 1),
            date_to: None,
        };
        assert_eq!(ids(&filter_hits(sample(), &c)), vec![1]);
    }

    #[test]
    fn test_result_is_ordered_subsequence() {
        let c = FilterCriteria {
            person: Some("alice".into()),
            ..Default::default()
        };
        let input = ids(&sample());
        let output = ids(&filter_hits(sample(), &c));
        let mut it = input.iter();
        assert!(output.iter().all(|id| it.any(|x| x == id)));
    }

    #[test]
    fn test_parse_doc_date() {
        assert_eq!(parse_doc_date("2025-01-15"), day(2025, 1, 15));
        assert_eq!(parse_doc_date("2025-01-15 08:30:00.000"), day(2025, 1, 15));
        assert_eq!(parse_doc_date("2025-02-30"), None);
        assert_eq!(parse_doc_date("15/01/2025"), None);
        assert_eq!(parse_doc_date(""), None);
        assert_eq!(parse_doc_date("2025年01月15日"), None);
    }

    #[test]
    fn test_parse_doc_date_requires_padded_iso_shape() {
        for raw in ["2025-1-5", "2025-01-5", " 2025-01-1", "2025-1-15", "+2025-01-15", "2025-01", "2025/01/15"] {
            assert_eq!(parse_doc_date(raw), None, "{:?}", raw);
        }
        assert_eq!(parse_doc_date("0001-01-01"), day(1, 1, 1));
    }

    #[test]
    fn test_unpadded_date_fails_active_range() {
        let c = FilterCriteria {
            date_from: day(2025, 1, 1),
            ..Default::default()
        };
        assert!(!matches(&hit(9, None, None, Some("2025-1-5")), &c));
        assert!(matches(&hit(9, None, None, Some("2025-01-05")), &c));
    }
}
