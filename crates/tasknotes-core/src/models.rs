//! Unified result model shared by every provider and transport.
//!
//! Provider payloads (notes, tasks) are projected into [`UnifiedSearchResult`]
//! per aggregation call. Nothing here is persisted except as the serialized
//! cache payload ([`UnifiedSearchResponse`]).

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag summary attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Category summary attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Source type of a unified result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Note,
    Task,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Note => "note",
            ResultKind::Task => "task",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note or task normalized into one record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSearchResult {
    /// Provider identity; numeric ids are rendered in base 10.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub title: String,
    /// Body text (a task's description).
    pub content: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Present only when the provider supplied a non-empty category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Zero time (Unix epoch) when the provider timestamp was missing or invalid.
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Task completion flag (tasks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Task priority (tasks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Task due date as sent by the provider (tasks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl UnifiedSearchResult {
    /// Minimal result with no tags, category, or task fields.
    pub fn new(
        kind: ResultKind,
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            category: None,
            updated_at,
            created_at: None,
            completed: None,
            priority: None,
            due_date: None,
        }
    }
}

/// Result envelope returned by the aggregation engine and stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSearchResponse {
    /// Re-paginated, relevance-ordered page.
    pub results: Vec<UnifiedSearchResult>,
    /// Sum of provider-reported totals; an upper bound for pagination UI,
    /// not the length of `results`.
    pub total: i64,
    pub notes: i64,
    pub tasks: i64,
}

impl UnifiedSearchResponse {
    /// Results of one kind, in page order.
    pub fn of_kind(&self, kind: ResultKind) -> impl Iterator<Item = &UnifiedSearchResult> {
        self.results.iter().filter(move |r| r.kind == kind)
    }
}

/// The zero time used for missing or unparseable timestamps.
pub fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Parse a provider timestamp, defaulting to [`zero_time`].
///
/// Accepts RFC 3339 and the offset-less ISO form (`2024-05-01T10:00:00.123`),
/// which is read as UTC.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    parse_optional_timestamp(raw).unwrap_or_else(zero_time)
}

/// Parse a provider timestamp, returning `None` when empty or invalid.
pub fn parse_optional_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2024-05-01T10:00:00Z");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_with_offset_normalizes_to_utc() {
        let ts = parse_timestamp("2024-05-01T12:00:00+02:00");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_offsetless_iso() {
        let ts = parse_timestamp("2024-05-01T10:00:00.250000");
        assert_eq!(ts.timestamp(), 1_714_557_600);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_timestamp_defaults_to_zero() {
        assert_eq!(parse_timestamp(""), zero_time());
        assert_eq!(parse_timestamp("yesterday"), zero_time());
        assert_eq!(parse_optional_timestamp("  "), None);
    }

    #[test]
    fn test_result_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ResultKind::Note).unwrap(), "\"note\"");
        assert_eq!(serde_json::to_string(&ResultKind::Task).unwrap(), "\"task\"");
        assert_eq!(ResultKind::Task.to_string(), "task");
    }

    #[test]
    fn test_absent_category_is_omitted() {
        let result = UnifiedSearchResult::new(ResultKind::Note, "n1", "Title", "Body", zero_time());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("category").is_none());
        assert!(json.get("completed").is_none());
        assert_eq!(json["type"], "note");
        assert_eq!(json["updated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["tags"], serde_json::json!([]));
    }

    #[test]
    fn test_response_round_trip() {
        let mut task = UnifiedSearchResult::new(
            ResultKind::Task,
            "42",
            "Buy milk",
            "grocery run",
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        );
        task.tags.push(Tag {
            id: "t1".into(),
            name: "home".into(),
            color: "#fff".into(),
        });
        task.category = Some(Category {
            id: "c1".into(),
            name: "Errands".into(),
            color: String::new(),
        });
        task.completed = Some(false);
        task.priority = Some("high".into());

        let response = UnifiedSearchResponse {
            results: vec![task],
            total: 7,
            notes: 0,
            tasks: 7,
        };
        let payload = serde_json::to_string(&response).unwrap();
        let decoded: UnifiedSearchResponse = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_of_kind_filters_in_order() {
        let response = UnifiedSearchResponse {
            results: vec![
                UnifiedSearchResult::new(ResultKind::Task, "1", "a", "", zero_time()),
                UnifiedSearchResult::new(ResultKind::Note, "n1", "b", "", zero_time()),
                UnifiedSearchResult::new(ResultKind::Note, "n2", "c", "", zero_time()),
            ],
            ..Default::default()
        };
        let ids: Vec<_> = response
            .of_kind(ResultKind::Note)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["n1", "n2"]);
    }
}
