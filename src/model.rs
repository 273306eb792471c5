//! Wire types exchanged with the analytics service.
//!
//! Field names are camelCase on the wire. Timestamps are kept as the opaque
//! strings the service sends; this crate never interprets them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form JSON object used for metadata and event payloads.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Client-generated identifier for a visitor that is not logged in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonymousId(String);

impl AnonymousId {
    /// Mints a new random (UUID v4) identifier.
    pub fn generate() -> Self {
        AnonymousId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AnonymousId {
    fn from(s: String) -> Self {
        AnonymousId(s)
    }
}

impl From<&str> for AnonymousId {
    fn from(s: &str) -> Self {
        AnonymousId(s.to_string())
    }
}

impl fmt::Display for AnonymousId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tracked visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub anonymous_id: AnonymousId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One user action within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Server-computed aggregate over all sessions and events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    pub data: ReportData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub total_sessions: u64,
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

/// Per-session totals inside a [`ReportRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub anonymous_id: AnonymousId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub total_events: u64,
    #[serde(default)]
    pub events_by_type: BTreeMap<String, u64>,
}

impl ReportRecord {
    /// Sum of events over every session in the report.
    pub fn total_events(&self) -> u64 {
        self.data.sessions.iter().map(|s| s.total_events).sum()
    }

    /// Per-type event counts merged across all sessions.
    pub fn events_by_type(&self) -> BTreeMap<String, u64> {
        let mut merged = BTreeMap::new();
        for summary in &self.data.sessions {
            for (kind, count) in &summary.events_by_type {
                *merged.entry(kind.clone()).or_insert(0) += count;
            }
        }
        merged
    }

    pub fn session(&self, id: &str) -> Option<&SessionSummary> {
        self.data.sessions.iter().find(|s| s.id == id)
    }
}

/// Body of `POST /api`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionRequest<'a> {
    pub anonymous_id: &'a AnonymousId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a JsonObject>,
}

/// Body of `POST /api/event`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogEventRequest<'a> {
    pub session_id: &'a str,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a JsonObject>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_ids_are_distinct_uuids() {
        let a = AnonymousId::generate();
        let b = AnonymousId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn session_uses_camel_case_and_optional_fields() {
        let s: Session = serde_json::from_value(json!({
            "id": "s1",
            "anonymousId": "anon-1",
            "createdAt": "t0"
        }))
        .unwrap();
        assert_eq!(s.anonymous_id.as_str(), "anon-1");
        assert_eq!(s.metadata, None);
        assert_eq!(s.created_at.as_deref(), Some("t0"));

        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v, json!({"id": "s1", "anonymousId": "anon-1", "createdAt": "t0"}));
    }

    #[test]
    fn event_type_field_is_named_type() {
        let e: Event = serde_json::from_value(json!({
            "id": "e1",
            "sessionId": "s1",
            "type": "click",
            "data": {"x": 10},
            "createdAt": "t1"
        }))
        .unwrap();
        assert_eq!(e.event_type, "click");
        assert_eq!(e.data.as_ref().and_then(|d| d.get("x")), Some(&json!(10)));
        assert!(e.metadata.is_none());
    }

    #[test]
    fn request_bodies_omit_absent_optionals() {
        let id = AnonymousId::from("anon-1");
        let body = serde_json::to_value(CreateSessionRequest { anonymous_id: &id, metadata: None }).unwrap();
        assert_eq!(body, json!({"anonymousId": "anon-1"}));

        let mut meta = JsonObject::new();
        meta.insert("plan".into(), json!("free"));
        let body = serde_json::to_value(LogEventRequest {
            session_id: "s1",
            event_type: "click",
            metadata: Some(&meta),
            data: None,
        })
        .unwrap();
        assert_eq!(body, json!({"sessionId": "s1", "type": "click", "metadata": {"plan": "free"}}));
    }

    #[test]
    fn report_aggregations() {
        let report: ReportRecord = serde_json::from_value(json!({
            "id": "r1",
            "data": {
                "totalSessions": 2,
                "sessions": [
                    {"id": "s1", "anonymousId": "a", "totalEvents": 3, "eventsByType": {"click": 2, "view": 1}},
                    {"id": "s2", "anonymousId": "b", "totalEvents": 1, "eventsByType": {"click": 1}}
                ]
            },
            "createdAt": "t2"
        }))
        .unwrap();

        assert_eq!(report.data.total_sessions, 2);
        assert_eq!(report.total_events(), 4);
        let by_type = report.events_by_type();
        assert_eq!(by_type.get("click"), Some(&3));
        assert_eq!(by_type.get("view"), Some(&1));
        assert_eq!(report.session("s2").map(|s| s.total_events), Some(1));
        assert!(report.session("missing").is_none());
    }
}
