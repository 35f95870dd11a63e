//! Validated parse layer over untyped snapshot documents.
//!
//! The remote collection source delivers documents as id + field map with no
//! schema guarantees. Everything here is a total function: a missing or
//! mistyped field degrades to that field's default and is logged at
//! `debug!`, never surfaced. The merge engine downstream only ever sees the
//! typed records.
//!
//! Defaulting rules, per field:
//!
//! | field            | default            |
//! |------------------|--------------------|
//! | `name`/`email`/`phone`/`userPhone` | `""`  |
//! | `status` (lead)  | `Novo`             |
//! | `status` (payment) | `""`             |
//! | `comments`       | `[]`               |
//! | `createdAt`      | pending assignment |
//! | `option`         | `message`          |
//! | `fileName`/`meetingDetails` | absent  |

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::lead::{CreatedAt, LeadId, Status};
use crate::model::payment::{MeetingDetails, Payment, PaymentOption};

// ---------------------------------------------------------------------------
// RawDoc
// ---------------------------------------------------------------------------

/// One untyped document as delivered inside a collection snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDoc {
    /// Document id, assigned by the remote store.
    pub id: String,
    /// Field map; any shape the store happens to hold.
    pub fields: Map<String, Value>,
}

impl RawDoc {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a doc from `(key, value)` pairs of JSON values. Test and feed
    /// convenience.
    #[must_use]
    pub fn from_pairs<I>(id: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self::new(id, fields)
    }
}

// ---------------------------------------------------------------------------
// Typed per-source records
// ---------------------------------------------------------------------------

/// A `users` document after parsing. Carries no triage authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: LeadId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: CreatedAt,
}

impl UserRecord {
    /// Parse a raw `users` document. Total; missing fields default.
    #[must_use]
    pub fn from_raw(doc: &RawDoc) -> Self {
        Self {
            id: LeadId::new(&doc.id),
            name: str_field(doc, "name"),
            email: str_field(doc, "email"),
            phone: str_field(doc, "phone"),
            created_at: created_at_field(doc),
        }
    }
}

/// A `leads` document after parsing. Authoritative for status and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadRecord {
    pub id: LeadId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: Status,
    pub comments: Vec<String>,
    pub created_at: CreatedAt,
}

impl LeadRecord {
    /// Parse a raw `leads` document. Total; missing fields default.
    #[must_use]
    pub fn from_raw(doc: &RawDoc) -> Self {
        Self {
            id: LeadId::new(&doc.id),
            name: str_field(doc, "name"),
            email: str_field(doc, "email"),
            phone: str_field(doc, "phone"),
            status: status_field(doc),
            comments: str_list_field(doc, "comments"),
            created_at: created_at_field(doc),
        }
    }
}

/// Parse a raw `payments` document. Total; missing fields default.
#[must_use]
pub fn payment_from_raw(doc: &RawDoc) -> Payment {
    let option = match doc.fields.get("option").and_then(Value::as_str) {
        Some(s) => s.parse().unwrap_or_else(|_| {
            debug!(doc = %doc.id, option = s, "unknown payment option, defaulting");
            PaymentOption::default()
        }),
        None => PaymentOption::default(),
    };

    let meeting_details = doc
        .fields
        .get("meetingDetails")
        .filter(|v| !v.is_null())
        .map(|v| MeetingDetails {
            date: nested_str(v, "date"),
            environment: nested_str(v, "environment"),
            expectation: nested_str(v, "expectation"),
        });

    Payment {
        id: doc.id.clone(),
        user_id: LeadId::new(str_field(doc, "userId")),
        option,
        status: str_field(doc, "status"),
        user_phone: str_field(doc, "userPhone"),
        file_name: doc
            .fields
            .get("fileName")
            .and_then(Value::as_str)
            .map(str::to_string),
        meeting_details,
        created_at: created_at_field(doc),
    }
}

// ---------------------------------------------------------------------------
// Field extractors
// ---------------------------------------------------------------------------

fn str_field(doc: &RawDoc, key: &str) -> String {
    match doc.fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) if !other.is_null() => {
            debug!(doc = %doc.id, key, "non-string field, defaulting to empty");
            String::new()
        }
        _ => String::new(),
    }
}

fn str_list_field(doc: &RawDoc, key: &str) -> Vec<String> {
    match doc.fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                _ => {
                    debug!(doc = %doc.id, key, "skipping non-string list element");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn status_field(doc: &RawDoc) -> Status {
    match doc.fields.get("status").and_then(Value::as_str) {
        Some(s) => s.parse().unwrap_or_else(|_| {
            debug!(doc = %doc.id, status = s, "unknown status label, defaulting");
            Status::default()
        }),
        None => Status::default(),
    }
}

fn created_at_field(doc: &RawDoc) -> CreatedAt {
    match doc.fields.get("createdAt").and_then(Value::as_str) {
        Some(s) => s.parse::<DateTime<Utc>>().map_or_else(
            |_| {
                debug!(doc = %doc.id, raw = s, "unparseable createdAt, treating as pending");
                CreatedAt::Pending
            },
            CreatedAt::At,
        ),
        None => CreatedAt::Pending,
    }
}

fn nested_str(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_record_missing_phone_defaults_empty() {
        let doc = RawDoc::from_pairs(
            "u1",
            [("name", json!("Ana")), ("email", json!("ana@example.com"))],
        );
        let rec = UserRecord::from_raw(&doc);
        assert_eq!(rec.phone, "");
        assert_eq!(rec.name, "Ana");
    }

    #[test]
    fn user_record_mistyped_field_defaults_empty() {
        let doc = RawDoc::from_pairs("u1", [("name", json!(42))]);
        assert_eq!(UserRecord::from_raw(&doc).name, "");
    }

    #[test]
    fn lead_record_takes_authoritative_status_and_comments() {
        let doc = RawDoc::from_pairs(
            "l1",
            [
                ("status", json!("Fechado")),
                ("comments", json!(["primeiro", "segundo"])),
            ],
        );
        let rec = LeadRecord::from_raw(&doc);
        assert_eq!(rec.status, Status::Closed);
        assert_eq!(rec.comments, vec!["primeiro", "segundo"]);
    }

    #[test]
    fn lead_record_unknown_status_defaults_new() {
        let doc = RawDoc::from_pairs("l1", [("status", json!("Aberto"))]);
        assert_eq!(LeadRecord::from_raw(&doc).status, Status::New);
    }

    #[test]
    fn lead_record_skips_non_string_comments() {
        let doc = RawDoc::from_pairs("l1", [("comments", json!(["ok", 7, null]))]);
        assert_eq!(LeadRecord::from_raw(&doc).comments, vec!["ok"]);
    }

    #[test]
    fn created_at_parses_rfc3339() {
        let doc = RawDoc::from_pairs("l1", [("createdAt", json!("2025-03-01T12:00:00Z"))]);
        assert!(matches!(
            LeadRecord::from_raw(&doc).created_at,
            CreatedAt::At(_)
        ));
    }

    #[test]
    fn created_at_missing_is_pending() {
        let doc = RawDoc::from_pairs("l1", []);
        assert_eq!(LeadRecord::from_raw(&doc).created_at, CreatedAt::Pending);
    }

    #[test]
    fn payment_defaults() {
        let doc = RawDoc::from_pairs("p1", [("userId", json!("u1"))]);
        let payment = payment_from_raw(&doc);
        assert_eq!(payment.option, PaymentOption::Message);
        assert_eq!(payment.status, "");
        assert_eq!(payment.file_name, None);
        assert_eq!(payment.meeting_details, None);
    }

    #[test]
    fn payment_meeting_details_parse_with_defaults() {
        let doc = RawDoc::from_pairs(
            "p1",
            [
                ("userId", json!("u1")),
                ("option", json!("meeting")),
                ("meetingDetails", json!({"date": "2025-04-01"})),
            ],
        );
        let payment = payment_from_raw(&doc);
        let details = payment.meeting_details.unwrap();
        assert_eq!(details.date, "2025-04-01");
        assert_eq!(details.environment, "");
    }

    #[test]
    fn payment_null_meeting_details_is_absent() {
        let doc = RawDoc::from_pairs("p1", [("meetingDetails", json!(null))]);
        assert_eq!(payment_from_raw(&doc).meeting_details, None);
    }
}
