//! JSON-lines feed reader for `crl replay`.
//!
//! One event per line. Blank lines and `#` comments are skipped.
//!
//! ```text
//! {"event":"snapshot","collection":"users","docs":[{"id":"a","name":"Ana"}]}
//! {"event":"status","id":"a","status":"Fechado"}
//! {"event":"comment","id":"a","text":"retornar ligação"}
//! {"event":"teardown"}
//! ```
//!
//! Snapshot docs are objects whose `id` key names the document; every other
//! key becomes a document field. A doc without an `id` is skipped with a
//! warning — the remote store never delivers one, but feed files are
//! hand-editable.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use corral_core::error::ErrorCode;
use corral_core::{Intake, LeadId, RawDoc, Status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Collection {
    Users,
    Leads,
    Payments,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum FeedLine {
    Snapshot {
        collection: Collection,
        docs: Vec<Value>,
    },
    Status {
        id: String,
        status: Status,
    },
    Comment {
        id: String,
        text: String,
    },
    Teardown,
}

fn docs_to_raw(docs: Vec<Value>) -> Vec<RawDoc> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<RawDoc> = Vec::with_capacity(docs.len());
    for doc in docs {
        let Value::Object(mut fields) = doc else {
            warn!("skipping non-object doc in feed");
            continue;
        };
        let Some(Value::String(id)) = fields.remove("id") else {
            warn!("skipping doc without id in feed");
            continue;
        };
        // Hand-edited feeds can repeat an id; keep the last occurrence.
        match positions.get(&id) {
            Some(&pos) => {
                warn!(%id, "duplicate doc id in snapshot, keeping last");
                out[pos] = RawDoc::new(id, fields);
            }
            None => {
                positions.insert(id.clone(), out.len());
                out.push(RawDoc::new(id, fields));
            }
        }
    }
    out
}

impl From<FeedLine> for Intake {
    fn from(line: FeedLine) -> Self {
        match line {
            FeedLine::Snapshot {
                collection: Collection::Users,
                docs,
            } => Self::UsersSnapshot(docs_to_raw(docs)),
            FeedLine::Snapshot {
                collection: Collection::Leads,
                docs,
            } => Self::LeadsSnapshot(docs_to_raw(docs)),
            FeedLine::Snapshot {
                collection: Collection::Payments,
                docs,
            } => Self::PaymentsSnapshot(docs_to_raw(docs)),
            FeedLine::Status { id, status } => Self::StatusChange {
                id: LeadId::new(id),
                status,
            },
            FeedLine::Comment { id, text } => Self::Comment {
                id: LeadId::new(id),
                text,
            },
            FeedLine::Teardown => Self::Teardown,
        }
    }
}

/// Read a feed file into dispatch events, in file order.
pub fn read_feed(path: &Path) -> Result<Vec<Intake>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading feed {}", path.display()))?;

    let mut intakes = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parsed: FeedLine = serde_json::from_str(trimmed).with_context(|| {
            format!(
                "{} {}:{}: malformed feed line",
                ErrorCode::FeedParseError,
                path.display(),
                lineno + 1
            )
        })?;
        intakes.push(parsed.into());
    }
    Ok(intakes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn feed_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_snapshots_and_mutations() {
        let file = feed_file(concat!(
            "# comment\n",
            "\n",
            "{\"event\":\"snapshot\",\"collection\":\"users\",\"docs\":[{\"id\":\"a\",\"name\":\"Ana\"}]}\n",
            "{\"event\":\"status\",\"id\":\"a\",\"status\":\"Fechado\"}\n",
            "{\"event\":\"comment\",\"id\":\"a\",\"text\":\"oi\"}\n",
            "{\"event\":\"teardown\"}\n",
        ));
        let intakes = read_feed(file.path()).unwrap();
        assert_eq!(intakes.len(), 4);
        assert!(matches!(&intakes[0], Intake::UsersSnapshot(docs) if docs.len() == 1));
        assert!(matches!(&intakes[1], Intake::StatusChange { status: Status::Closed, .. }));
        assert!(matches!(&intakes[3], Intake::Teardown));
    }

    #[test]
    fn malformed_line_is_an_error_with_position_and_code() {
        let file = feed_file("{\"event\":\"snapshot\"\n");
        let err = read_feed(file.path()).unwrap_err();
        assert!(err.to_string().contains(":1:"));
        assert!(err.to_string().contains(ErrorCode::FeedParseError.code()));
    }

    #[test]
    fn duplicate_doc_ids_keep_the_last_occurrence() {
        let file = feed_file(
            "{\"event\":\"snapshot\",\"collection\":\"leads\",\"docs\":[{\"id\":\"a\",\"name\":\"First\"},{\"id\":\"a\",\"name\":\"Second\"}]}\n",
        );
        let intakes = read_feed(file.path()).unwrap();
        let Intake::LeadsSnapshot(docs) = &intakes[0] else {
            panic!("expected a leads snapshot");
        };
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields.get("name").unwrap(), "Second");
    }

    #[test]
    fn docs_without_id_are_skipped() {
        let file = feed_file(
            "{\"event\":\"snapshot\",\"collection\":\"leads\",\"docs\":[{\"name\":\"X\"},{\"id\":\"ok\"}]}\n",
        );
        let intakes = read_feed(file.path()).unwrap();
        assert!(matches!(&intakes[0], Intake::LeadsSnapshot(docs) if docs.len() == 1));
    }
}
