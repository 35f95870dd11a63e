//! Lead entity and its scalar field types.
//!
//! A [`Lead`] is the merged, de-duplicated view of one person across the
//! `users` and `leads` collections. The wire vocabulary for status is the
//! Portuguese labels the backing store uses; the Rust names are the
//! language-neutral equivalents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

// ---------------------------------------------------------------------------
// LeadId
// ---------------------------------------------------------------------------

/// Opaque stable identifier of a lead, unique across the merged set.
///
/// Equal to the document id of whichever remote record contributed the
/// entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The four triage states of a lead.
///
/// Wire strings are the store's Portuguese labels: `"Novo"`,
/// `"Em Progresso"`, `"Fechado"`, `"Perdido"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Novo")]
    New,
    #[serde(rename = "Em Progresso")]
    InProgress,
    #[serde(rename = "Fechado")]
    Closed,
    #[serde(rename = "Perdido")]
    Lost,
}

impl Status {
    /// Every status, in triage order. Useful for filter menus.
    pub const ALL: [Self; 4] = [Self::New, Self::InProgress, Self::Closed, Self::Lost];

    /// The wire label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "Novo",
            Self::InProgress => "Em Progresso",
            Self::Closed => "Fechado",
            Self::Lost => "Perdido",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a recognized status label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status label: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Novo" => Ok(Self::New),
            "Em Progresso" => Ok(Self::InProgress),
            "Fechado" => Ok(Self::Closed),
            "Perdido" => Ok(Self::Lost),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// CreatedAt
// ---------------------------------------------------------------------------

/// Creation timestamp token.
///
/// The remote store assigns timestamps server-side, so a freshly written
/// record is observed locally before its timestamp exists. `Pending` is that
/// placeholder; it orders after every concrete instant, since a record
/// awaiting assignment is the newest thing known locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    At(DateTime<Utc>),
    Pending,
}

impl CreatedAt {
    /// Render for the board: local-less date or `-` while pending.
    #[must_use]
    pub fn display(self) -> String {
        match self {
            Self::At(ts) => ts.format("%Y-%m-%d").to_string(),
            Self::Pending => "-".to_string(),
        }
    }
}

impl Default for CreatedAt {
    fn default() -> Self {
        Self::Pending
    }
}

impl PartialOrd for CreatedAt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CreatedAt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::At(a), Self::At(b)) => a.cmp(b),
            (Self::At(_), Self::Pending) => Ordering::Less,
            (Self::Pending, Self::At(_)) => Ordering::Greater,
            (Self::Pending, Self::Pending) => Ordering::Equal,
        }
    }
}

// ---------------------------------------------------------------------------
// Lead
// ---------------------------------------------------------------------------

/// One merged entity on the CRM board.
///
/// Display fields (`name`, `email`, `phone`, `created_at`) come from
/// whichever remote record last contributed the base; `status` and
/// `comments` are the overlay the merge engine protects. The dirty flags
/// record that a locally initiated edit has not yet been confirmed by the
/// remote source; while set, an incoming authoritative value does not
/// replace the local one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: Status,
    pub comments: Vec<String>,
    pub created_at: CreatedAt,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub status_dirty: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub comments_dirty: bool,
}

impl Lead {
    /// A lead with defaulted triage fields, as produced from a `users`
    /// document.
    #[must_use]
    pub fn untriaged(id: LeadId, name: String, email: String, phone: String) -> Self {
        Self {
            id,
            name,
            email,
            phone,
            status: Status::New,
            comments: Vec::new(),
            created_at: CreatedAt::Pending,
            status_dirty: false,
            comments_dirty: false,
        }
    }

    /// True when either overlay field awaits remote confirmation.
    #[must_use]
    pub const fn has_unconfirmed_edits(&self) -> bool {
        self.status_dirty || self.comments_dirty
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
