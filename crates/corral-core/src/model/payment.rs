//! Payment records, as read from the `payments` collection.
//!
//! Payments are created and mutated by the payment-submission flow, which
//! lives outside this core. The correlator only reads them.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::model::lead::{CreatedAt, LeadId};

/// What the payer bought: a message credit or a meeting request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOption {
    #[default]
    Message,
    Meeting,
}

impl PaymentOption {
    /// The wire label for this option.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Meeting => "meeting",
        }
    }
}

impl fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a recognized payment option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment option: {0:?}")]
pub struct UnknownOption(pub String);

impl FromStr for PaymentOption {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Self::Message),
            "meeting" => Ok(Self::Meeting),
            other => Err(UnknownOption(other.to_string())),
        }
    }
}

/// Structured detail attached to a meeting payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetails {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub expectation: String,
}

/// One payment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Foreign key into the merged lead set.
    pub user_id: LeadId,
    pub option: PaymentOption,
    /// Free-form lifecycle string; `"pending"` at creation.
    pub status: String,
    pub user_phone: String,
    /// Upload reference from the proof-of-payment flow, when present.
    pub file_name: Option<String>,
    pub meeting_details: Option<MeetingDetails>,
    pub created_at: CreatedAt,
}
