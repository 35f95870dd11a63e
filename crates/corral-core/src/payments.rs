//! Payment correlator: joins payment documents to leads by foreign key.
//!
//! The index answers two questions cheaply: which highlight a lead's row
//! gets (meeting beats message, a fixed priority), and the full payment
//! list shown when a row is expanded. Each `payments` snapshot replaces the
//! index wholesale; there is no incremental path.

use std::collections::HashMap;

use tracing::debug;

use crate::model::lead::LeadId;
use crate::model::payment::{Payment, PaymentOption};
use crate::record::{RawDoc, payment_from_raw};

/// Row highlight derived from a lead's payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Highlight {
    #[default]
    None,
    Message,
    /// Takes precedence over [`Highlight::Message`] when both exist.
    Meeting,
}

/// Payments grouped by lead id, in snapshot arrival order within each group.
#[derive(Debug, Clone, Default)]
pub struct PaymentIndex {
    by_lead: HashMap<LeadId, Vec<Payment>>,
}

impl PaymentIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index with a full `payments` snapshot.
    pub fn index_snapshot(&mut self, docs: &[RawDoc]) {
        let mut by_lead: HashMap<LeadId, Vec<Payment>> = HashMap::new();
        for doc in docs {
            let payment = payment_from_raw(doc);
            by_lead.entry(payment.user_id.clone()).or_default().push(payment);
        }
        debug!(docs = docs.len(), leads = by_lead.len(), "payments indexed");
        self.by_lead = by_lead;
    }

    /// Highlight for a lead's row. Meeting wins over Message when both
    /// payment kinds exist.
    #[must_use]
    pub fn highlight_for(&self, id: &LeadId) -> Highlight {
        let Some(payments) = self.by_lead.get(id) else {
            return Highlight::None;
        };
        if payments.iter().any(|p| p.option == PaymentOption::Meeting) {
            Highlight::Meeting
        } else if payments.iter().any(|p| p.option == PaymentOption::Message) {
            Highlight::Message
        } else {
            Highlight::None
        }
    }

    /// All payments for a lead, in arrival order.
    #[must_use]
    pub fn payments_for(&self, id: &LeadId) -> &[Payment] {
        self.by_lead.get(id).map_or(&[], Vec::as_slice)
    }

    /// Drop the index; used when the consuming view tears down.
    pub fn clear(&mut self) {
        self.by_lead.clear();
    }
}
