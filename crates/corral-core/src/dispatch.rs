//! Serialized single-consumer dispatch over the board and payment index.
//!
//! The overlay rule in [`crate::board`] reads then writes shared state
//! non-atomically, which is only safe if no two handlers interleave. Rather
//! than relying on an ambient event loop to happen to serialize callbacks,
//! the dispatcher makes the guarantee structural: every reaction — the
//! three collection snapshots, the two local mutations, teardown — enters
//! one queue, and a single consumer drains it one event at a time, each
//! handler running to completion before the next starts.
//!
//! Per-source delivery order is queue order. Cross-source order is whatever
//! the feed produced; the board's fixed-order rebuild makes that safe.

use std::collections::VecDeque;

use tracing::debug;

use crate::board::Board;
use crate::model::lead::{LeadId, Status};
use crate::payments::PaymentIndex;
use crate::record::RawDoc;

/// One event the core reacts to.
#[derive(Debug, Clone)]
pub enum Intake {
    /// Full snapshot of the `users` collection.
    UsersSnapshot(Vec<RawDoc>),
    /// Full snapshot of the `leads` collection.
    LeadsSnapshot(Vec<RawDoc>),
    /// Full snapshot of the `payments` collection.
    PaymentsSnapshot(Vec<RawDoc>),
    /// User picked a new status in the row's dropdown.
    StatusChange { id: LeadId, status: Status },
    /// User submitted the row's comment box.
    Comment { id: LeadId, text: String },
    /// The consuming view is going away; all three subscriptions are
    /// released together.
    Teardown,
}

/// Owns the board and the payment index; the only writer to either.
#[derive(Debug, Default)]
pub struct Dispatcher {
    queue: VecDeque<Intake>,
    board: Board,
    payments: PaymentIndex,
    torn_down: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the merged board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Read-only view of the payment index.
    #[must_use]
    pub const fn payments(&self) -> &PaymentIndex {
        &self.payments
    }

    /// Enqueue an event. Snapshot events arriving after teardown belong to
    /// released subscriptions and are dropped.
    pub fn push(&mut self, intake: Intake) {
        if self.torn_down && matches!(
            intake,
            Intake::UsersSnapshot(_) | Intake::LeadsSnapshot(_) | Intake::PaymentsSnapshot(_)
        ) {
            debug!("snapshot after teardown dropped");
            return;
        }
        self.queue.push_back(intake);
    }

    /// Process one queued event to completion. Returns `false` when the
    /// queue was empty.
    pub fn step(&mut self) -> bool {
        let Some(intake) = self.queue.pop_front() else {
            return false;
        };
        self.apply(intake);
        true
    }

    /// Drain the queue. Returns how many events were processed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut processed = 0;
        while self.step() {
            processed += 1;
        }
        processed
    }

    fn apply(&mut self, intake: Intake) {
        match intake {
            Intake::UsersSnapshot(docs) => self.board.apply_users_snapshot(&docs),
            Intake::LeadsSnapshot(docs) => self.board.apply_leads_snapshot(&docs),
            Intake::PaymentsSnapshot(docs) => self.payments.index_snapshot(&docs),
            Intake::StatusChange { id, status } => self.board.record_status_change(&id, status),
            Intake::Comment { id, text } => self.board.record_comment(&id, &text),
            Intake::Teardown => {
                self.torn_down = true;
                self.board.clear();
                self.payments.clear();
            }
        }
    }
}
