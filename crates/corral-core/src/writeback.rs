//! Write-back of local edits to the remote store.
//!
//! The board applies edits optimistically; pushing them to the remote store
//! happens here, behind the [`RemoteLeadSink`] seam. The original dashboard
//! swallowed write failures without a trace. That behavior is kept
//! available as an explicit policy, next to a bounded-retry alternative —
//! but under neither policy is the optimistic local state reverted: the
//! board's overlay invariant promises the user's edit stays visible, and
//! the next matching snapshot reconciles remote truth either way.

use std::thread;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::board::Board;
use crate::error::ErrorCode;
use crate::model::lead::{LeadId, Status};

/// The remote mutation boundary for `leads` documents.
pub trait RemoteLeadSink {
    /// Persist a status change.
    fn update_status(&mut self, id: &LeadId, status: Status) -> anyhow::Result<()>;
    /// Persist a comment append.
    fn append_comment(&mut self, id: &LeadId, text: &str) -> anyhow::Result<()>;
}

/// What to do when the remote write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBackPolicy {
    /// Log at `warn!` and move on. The original's behavior, made explicit.
    Swallow,
    /// Retry up to `max_attempts` total tries, doubling the delay from
    /// `initial_backoff` between tries, then log at `error!` and move on.
    Retry {
        max_attempts: u32,
        initial_backoff: Duration,
    },
}

impl Default for WriteBackPolicy {
    fn default() -> Self {
        Self::Swallow
    }
}

/// Whether the remote store acknowledged a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The sink accepted the write; the board's dirty flag was cleared.
    Confirmed,
    /// The write never landed; the optimistic edit stands unconfirmed
    /// until a snapshot echoes it.
    Unconfirmed,
}

/// Drives a sink under a policy and feeds acknowledgments back to the
/// board.
#[derive(Debug)]
pub struct WriteBack<S> {
    sink: S,
    policy: WriteBackPolicy,
}

impl<S: RemoteLeadSink> WriteBack<S> {
    #[must_use]
    pub const fn new(sink: S, policy: WriteBackPolicy) -> Self {
        Self { sink, policy }
    }

    /// Apply a status change locally, then push it to the remote store.
    pub fn push_status(&mut self, board: &mut Board, id: &LeadId, status: Status) -> WriteOutcome {
        board.record_status_change(id, status);
        let outcome = self.attempt("status", id, |sink| sink.update_status(id, status));
        if outcome == WriteOutcome::Confirmed {
            board.confirm_status(id, status);
        }
        outcome
    }

    /// Append a comment locally, then push it to the remote store. Empty
    /// text is a no-op, mirroring the board.
    pub fn push_comment(&mut self, board: &mut Board, id: &LeadId, text: &str) -> WriteOutcome {
        if text.is_empty() {
            return WriteOutcome::Confirmed;
        }
        board.record_comment(id, text);
        let outcome = self.attempt("comment", id, |sink| sink.append_comment(id, text));
        if outcome == WriteOutcome::Confirmed {
            board.confirm_comments(id);
        }
        outcome
    }

    fn attempt(
        &mut self,
        kind: &str,
        id: &LeadId,
        mut write: impl FnMut(&mut S) -> anyhow::Result<()>,
    ) -> WriteOutcome {
        match self.policy {
            WriteBackPolicy::Swallow => match write(&mut self.sink) {
                Ok(()) => WriteOutcome::Confirmed,
                Err(err) => {
                    warn!(%id, kind, %err, "remote write failed, swallowed by policy");
                    WriteOutcome::Unconfirmed
                }
            },
            WriteBackPolicy::Retry {
                max_attempts,
                initial_backoff,
            } => {
                let mut backoff = initial_backoff;
                for attempt in 1..=max_attempts.max(1) {
                    match write(&mut self.sink) {
                        Ok(()) => return WriteOutcome::Confirmed,
                        Err(err) if attempt < max_attempts.max(1) => {
                            debug!(%id, kind, attempt, %err, "remote write failed, retrying");
                            thread::sleep(backoff);
                            backoff = backoff.saturating_mul(2);
                        }
                        Err(err) => {
                            error!(
                                code = %ErrorCode::WriteBackExhausted,
                                %id, kind, attempts = attempt, %err,
                                "remote write exhausted retries"
                            );
                        }
                    }
                }
                WriteOutcome::Unconfirmed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawDoc;
    use anyhow::anyhow;
    use serde_json::json;

    /// Sink that fails the first `fail_first` calls, then succeeds.
    #[derive(Debug, Default)]
    struct FlakySink {
        fail_first: u32,
        calls: u32,
    }

    impl RemoteLeadSink for FlakySink {
        fn update_status(&mut self, _id: &LeadId, _status: Status) -> anyhow::Result<()> {
            self.calls += 1;
            if self.calls <= self.fail_first {
                Err(anyhow!("unavailable"))
            } else {
                Ok(())
            }
        }

        fn append_comment(&mut self, _id: &LeadId, _text: &str) -> anyhow::Result<()> {
            self.calls += 1;
            if self.calls <= self.fail_first {
                Err(anyhow!("unavailable"))
            } else {
                Ok(())
            }
        }
    }

    fn board_with_lead(id: &str) -> Board {
        let mut board = Board::new();
        board.apply_leads_snapshot(&[RawDoc::from_pairs(
            id,
            [("name", json!("Bia")), ("status", json!("Novo"))],
        )]);
        board
    }

    #[test]
    fn successful_write_confirms_and_clears_dirty() {
        let mut board = board_with_lead("e1");
        let mut wb = WriteBack::new(FlakySink::default(), WriteBackPolicy::Swallow);
        let outcome = wb.push_status(&mut board, &LeadId::from("e1"), Status::Closed);
        assert_eq!(outcome, WriteOutcome::Confirmed);
        let lead = board.get(&LeadId::from("e1")).unwrap();
        assert_eq!(lead.status, Status::Closed);
        assert!(!lead.status_dirty);
    }

    #[test]
    fn swallow_keeps_optimistic_state_on_failure() {
        let mut board = board_with_lead("e1");
        let sink = FlakySink {
            fail_first: u32::MAX,
            calls: 0,
        };
        let mut wb = WriteBack::new(sink, WriteBackPolicy::Swallow);
        let outcome = wb.push_status(&mut board, &LeadId::from("e1"), Status::Closed);
        assert_eq!(outcome, WriteOutcome::Unconfirmed);
        let lead = board.get(&LeadId::from("e1")).unwrap();
        assert_eq!(lead.status, Status::Closed);
        assert!(lead.status_dirty);
    }

    #[test]
    fn retry_recovers_from_transient_failure() {
        let mut board = board_with_lead("e1");
        let sink = FlakySink {
            fail_first: 2,
            calls: 0,
        };
        let policy = WriteBackPolicy::Retry {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
        };
        let mut wb = WriteBack::new(sink, policy);
        let outcome = wb.push_status(&mut board, &LeadId::from("e1"), Status::Closed);
        assert_eq!(outcome, WriteOutcome::Confirmed);
        assert!(!board.get(&LeadId::from("e1")).unwrap().status_dirty);
    }

    #[test]
    fn retry_exhaustion_leaves_edit_standing() {
        let mut board = board_with_lead("e1");
        let sink = FlakySink {
            fail_first: u32::MAX,
            calls: 0,
        };
        let policy = WriteBackPolicy::Retry {
            max_attempts: 2,
            initial_backoff: Duration::ZERO,
        };
        let mut wb = WriteBack::new(sink, policy);
        let outcome = wb.push_status(&mut board, &LeadId::from("e1"), Status::Closed);
        assert_eq!(outcome, WriteOutcome::Unconfirmed);
        let lead = board.get(&LeadId::from("e1")).unwrap();
        assert_eq!(lead.status, Status::Closed);
        assert!(lead.status_dirty);
    }

    #[test]
    fn empty_comment_never_reaches_the_sink() {
        let mut board = board_with_lead("e1");
        let mut wb = WriteBack::new(FlakySink::default(), WriteBackPolicy::Swallow);
        wb.push_comment(&mut board, &LeadId::from("e1"), "");
        assert_eq!(wb.sink.calls, 0);
    }

    #[test]
    fn confirmed_comment_clears_dirty() {
        let mut board = board_with_lead("e1");
        let mut wb = WriteBack::new(FlakySink::default(), WriteBackPolicy::Swallow);
        wb.push_comment(&mut board, &LeadId::from("e1"), "retornar ligação");
        let lead = board.get(&LeadId::from("e1")).unwrap();
        assert_eq!(lead.comments, vec!["retornar ligação"]);
        assert!(!lead.comments_dirty);
    }
}
