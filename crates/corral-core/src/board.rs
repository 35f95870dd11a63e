//! The view-merge engine behind the CRM lead board.
//!
//! Two collections feed the board: `users` (every registered profile) and
//! `leads` (the curated triage records). Each delivers full snapshots, in
//! its own order, with no cross-collection ordering guarantee. The board
//! merges both into one de-duplicated list while protecting the overlay:
//! locally initiated status changes and comment appends that the remote
//! store has not yet echoed back.
//!
//! # Merge discipline
//!
//! The board keeps the last snapshot received from each source. Applying a
//! snapshot stores it, then rebuilds the merged list by replaying the
//! `users` pass followed by the `leads` pass, in that fixed order, every
//! time. Replaying both passes is what makes the result independent of
//! which snapshot happened to arrive last: `leads` display fields win on an
//! id collision because the `leads` pass always runs last, not because of
//! arrival luck.
//!
//! Each single-source pass produces the snapshot's records (overlaid with
//! prior state) followed by the prior entities the snapshot does not
//! mention, so an entity never appears twice.
//!
//! # Overlay rule
//!
//! `users` records carry no authority over status or comments: that pass
//! always preserves the prior values. `leads` records are authoritative,
//! but a dirty flag (set by [`Board::record_status_change`] /
//! [`Board::record_comment`]) holds the local value against an incoming
//! snapshot until the snapshot echoes the exact local value, or a
//! write-back acknowledgment arrives via [`Board::confirm_status`] /
//! [`Board::confirm_comments`]. An edit the user just made is never
//! visually reverted by a stale snapshot.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::ErrorCode;
use crate::model::lead::{Lead, LeadId, Status};
use crate::record::{LeadRecord, RawDoc, UserRecord};

/// The merged lead list plus the snapshot replay state that keeps it
/// convergent.
///
/// The board exclusively owns its list; readers get `&[Lead]`, and all
/// mutation goes through the operations below.
#[derive(Debug, Clone, Default)]
pub struct Board {
    leads: Vec<Lead>,
    users_snapshot: Option<Vec<UserRecord>>,
    leads_snapshot: Option<Vec<LeadRecord>>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current merged list, in stable board order.
    #[must_use]
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Look up one lead by id.
    #[must_use]
    pub fn get(&self, id: &LeadId) -> Option<&Lead> {
        self.leads.iter().find(|l| &l.id == id)
    }

    /// True before any snapshot has arrived and after teardown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    // -----------------------------------------------------------------------
    // Snapshot handlers
    // -----------------------------------------------------------------------

    /// Apply a full snapshot of the `users` collection. Duplicate ids
    /// within the snapshot collapse to the last occurrence.
    pub fn apply_users_snapshot(&mut self, docs: &[RawDoc]) {
        let records = dedup_last_by_id(docs.iter().map(UserRecord::from_raw).collect(), |u| &u.id);
        debug!(docs = records.len(), "users snapshot applied");
        self.users_snapshot = Some(records);
        self.rebuild();
    }

    /// Apply a full snapshot of the `leads` collection. Duplicate ids
    /// within the snapshot collapse to the last occurrence.
    pub fn apply_leads_snapshot(&mut self, docs: &[RawDoc]) {
        let records = dedup_last_by_id(docs.iter().map(LeadRecord::from_raw).collect(), |l| &l.id);
        debug!(docs = records.len(), "leads snapshot applied");
        self.leads_snapshot = Some(records);
        self.rebuild();
    }

    /// Replay both stored snapshots over the current state, `users` first.
    fn rebuild(&mut self) {
        let mut merged = std::mem::take(&mut self.leads);
        if let Some(users) = &self.users_snapshot {
            merged = users_pass(merged, users);
        }
        if let Some(leads) = &self.leads_snapshot {
            merged = leads_pass(merged, leads);
        }
        self.leads = merged;
    }

    // -----------------------------------------------------------------------
    // Local mutations (optimistic)
    // -----------------------------------------------------------------------

    /// Optimistically change a lead's status. No effect when `id` is
    /// unknown. Idempotent: re-applying the current status changes nothing.
    pub fn record_status_change(&mut self, id: &LeadId, status: Status) {
        let Some(lead) = self.leads.iter_mut().find(|l| &l.id == id) else {
            debug!(code = %ErrorCode::UnknownLead, %id, "status change for unknown lead ignored");
            return;
        };
        if lead.status == status {
            return;
        }
        lead.status = status;
        lead.status_dirty = true;
    }

    /// Optimistically append a comment. No-op on empty text or unknown
    /// `id`. Each call appends; this is deliberately not idempotent.
    pub fn record_comment(&mut self, id: &LeadId, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(lead) = self.leads.iter_mut().find(|l| &l.id == id) else {
            debug!(code = %ErrorCode::UnknownLead, %id, "comment for unknown lead ignored");
            return;
        };
        lead.comments.push(text.to_string());
        lead.comments_dirty = true;
    }

    // -----------------------------------------------------------------------
    // Write-back acknowledgments
    // -----------------------------------------------------------------------

    /// Acknowledge that a status write reached the remote store. Clears the
    /// dirty flag only while the acknowledged value is still displayed.
    pub fn confirm_status(&mut self, id: &LeadId, status: Status) {
        if let Some(lead) = self.leads.iter_mut().find(|l| &l.id == id)
            && lead.status == status
        {
            lead.status_dirty = false;
        }
    }

    /// Acknowledge that the lead's comment list reached the remote store.
    pub fn confirm_comments(&mut self, id: &LeadId) {
        if let Some(lead) = self.leads.iter_mut().find(|l| &l.id == id) {
            lead.comments_dirty = false;
        }
    }

    /// Drop everything; used when the consuming view tears down.
    pub fn clear(&mut self) {
        self.leads.clear();
        self.users_snapshot = None;
        self.leads_snapshot = None;
    }
}

/// Collapse records that repeat an id within one snapshot: the last
/// occurrence wins, holding the position of the first.
fn dedup_last_by_id<R>(records: Vec<R>, id_of: impl Fn(&R) -> &LeadId) -> Vec<R> {
    let mut positions: HashMap<LeadId, usize> = HashMap::new();
    let mut out: Vec<R> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(id_of(&record)) {
            Some(&pos) => out[pos] = record,
            None => {
                positions.insert(id_of(&record).clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Single-source merge passes
// ---------------------------------------------------------------------------

/// Merge a `users` snapshot over prior state. Display fields come from the
/// snapshot; status, comments, and dirty flags are always preserved, since
/// `users` documents carry no triage authority.
fn users_pass(prior: Vec<Lead>, snapshot: &[UserRecord]) -> Vec<Lead> {
    let snapshot_ids: HashSet<&LeadId> = snapshot.iter().map(|u| &u.id).collect();

    let mut merged: Vec<Lead> = snapshot
        .iter()
        .map(|u| {
            let existing = prior.iter().find(|p| p.id == u.id);
            match existing {
                Some(prev) => Lead {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    email: u.email.clone(),
                    phone: u.phone.clone(),
                    created_at: u.created_at,
                    status: prev.status,
                    comments: prev.comments.clone(),
                    status_dirty: prev.status_dirty,
                    comments_dirty: prev.comments_dirty,
                },
                None => {
                    let mut lead = Lead::untriaged(
                        u.id.clone(),
                        u.name.clone(),
                        u.email.clone(),
                        u.phone.clone(),
                    );
                    lead.created_at = u.created_at;
                    lead
                }
            }
        })
        .collect();

    merged.extend(
        prior
            .into_iter()
            .filter(|p| !snapshot_ids.contains(&p.id)),
    );
    merged
}

/// Merge a `leads` snapshot over prior state. Display fields come from the
/// snapshot; status and comments are taken as authoritative unless a dirty
/// flag holds a local edit, in which case the local value stands until the
/// snapshot echoes it exactly.
fn leads_pass(prior: Vec<Lead>, snapshot: &[LeadRecord]) -> Vec<Lead> {
    let snapshot_ids: HashSet<&LeadId> = snapshot.iter().map(|l| &l.id).collect();

    let mut merged: Vec<Lead> = snapshot
        .iter()
        .map(|l| {
            let existing = prior.iter().find(|p| p.id == l.id);
            let (status, status_dirty) = match existing {
                Some(prev) if prev.status_dirty => {
                    if prev.status == l.status {
                        // Remote echoed the local edit; confirmed.
                        (l.status, false)
                    } else {
                        (prev.status, true)
                    }
                }
                _ => (l.status, false),
            };
            let (comments, comments_dirty) = match existing {
                Some(prev) if prev.comments_dirty => {
                    if prev.comments == l.comments {
                        (l.comments.clone(), false)
                    } else {
                        (prev.comments.clone(), true)
                    }
                }
                _ => (l.comments.clone(), false),
            };
            Lead {
                id: l.id.clone(),
                name: l.name.clone(),
                email: l.email.clone(),
                phone: l.phone.clone(),
                created_at: l.created_at,
                status,
                comments,
                status_dirty,
                comments_dirty,
            }
        })
        .collect();

    merged.extend(
        prior
            .into_iter()
            .filter(|p| !snapshot_ids.contains(&p.id)),
    );
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
