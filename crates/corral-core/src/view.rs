//! Read helpers for the board view: status filtering and search.
//!
//! Mirrors the dashboard's filter dropdown and search box. Search matches
//! the email (case-insensitive substring) or the phone (plain substring),
//! which is how operators look leads up from a payment's `userPhone`.

use crate::model::lead::{Lead, Status};

/// Status filter as picked in the dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// "Todos" — no status restriction.
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// True when the lead passes this filter.
    #[must_use]
    pub fn admits(self, lead: &Lead) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => lead.status == status,
        }
    }
}

/// Apply the status filter and search term, preserving board order.
///
/// An empty search term matches everything.
#[must_use]
pub fn filter_leads<'a>(leads: &'a [Lead], filter: StatusFilter, search: &str) -> Vec<&'a Lead> {
    let needle = search.to_lowercase();
    leads
        .iter()
        .filter(|l| filter.admits(l))
        .filter(|l| {
            needle.is_empty()
                || l.email.to_lowercase().contains(&needle)
                || l.phone.contains(search)
        })
        .collect()
}
