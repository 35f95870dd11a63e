//! Typed data model for the merged lead board.

pub mod lead;
pub mod payment;
