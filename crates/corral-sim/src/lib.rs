//! corral-sim library.
//!
//! Deterministic validation of the merge core's delivery-order guarantees:
//! generate a world (users, leads, payments), deliver its snapshots in many
//! randomized cross-source orders, and check with the oracle that every
//! order converges to the same board, that the merged set stays
//! duplicate-free, and that seeded local edits survive every refresh.
//!
//! # Conventions
//!
//! - **Errors**: nothing here is fallible; oracle checks report findings as
//!   structured [`InvariantViolation`] values, not errors.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod campaign;
pub mod feed;
pub mod oracle;
pub mod rng;

pub use campaign::{CampaignConfig, CampaignReport, run_campaign};
pub use feed::{DeliveryConfig, World};
pub use oracle::{ConvergenceOracle, InvariantViolation, OracleResult};
pub use rng::DeterministicRng;
