//! corral-core library.
//!
//! The merge core behind the CRM lead board: typed models for leads and
//! payments, a validated parse layer over untyped snapshot documents, the
//! view-merge board itself, the payment correlator, and the serialized
//! dispatch queue that keeps the overlay rule safe.
//!
//! # Conventions
//!
//! - **Errors**: snapshot handling and local mutations are total and never
//!   fail; ambient surfaces (config, session, write-back) use
//!   `anyhow::Result` or a typed error where the error is part of the API.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod board;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod payments;
pub mod record;
pub mod session;
pub mod view;
pub mod writeback;

pub use board::Board;
pub use dispatch::{Dispatcher, Intake};
pub use model::lead::{CreatedAt, Lead, LeadId, Status};
pub use model::payment::{MeetingDetails, Payment, PaymentOption};
pub use payments::{Highlight, PaymentIndex};
pub use record::RawDoc;
