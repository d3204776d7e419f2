//! Fundamental types for the valor verification flow.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: redemption codes, identity records, organizations, and
//! timestamps. It carries no I/O — eligibility rules live here so that every
//! gateway implementation enforces the same invariant.

pub mod code;
pub mod record;
pub mod time;

pub use code::RedeemCode;
pub use record::{IdentityRecord, Organization, RecordStatus};
pub use time::Timestamp;
