//! SheerID verification protocol client.
//!
//! The third party runs a stateful, session-scoped step protocol: each POST
//! advances the server-side session and answers with a `currentStep`
//! discriminator. This crate wraps the three steps the veteran flow uses
//! (military status, personal info, email loop), normalizes the
//! heterogeneous step responses into [`StepOutcome`], and provides the
//! device fingerprint the protocol's anti-abuse checks require.
//!
//! The protocol is stateful on the remote side, so nothing here retries
//! automatically — a failed step surfaces immediately and resubmission is
//! the caller's decision.

pub mod client;
pub mod error;
pub mod fingerprint;
pub mod step;

pub use client::{PersonalInfoSubmission, SheerIdClient, VerificationApi};
pub use error::SheerIdError;
pub use fingerprint::{DeviceFingerprint, FingerprintProvider, FixedFingerprint};
pub use step::{StepOutcome, StepResponse};
