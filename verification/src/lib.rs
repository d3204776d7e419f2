//! Verification session state machine.
//!
//! Orchestrates one redemption-code verification attempt end to end:
//! resolve the session id from the user's URL, exchange the code for an
//! identity record and a one-time authorization token, drive the
//! third-party step protocol, and commit the final outcome exactly once.
//!
//! The flow has a human-in-the-loop suspension point: when the third party
//! answers `emailLoop`, control returns to the caller with a session handle
//! and the flow resumes only when the user supplies the emailed token.
//! Dropping the handle abandons the attempt — the code stays redeemable
//! because only the outcome commit consumes a use.

pub mod engine;
pub mod error;
pub mod extract;
pub mod session;

pub use engine::{SessionReport, VerificationEngine};
pub use error::ExtractionError;
pub use extract::{extract_email_token, extract_session_id};
pub use session::{SessionState, VerificationSession};
