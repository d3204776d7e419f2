//! Identity record gateway.
//!
//! The gateway owns the redemption codes and identity records. The
//! verification core talks to it through two calls with a deliberate
//! asymmetry: [`RecordGateway::fetch_bound_record`] is a pure read that
//! mints a one-time authorization token (viewing eligibility), and
//! [`RecordGateway::report_outcome`] is the only state-mutating call
//! (committing a use). The token is what makes the commit idempotent —
//! replaying a report with an already-consumed token is an acked no-op, so
//! a code can never be consumed twice by one session.

pub mod error;
pub mod http;
pub mod memory;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use memory::MemoryGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use valor_types::IdentityRecord;

/// One-time capability binding a fetched record to a future outcome report.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(pub String);

impl fmt::Debug for AuthToken {
    // Tokens are capabilities; keep them out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(..)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a successful eligibility read hands back.
#[derive(Clone, Debug)]
pub struct BoundRecord {
    /// Read-only snapshot of the identity to submit.
    pub record: IdentityRecord,
    /// The code row the eventual commit must reference.
    pub code_id: u64,
    /// One-time token that must accompany the outcome report.
    pub token: AuthToken,
}

/// Final outcome of one verification session.
#[derive(Clone, Debug)]
pub struct OutcomeReport {
    pub record_id: u64,
    pub code_id: u64,
    /// `true` commits the use; `false` releases the record back to pending.
    pub success: bool,
    /// Email address the confirmation loop used.
    pub email: String,
    pub token: AuthToken,
    /// Failure reason to store alongside a released record.
    pub error_message: Option<String>,
}

/// The two operations the verification core depends on.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Exchange a code for the bound identity record and a one-time token.
    /// Read-only: nothing is reserved and no use is consumed.
    async fn fetch_bound_record(&self, code: &str) -> Result<BoundRecord, GatewayError>;

    /// Report the session outcome. Idempotent per (record id, token):
    /// replays must not double-increment the code's use count.
    async fn report_outcome(&self, report: &OutcomeReport) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: RecordGateway + ?Sized> RecordGateway for Arc<T> {
    async fn fetch_bound_record(&self, code: &str) -> Result<BoundRecord, GatewayError> {
        (**self).fetch_bound_record(code).await
    }

    async fn report_outcome(&self, report: &OutcomeReport) -> Result<(), GatewayError> {
        (**self).report_outcome(report).await
    }
}
