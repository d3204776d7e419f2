//! Verification session state.
//!
//! A session is ephemeral: it exists in memory for the duration of one
//! attempt and is never persisted. If the process dies while the third
//! party sits in its email loop, the only recovery is a fresh attempt with
//! a fresh or reused verification URL — the code is safe either way because
//! only the outcome commit consumes a use.

use valor_gateway::AuthToken;
use valor_types::IdentityRecord;

/// Where one verification attempt currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing submitted yet.
    Init,
    /// Step 1 (status + personal info) is in flight.
    Step1Submitted,
    /// Paused: the user must supply the emailed token.
    AwaitingEmailToken,
    /// Step 2 (email loop) is in flight.
    Step2Submitted,
    /// Terminal: outcome committed as a success.
    Succeeded,
    /// Terminal: rejected, errored, or ineligible.
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed)
    }
}

/// In-memory state for one attempt, created when step 1 is submitted and
/// destroyed on a terminal outcome or abandonment.
#[derive(Clone, Debug)]
pub struct VerificationSession {
    /// Third-party session identifier extracted from the supplied URL.
    pub session_id: String,
    pub state: SessionState,
    /// Read-only snapshot of the identity being verified.
    pub record: IdentityRecord,
    pub code_id: u64,
    /// One-time token minted by the gateway for the outcome report.
    pub token: AuthToken,
    pub fingerprint: String,
    /// Email address receiving the confirmation loop.
    pub email: String,
    /// The verification URL the user arrived with.
    pub referer_url: String,
    /// Most recent non-terminal error (step-2 transport failures).
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminality() {
        assert!(SessionState::Succeeded.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Init.is_terminal());
        assert!(!SessionState::AwaitingEmailToken.is_terminal());
        assert!(!SessionState::Step1Submitted.is_terminal());
        assert!(!SessionState::Step2Submitted.is_terminal());
    }
}
