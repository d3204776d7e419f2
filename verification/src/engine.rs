//! The verification engine — sequences gateway, fingerprint, and protocol
//! calls for one session and interprets step outcomes.
//!
//! Every error is caught at this boundary and turned into a terminal (or,
//! for step-2 transport failures, resumable) [`SessionReport`]; nothing
//! here panics a caller. Compensating `report_outcome(success=false)` calls
//! release the identity record whenever a failure happens after the record
//! was fetched; they are best-effort because the user controls the retry.

use crate::extract::{extract_email_token, extract_session_id};
use crate::session::{SessionState, VerificationSession};
use tracing::{info, warn};
use valor_gateway::{OutcomeReport, RecordGateway};
use valor_sheerid::{
    FingerprintProvider, PersonalInfoSubmission, SheerIdError, StepOutcome, VerificationApi,
};

/// What one engine call hands back to the caller.
///
/// `session` is populated exactly when the flow can continue: the
/// email-loop pause, or a step-2 transport failure awaiting resubmission.
#[derive(Debug)]
pub struct SessionReport {
    pub state: SessionState,
    pub success: bool,
    pub message: String,
    pub session: Option<VerificationSession>,
}

impl SessionReport {
    fn succeeded(message: String) -> Self {
        Self {
            state: SessionState::Succeeded,
            success: true,
            message,
            session: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            state: SessionState::Failed,
            success: false,
            message,
            session: None,
        }
    }

    fn awaiting(session: VerificationSession, message: String) -> Self {
        Self {
            state: SessionState::AwaitingEmailToken,
            success: true,
            message,
            session: Some(session),
        }
    }

    fn unresolved(session: VerificationSession, message: String) -> Self {
        Self {
            state: SessionState::AwaitingEmailToken,
            success: false,
            message,
            session: Some(session),
        }
    }
}

/// Orchestrator for verification sessions. Sessions are independent; the
/// engine holds no per-session state and can drive any number concurrently.
pub struct VerificationEngine<G, A, F> {
    gateway: G,
    api: A,
    fingerprints: F,
}

impl<G, A, F> VerificationEngine<G, A, F>
where
    G: RecordGateway,
    A: VerificationApi,
    F: FingerprintProvider,
{
    pub fn new(gateway: G, api: A, fingerprints: F) -> Self {
        Self {
            gateway,
            api,
            fingerprints,
        }
    }

    /// Step 1: redeem the code and submit the identity.
    ///
    /// Failures before the record fetch report nothing to the gateway —
    /// no token was minted, nothing to release.
    pub async fn begin(&self, code: &str, verification_url: &str, email: &str) -> SessionReport {
        let session_id = match extract_session_id(verification_url) {
            Ok(id) => id,
            Err(e) => return SessionReport::failed(e.to_string()),
        };

        let bound = match self.gateway.fetch_bound_record(code).await {
            Ok(bound) => bound,
            Err(e) => return SessionReport::failed(e.to_string()),
        };
        info!(session_id, record_id = bound.record.id, "starting verification session");

        let fingerprint = self.fingerprints.fingerprint().await;
        let mut session = VerificationSession {
            session_id,
            state: SessionState::Step1Submitted,
            record: bound.record,
            code_id: bound.code_id,
            token: bound.token,
            fingerprint,
            email: email.to_string(),
            referer_url: verification_url.to_string(),
            last_error: None,
        };

        let outcome = match self.run_step1(&session).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The record was fetched, so release it before failing.
                self.release(&session, &e.to_string()).await;
                return SessionReport::failed(e.to_string());
            }
        };

        match outcome {
            StepOutcome::EmailLoop => {
                session.state = SessionState::AwaitingEmailToken;
                info!(session_id = %session.session_id, "session paused for email token");
                let message = format!(
                    "submitted — check {} for the confirmation token",
                    session.email
                );
                SessionReport::awaiting(session, message)
            }
            StepOutcome::Success => {
                self.commit(&mut session, "verification approved".to_string())
                    .await
            }
            StepOutcome::Rejected { message } => {
                self.release(&session, &message).await;
                SessionReport::failed(message)
            }
            StepOutcome::Other { step } => {
                // Unrecognized steps commit optimistically; the step name is
                // surfaced so these sessions stay auditable.
                let message = format!("verification submitted; service reports step '{step}'");
                self.commit(&mut session, message).await
            }
        }
    }

    /// Step 2: complete the email loop with the user-supplied token or link.
    pub async fn resume(&self, mut session: VerificationSession, token_input: &str) -> SessionReport {
        if session.state != SessionState::AwaitingEmailToken {
            return SessionReport::failed(format!(
                "session is not awaiting an email token (state {:?})",
                session.state
            ));
        }

        let token = extract_email_token(token_input);
        session.state = SessionState::Step2Submitted;

        let outcome = match self
            .api
            .submit_email_token(&session.session_id, &token, &session.fingerprint)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // Transport failure: the server-side session is unresolved,
                // not rejected. Hand the session back for resubmission.
                let message = e.to_string();
                warn!(session_id = %session.session_id, error = %message, "email loop submission failed");
                session.state = SessionState::AwaitingEmailToken;
                session.last_error = Some(message.clone());
                return SessionReport::unresolved(session, message);
            }
        };

        match outcome {
            StepOutcome::Success => {
                self.commit(&mut session, "verification approved".to_string())
                    .await
            }
            StepOutcome::Rejected { message } => {
                self.release(&session, &message).await;
                SessionReport::failed(message)
            }
            StepOutcome::EmailLoop | StepOutcome::Other { .. } => {
                let step = match outcome {
                    StepOutcome::Other { step } => step,
                    _ => "emailLoop".to_string(),
                };
                let message = format!("verification submitted; service reports step '{step}'");
                self.commit(&mut session, message).await
            }
        }
    }

    async fn run_step1(&self, session: &VerificationSession) -> Result<StepOutcome, SheerIdError> {
        self.api
            .submit_status(&session.session_id, &session.referer_url)
            .await?;
        self.api
            .submit_personal_info(&PersonalInfoSubmission {
                session_id: session.session_id.clone(),
                record: session.record.clone(),
                email: session.email.clone(),
                fingerprint: session.fingerprint.clone(),
                referer_url: session.referer_url.clone(),
            })
            .await
    }

    /// Commit the use. The gateway mutation is the authoritative outcome;
    /// if it cannot be recorded, the session fails with the gateway detail
    /// rather than claiming an uncommitted success.
    async fn commit(&self, session: &mut VerificationSession, message: String) -> SessionReport {
        let report = OutcomeReport {
            record_id: session.record.id,
            code_id: session.code_id,
            success: true,
            email: session.email.clone(),
            token: session.token.clone(),
            error_message: None,
        };
        match self.gateway.report_outcome(&report).await {
            Ok(()) => {
                session.state = SessionState::Succeeded;
                info!(session_id = %session.session_id, "verification committed");
                SessionReport::succeeded(message)
            }
            Err(e) => {
                session.state = SessionState::Failed;
                SessionReport::failed(format!(
                    "verification approved but the outcome could not be recorded: {e}"
                ))
            }
        }
    }

    /// Release the record after a failure. Best-effort: the user retries by
    /// resubmitting, so an unreachable gateway here is logged, not escalated.
    async fn release(&self, session: &VerificationSession, reason: &str) {
        let report = OutcomeReport {
            record_id: session.record.id,
            code_id: session.code_id,
            success: false,
            email: session.email.clone(),
            token: session.token.clone(),
            error_message: Some(reason.to_string()),
        };
        if let Err(e) = self.gateway.report_outcome(&report).await {
            warn!(
                session_id = %session.session_id,
                error = %e,
                "failed to release identity record after a failed session"
            );
        }
    }
}
