//! Step response normalization.
//!
//! Every protocol step answers with a JSON body whose `currentStep` field
//! says where the session now stands. The set of values is not documented
//! exhaustively, so unknown steps are preserved verbatim rather than
//! dropped — the caller decides what to do with them.

use serde::Deserialize;

/// Error ids with a known, user-actionable meaning. Anything else is
/// surfaced by id.
const KNOWN_ERROR_IDS: &[(&str, &str)] = &[
    ("invalidEmailLoopToken", "email token is invalid"),
    ("expiredEmailLoopToken", "email token has expired"),
];

/// Raw JSON body of a step response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub current_state: Option<String>,
    #[serde(default)]
    pub system_error_message: Option<String>,
    #[serde(default)]
    pub error_ids: Vec<String>,
}

/// A step response reduced to what the state machine cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The session paused: an email token must be supplied to continue.
    EmailLoop,
    /// The third party accepted the verification.
    Success,
    /// The third party rejected it, with the most specific reason available.
    Rejected { message: String },
    /// An unrecognized `currentStep`, surfaced verbatim.
    Other { step: String },
}

impl StepResponse {
    /// Collapse the response into a [`StepOutcome`].
    pub fn outcome(self) -> StepOutcome {
        match self.current_step.as_deref() {
            Some("emailLoop") => StepOutcome::EmailLoop,
            Some("success") => StepOutcome::Success,
            Some("error") => StepOutcome::Rejected {
                message: self.rejection_message(),
            },
            Some(step) => StepOutcome::Other {
                step: step.to_string(),
            },
            None => StepOutcome::Other {
                step: "unknown".to_string(),
            },
        }
    }

    /// Reason precedence: known error id, `systemErrorMessage`, remaining
    /// error ids joined, generic fallback.
    fn rejection_message(&self) -> String {
        for (id, message) in KNOWN_ERROR_IDS {
            if self.error_ids.iter().any(|e| e == id) {
                return (*message).to_string();
            }
        }
        if let Some(msg) = self.system_error_message.as_deref() {
            if !msg.is_empty() {
                return msg.to_string();
            }
        }
        if !self.error_ids.is_empty() {
            return self.error_ids.join(", ");
        }
        "verification rejected".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StepResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn email_loop_step() {
        let resp = parse(r#"{"currentStep":"emailLoop","currentState":"collectingEmailToken"}"#);
        assert_eq!(resp.outcome(), StepOutcome::EmailLoop);
    }

    #[test]
    fn success_step() {
        let resp = parse(r#"{"currentStep":"success"}"#);
        assert_eq!(resp.outcome(), StepOutcome::Success);
    }

    #[test]
    fn error_with_system_message() {
        let resp = parse(
            r#"{"currentStep":"error","systemErrorMessage":"record not found","errorIds":[]}"#,
        );
        assert_eq!(
            resp.outcome(),
            StepOutcome::Rejected {
                message: "record not found".into()
            }
        );
    }

    #[test]
    fn error_with_ids_only() {
        let resp = parse(r#"{"currentStep":"error","errorIds":["emailDomain","underReview"]}"#);
        match resp.outcome() {
            StepOutcome::Rejected { message } => {
                assert!(message.contains("emailDomain"));
                assert!(message.contains("underReview"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn known_error_ids_take_precedence() {
        let resp = parse(
            r#"{"currentStep":"error","systemErrorMessage":"generic","errorIds":["expiredEmailLoopToken"]}"#,
        );
        assert_eq!(
            resp.outcome(),
            StepOutcome::Rejected {
                message: "email token has expired".into()
            }
        );
    }

    #[test]
    fn error_without_any_detail() {
        let resp = parse(r#"{"currentStep":"error"}"#);
        assert_eq!(
            resp.outcome(),
            StepOutcome::Rejected {
                message: "verification rejected".into()
            }
        );
    }

    #[test]
    fn unknown_step_is_preserved() {
        let resp = parse(r#"{"currentStep":"docUpload"}"#);
        assert_eq!(
            resp.outcome(),
            StepOutcome::Other {
                step: "docUpload".into()
            }
        );
    }

    #[test]
    fn missing_step_maps_to_unknown() {
        let resp = parse(r#"{"currentState":"pending"}"#);
        assert_eq!(
            resp.outcome(),
            StepOutcome::Other {
                step: "unknown".into()
            }
        );
    }
}
