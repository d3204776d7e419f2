//! HTTP client for the SheerID step protocol.
//!
//! Endpoints and payloads must match the service's jslib wire format
//! exactly; the service keys anti-abuse checks off the `clientname`
//! headers and the personal-info payload shape.

use crate::error::SheerIdError;
use crate::step::{StepOutcome, StepResponse};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use valor_types::IdentityRecord;

/// Production service base URL.
pub const DEFAULT_BASE_URL: &str = "https://services.sheerid.com";

/// Per-request timeout. Steps are synchronous server-side checks and can
/// take a while under load.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CLIENT_NAME: &str = "jslib";
const CLIENT_VERSION: &str = "2.157.0";

/// Everything the personal-info step needs in one place.
#[derive(Clone, Debug)]
pub struct PersonalInfoSubmission {
    pub session_id: String,
    pub record: IdentityRecord,
    pub email: String,
    pub fingerprint: String,
    /// The verification URL the user arrived with; echoed to the service
    /// both as the `referer` header and in the payload metadata.
    pub referer_url: String,
}

/// The protocol steps the state machine drives, behind a seam so tests can
/// script outcomes without a network.
#[async_trait]
pub trait VerificationApi: Send + Sync {
    /// Declare the verification category. The response body carries no
    /// decision at this step; only transport failures matter.
    async fn submit_status(&self, session_id: &str, referer_url: &str)
        -> Result<(), SheerIdError>;

    /// Submit the identity payload. The returned outcome drives the state
    /// machine: pause, accept, reject, or an unrecognized step.
    async fn submit_personal_info(
        &self,
        submission: &PersonalInfoSubmission,
    ) -> Result<StepOutcome, SheerIdError>;

    /// Complete the email confirmation loop.
    async fn submit_email_token(
        &self,
        session_id: &str,
        email_token: &str,
        fingerprint: &str,
    ) -> Result<StepOutcome, SheerIdError>;
}

#[async_trait]
impl<T: VerificationApi + ?Sized> VerificationApi for std::sync::Arc<T> {
    async fn submit_status(
        &self,
        session_id: &str,
        referer_url: &str,
    ) -> Result<(), SheerIdError> {
        (**self).submit_status(session_id, referer_url).await
    }

    async fn submit_personal_info(
        &self,
        submission: &PersonalInfoSubmission,
    ) -> Result<StepOutcome, SheerIdError> {
        (**self).submit_personal_info(submission).await
    }

    async fn submit_email_token(
        &self,
        session_id: &str,
        email_token: &str,
        fingerprint: &str,
    ) -> Result<StepOutcome, SheerIdError> {
        (**self)
            .submit_email_token(session_id, email_token, fingerprint)
            .await
    }
}

/// Reusable client for one SheerID deployment.
pub struct SheerIdClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationBody<'a> {
    id: u32,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataBody<'a> {
    market_consent_value: bool,
    referer_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersonalInfoBody<'a> {
    first_name: &'a str,
    last_name: &'a str,
    birth_date: &'a str,
    discharge_date: &'a str,
    email: &'a str,
    phone_number: &'a str,
    country: &'a str,
    locale: &'a str,
    organization: OrganizationBody<'a>,
    device_fingerprint_hash: &'a str,
    metadata: MetadataBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailLoopBody<'a> {
    email_token: &'a str,
    device_fingerprint_hash: &'a str,
}

impl SheerIdClient {
    /// Client for the production service.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client for a custom deployment (or a test server).
    pub fn with_base_url(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn step_url(&self, session_id: &str, step: &str) -> String {
        format!(
            "{}/rest/v2/verification/{}/step/{}",
            self.base_url, session_id, step
        )
    }

    /// POST a step body and return the parsed response. No retries: the
    /// session is stateful server-side and a resubmission is a new attempt.
    async fn post_step<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        referer_url: Option<&str>,
    ) -> Result<StepResponse, SheerIdError> {
        let mut request = self
            .http
            .post(url)
            .header("accept", "application/json")
            .header("clientname", CLIENT_NAME)
            .header("clientversion", CLIENT_VERSION)
            .json(body);
        if let Some(referer) = referer_url {
            request = request.header("referer", referer);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SheerIdError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                SheerIdError::Unreachable(format!("connection failed: {e}"))
            } else {
                SheerIdError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheerIdError::Protocol {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SheerIdError::InvalidResponse(format!("failed to parse step response: {e}")))
    }
}

impl Default for SheerIdClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationApi for SheerIdClient {
    async fn submit_status(
        &self,
        session_id: &str,
        referer_url: &str,
    ) -> Result<(), SheerIdError> {
        let url = self.step_url(session_id, "collectMilitaryStatus");
        let response = self
            .post_step(&url, &StatusBody { status: "VETERAN" }, Some(referer_url))
            .await?;
        debug!(session_id, step = ?response.current_step, "military status accepted");
        Ok(())
    }

    async fn submit_personal_info(
        &self,
        submission: &PersonalInfoSubmission,
    ) -> Result<StepOutcome, SheerIdError> {
        let url = self.step_url(
            &submission.session_id,
            "collectInactiveMilitaryPersonalInfo",
        );
        let record = &submission.record;
        let body = PersonalInfoBody {
            first_name: &record.first_name,
            last_name: &record.last_name,
            birth_date: &record.birth_date,
            discharge_date: &record.discharge_date,
            email: &submission.email,
            phone_number: "",
            country: "US",
            locale: "en-US",
            organization: OrganizationBody {
                id: record.organization.id,
                name: &record.organization.name,
            },
            device_fingerprint_hash: &submission.fingerprint,
            metadata: MetadataBody {
                market_consent_value: false,
                referer_url: &submission.referer_url,
            },
        };

        let response = self
            .post_step(&url, &body, Some(&submission.referer_url))
            .await?;
        let outcome = response.outcome();
        debug!(session_id = %submission.session_id, ?outcome, "personal info submitted");
        Ok(outcome)
    }

    async fn submit_email_token(
        &self,
        session_id: &str,
        email_token: &str,
        fingerprint: &str,
    ) -> Result<StepOutcome, SheerIdError> {
        let url = self.step_url(session_id, "emailLoop");
        let body = EmailLoopBody {
            email_token,
            device_fingerprint_hash: fingerprint,
        };

        let response = self.post_step(&url, &body, None).await?;
        let outcome = response.outcome();
        debug!(session_id, ?outcome, "email loop submitted");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valor_types::{Organization, RecordStatus};

    #[test]
    fn base_url_is_trimmed() {
        let client = SheerIdClient::with_base_url("https://sheerid.test/");
        assert_eq!(
            client.step_url("abc123", "emailLoop"),
            "https://sheerid.test/rest/v2/verification/abc123/step/emailLoop"
        );
    }

    #[test]
    fn personal_info_payload_matches_wire_format() {
        let record = IdentityRecord {
            id: 7,
            first_name: "James".into(),
            last_name: "Carter".into(),
            birth_date: "1961-03-14".into(),
            discharge_date: "1984-09-30".into(),
            organization: Organization::new(4075, "Navy"),
            status: RecordStatus::Pending,
            email_used: None,
            error_message: None,
            verified_at: None,
        };
        let body = PersonalInfoBody {
            first_name: &record.first_name,
            last_name: &record.last_name,
            birth_date: &record.birth_date,
            discharge_date: &record.discharge_date,
            email: "james@example.com",
            phone_number: "",
            country: "US",
            locale: "en-US",
            organization: OrganizationBody {
                id: record.organization.id,
                name: &record.organization.name,
            },
            device_fingerprint_hash: "0123456789abcdef01234567",
            metadata: MetadataBody {
                market_consent_value: false,
                referer_url: "https://services.sheerid.com/verify?verificationId=aaaabbbbccccddddeeeeffff",
            },
        };

        let json: serde_json::Value = serde_json::to_value(&body).unwrap();
        assert_eq!(json["firstName"], "James");
        assert_eq!(json["birthDate"], "1961-03-14");
        assert_eq!(json["dischargeDate"], "1984-09-30");
        assert_eq!(json["phoneNumber"], "");
        assert_eq!(json["country"], "US");
        assert_eq!(json["locale"], "en-US");
        assert_eq!(json["organization"]["id"], 4075);
        assert_eq!(json["organization"]["name"], "Navy");
        assert_eq!(json["deviceFingerprintHash"], "0123456789abcdef01234567");
        assert_eq!(json["metadata"]["marketConsentValue"], false);
        assert!(json["metadata"]["refererUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://"));
    }

    #[test]
    fn email_loop_payload_matches_wire_format() {
        let body = EmailLoopBody {
            email_token: "482913",
            device_fingerprint_hash: "fp",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["emailToken"], "482913");
        assert_eq!(json["deviceFingerprintHash"], "fp");
    }

    #[test]
    fn status_payload_is_veteran() {
        let json = serde_json::to_value(StatusBody { status: "VETERAN" }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "VETERAN"}));
    }
}
