//! HTTP gateway — talks to the backend record store's verify endpoints.
//!
//! Wire contract:
//! - `POST {base}/verify/get-veteran {code}` →
//!   `{success, token, veteran:{...}}` or `{success:false, error}`
//! - `POST {base}/verify/record-result {veteran_id, code_id, success, email, token}` → ack
//!
//! The wire carries ineligibility as a bare message, so every
//! `success:false` answer surfaces as [`GatewayError::CodeInvalid`] with the
//! backend's detail verbatim.

use crate::{AuthToken, BoundRecord, GatewayError, OutcomeReport, RecordGateway};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use valor_types::{IdentityRecord, Organization, RecordStatus};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway client for one backend deployment.
pub struct HttpGateway {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct GetVeteranRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct VeteranWire {
    veteran_id: u64,
    code_id: u64,
    first_name: String,
    last_name: String,
    birth_date: String,
    discharge_date: String,
    org_id: u32,
    org_name: String,
}

#[derive(Deserialize)]
struct GetVeteranResponse {
    success: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    veteran: Option<VeteranWire>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct RecordResultRequest<'a> {
    veteran_id: u64,
    code_id: u64,
    success: bool,
    email: &'a str,
    token: &'a str,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
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

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    GatewayError::Unreachable(e.to_string())
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "HTTP {status}: {}",
                extract_detail(&body)
            )));
        }
        Ok(response)
    }
}

/// Pull the human-readable reason out of an error body when there is one.
fn extract_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(detail) = value.get(key).and_then(|v| v.as_str()) {
                return detail.to_string();
            }
        }
    }
    body.to_string()
}

#[async_trait]
impl RecordGateway for HttpGateway {
    async fn fetch_bound_record(&self, code: &str) -> Result<BoundRecord, GatewayError> {
        let response = self
            .post("/verify/get-veteran", &GetVeteranRequest { code })
            .await?;

        let parsed: GetVeteranResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if !parsed.success {
            let detail = parsed.error.unwrap_or_else(|| "code rejected".to_string());
            return Err(GatewayError::CodeInvalid(detail));
        }

        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("missing authorization token".into()))?;
        let wire = parsed
            .veteran
            .ok_or_else(|| GatewayError::InvalidResponse("missing veteran payload".into()))?;

        debug!(record_id = wire.veteran_id, code_id = wire.code_id, "bound record fetched");

        Ok(BoundRecord {
            record: IdentityRecord {
                id: wire.veteran_id,
                first_name: wire.first_name,
                last_name: wire.last_name,
                birth_date: wire.birth_date,
                discharge_date: wire.discharge_date,
                organization: Organization::new(wire.org_id, wire.org_name),
                status: RecordStatus::Pending,
                email_used: None,
                error_message: None,
                verified_at: None,
            },
            code_id: wire.code_id,
            token: AuthToken(token),
        })
    }

    async fn report_outcome(&self, report: &OutcomeReport) -> Result<(), GatewayError> {
        let body = RecordResultRequest {
            veteran_id: report.record_id,
            code_id: report.code_id,
            success: report.success,
            email: &report.email,
            token: &report.token.0,
        };
        self.post("/verify/record-result", &body).await?;
        debug!(
            record_id = report.record_id,
            success = report.success,
            "outcome reported"
        );
        Ok(())
    }
}
