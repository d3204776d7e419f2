//! In-memory gateway — the reference implementation of the eligibility and
//! commit rules, used by the state-machine tests and anything that needs a
//! gateway without a backend.

use crate::{AuthToken, BoundRecord, GatewayError, OutcomeReport, RecordGateway};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use valor_types::{IdentityRecord, RecordStatus, RedeemCode, Timestamp};

struct TokenGrant {
    record_id: u64,
    code_id: u64,
    consumed: bool,
}

struct Inner {
    codes: HashMap<String, RedeemCode>,
    records: Vec<IdentityRecord>,
    grants: HashMap<String, TokenGrant>,
    /// Non-replay commits that actually mutated state (for assertions).
    commits: u32,
}

/// Thread-safe in-memory record store + code registry.
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                codes: HashMap::new(),
                records: Vec::new(),
                grants: HashMap::new(),
                commits: 0,
            }),
        }
    }

    pub fn add_code(&self, code: RedeemCode) {
        let mut inner = self.inner.lock().unwrap();
        inner.codes.insert(code.code.clone(), code);
    }

    pub fn add_record(&self, record: IdentityRecord) {
        self.inner.lock().unwrap().records.push(record);
    }

    /// Snapshot of a code row (for assertions).
    pub fn code(&self, code: &str) -> Option<RedeemCode> {
        self.inner.lock().unwrap().codes.get(code).cloned()
    }

    /// Snapshot of a record row (for assertions).
    pub fn record(&self, id: u64) -> Option<IdentityRecord> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// How many reports actually mutated state (replays excluded).
    pub fn commit_count(&self) -> u32 {
        self.inner.lock().unwrap().commits
    }

    fn mint_token() -> AuthToken {
        let bytes: [u8; 16] = rand::thread_rng().gen();
        AuthToken(hex::encode(bytes))
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn fetch_bound_record(&self, code: &str) -> Result<BoundRecord, GatewayError> {
        let mut inner = self.inner.lock().unwrap();

        let code_row = inner
            .codes
            .get(code)
            .ok_or_else(|| GatewayError::CodeInvalid("unknown code".into()))?;
        if !code_row.is_active {
            return Err(GatewayError::CodeInvalid("code is disabled".into()));
        }
        if code_row.used_count >= code_row.total_uses {
            return Err(GatewayError::CodeInvalid("code has no uses left".into()));
        }
        if !code_row.is_redeemable(Timestamp::now()) {
            return Err(GatewayError::CodeInvalid("code has expired".into()));
        }
        let code_id = code_row.id;

        let record = inner
            .records
            .iter()
            .find(|r| r.status == RecordStatus::Pending)
            .cloned()
            .ok_or_else(|| {
                GatewayError::RecordExhausted("no pending identity records".into())
            })?;

        let token = Self::mint_token();
        inner.grants.insert(
            token.0.clone(),
            TokenGrant {
                record_id: record.id,
                code_id,
                consumed: false,
            },
        );

        Ok(BoundRecord {
            record,
            code_id,
            token,
        })
    }

    async fn report_outcome(&self, report: &OutcomeReport) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().unwrap();

        let grant = inner.grants.get(&report.token.0).ok_or_else(|| {
            GatewayError::RequestFailed("unknown authorization token".into())
        })?;
        if grant.record_id != report.record_id || grant.code_id != report.code_id {
            return Err(GatewayError::RequestFailed(
                "authorization token does not match the report".into(),
            ));
        }
        if grant.consumed {
            // Idempotent replay: ack without touching anything.
            return Ok(());
        }

        let record_id = grant.record_id;
        let code_id = grant.code_id;
        if let Some(grant) = inner.grants.get_mut(&report.token.0) {
            grant.consumed = true;
        }

        if let Some(record) = inner.records.iter_mut().find(|r| r.id == record_id) {
            if report.success {
                record.status = RecordStatus::Success;
                record.email_used = Some(report.email.clone());
                record.verified_at = Some(Timestamp::now());
                record.error_message = None;
            } else {
                record.status = RecordStatus::Pending;
                record.error_message = report.error_message.clone();
            }
        }

        if report.success {
            if let Some(code) = inner.codes.values_mut().find(|c| c.id == code_id) {
                if code.used_count < code.total_uses {
                    code.used_count += 1;
                }
            }
        }

        inner.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valor_types::Organization;

    fn seeded() -> MemoryGateway {
        let gw = MemoryGateway::new();
        gw.add_code(RedeemCode {
            id: 1,
            code: "ALPHA".into(),
            total_uses: 2,
            used_count: 0,
            is_active: true,
            expires_at: None,
        });
        gw.add_record(IdentityRecord {
            id: 10,
            first_name: "Dana".into(),
            last_name: "Reyes".into(),
            birth_date: "1970-01-02".into(),
            discharge_date: "1995-06-30".into(),
            organization: Organization::new(4074, "Army"),
            status: RecordStatus::Pending,
            email_used: None,
            error_message: None,
            verified_at: None,
        });
        gw
    }

    fn report(bound: &BoundRecord, success: bool) -> OutcomeReport {
        OutcomeReport {
            record_id: bound.record.id,
            code_id: bound.code_id,
            success,
            email: "dana@example.com".into(),
            token: bound.token.clone(),
            error_message: (!success).then(|| "rejected".to_string()),
        }
    }

    #[tokio::test]
    async fn fetch_does_not_mutate() {
        let gw = seeded();
        let a = gw.fetch_bound_record("ALPHA").await.unwrap();
        let b = gw.fetch_bound_record("ALPHA").await.unwrap();
        // Two reads, two distinct tokens, zero consumption.
        assert_ne!(a.token, b.token);
        assert_eq!(gw.code("ALPHA").unwrap().used_count, 0);
        assert_eq!(gw.record(10).unwrap().status, RecordStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_disabled_exhausted_and_expired_codes_fail() {
        let gw = seeded();
        assert!(matches!(
            gw.fetch_bound_record("NOPE").await,
            Err(GatewayError::CodeInvalid(_))
        ));

        gw.add_code(RedeemCode {
            id: 2,
            code: "OFF".into(),
            total_uses: 1,
            used_count: 0,
            is_active: false,
            expires_at: None,
        });
        assert!(matches!(
            gw.fetch_bound_record("OFF").await,
            Err(GatewayError::CodeInvalid(_))
        ));

        gw.add_code(RedeemCode {
            id: 3,
            code: "SPENT".into(),
            total_uses: 1,
            used_count: 1,
            is_active: true,
            expires_at: None,
        });
        assert!(matches!(
            gw.fetch_bound_record("SPENT").await,
            Err(GatewayError::CodeInvalid(_))
        ));

        gw.add_code(RedeemCode {
            id: 4,
            code: "OLD".into(),
            total_uses: 1,
            used_count: 0,
            is_active: true,
            expires_at: Some(Timestamp::new(1)),
        });
        assert!(matches!(
            gw.fetch_bound_record("OLD").await,
            Err(GatewayError::CodeInvalid(_))
        ));
    }

    #[tokio::test]
    async fn no_pending_record_is_exhausted() {
        let gw = MemoryGateway::new();
        gw.add_code(RedeemCode {
            id: 1,
            code: "ALPHA".into(),
            total_uses: 1,
            used_count: 0,
            is_active: true,
            expires_at: None,
        });
        assert!(matches!(
            gw.fetch_bound_record("ALPHA").await,
            Err(GatewayError::RecordExhausted(_))
        ));
    }

    #[tokio::test]
    async fn success_commit_consumes_one_use() {
        let gw = seeded();
        let bound = gw.fetch_bound_record("ALPHA").await.unwrap();
        gw.report_outcome(&report(&bound, true)).await.unwrap();

        let code = gw.code("ALPHA").unwrap();
        assert_eq!(code.used_count, 1);
        let record = gw.record(10).unwrap();
        assert_eq!(record.status, RecordStatus::Success);
        assert_eq!(record.email_used.as_deref(), Some("dana@example.com"));
        assert!(record.verified_at.is_some());
    }

    #[tokio::test]
    async fn replayed_report_is_a_noop() {
        let gw = seeded();
        let bound = gw.fetch_bound_record("ALPHA").await.unwrap();
        let r = report(&bound, true);

        gw.report_outcome(&r).await.unwrap();
        gw.report_outcome(&r).await.unwrap();

        assert_eq!(gw.code("ALPHA").unwrap().used_count, 1);
        assert_eq!(gw.commit_count(), 1);
    }

    #[tokio::test]
    async fn failure_report_releases_the_record() {
        let gw = seeded();
        let bound = gw.fetch_bound_record("ALPHA").await.unwrap();
        gw.report_outcome(&report(&bound, false)).await.unwrap();

        assert_eq!(gw.code("ALPHA").unwrap().used_count, 0);
        let record = gw.record(10).unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.error_message.as_deref(), Some("rejected"));
    }

    #[tokio::test]
    async fn mismatched_token_is_rejected() {
        let gw = seeded();
        let bound = gw.fetch_bound_record("ALPHA").await.unwrap();
        let mut r = report(&bound, true);
        r.token = AuthToken("forged".into());
        assert!(matches!(
            gw.report_outcome(&r).await,
            Err(GatewayError::RequestFailed(_))
        ));
    }
}
