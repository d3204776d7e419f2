//! Identity records bound to redemption codes.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Military branch organizations recognized by the verification service,
/// as (name, service identifier) pairs.
pub const MILITARY_BRANCHES: &[(&str, u32)] = &[
    ("Air Force", 4073),
    ("Army", 4074),
    ("Navy", 4075),
    ("Marines", 4076),
    ("Marine Corps", 4076),
    ("Coast Guard", 4077),
    ("Space Force", 4078),
    ("National Guard", 4079),
];

/// The organization an identity record claims membership of.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u32,
    pub name: String,
}

impl Organization {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Look up a branch by its display name.
    pub fn for_branch(name: &str) -> Option<Self> {
        MILITARY_BRANCHES
            .iter()
            .find(|(branch, _)| *branch == name)
            .map(|(branch, id)| Self::new(*id, *branch))
    }
}

/// Lifecycle status of an identity record in the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Not yet attempted (or released by a failed attempt).
    Pending,
    /// Step 1 accepted; the email confirmation loop is outstanding.
    EmailSent,
    /// Verified by the third party and committed.
    Success,
    /// Rejected by the third party.
    Failed,
}

impl RecordStatus {
    /// Terminal statuses can no longer be driven through the flow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Success | RecordStatus::Failed)
    }
}

/// A real identity held by the backing store, bound to a code for one
/// verification attempt. The verification core only ever sees a read-only
/// snapshot of this plus a one-time authorization token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    /// ISO date, `YYYY-MM-DD`.
    pub birth_date: String,
    /// ISO date, `YYYY-MM-DD`.
    pub discharge_date: String,
    pub organization: Organization,
    pub status: RecordStatus,
    /// Email address the confirmation loop was sent to, once known.
    #[serde(default)]
    pub email_used: Option<String>,
    /// Most recent failure reason, if any.
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub verified_at: Option<Timestamp>,
}

impl IdentityRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
