//! Redemption codes.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// A single- or multi-use redemption code granting verification attempts.
///
/// `used_count` is mutated only by the gateway's outcome commit, only on a
/// successful verification, and is never decremented.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedeemCode {
    pub id: u64,
    /// The code string users type in (unique).
    pub code: String,
    /// How many successful verifications this code grants.
    pub total_uses: u32,
    /// How many have been consumed so far. Invariant: `used_count <= total_uses`.
    pub used_count: u32,
    /// Disabled codes are never redeemable regardless of remaining uses.
    pub is_active: bool,
    /// Optional expiry; unset codes never expire.
    pub expires_at: Option<Timestamp>,
}

impl RedeemCode {
    /// Whether the code can still grant a verification attempt at `now`.
    ///
    /// Redeemable iff active, under its use limit, and not expired.
    pub fn is_redeemable(&self, now: Timestamp) -> bool {
        self.is_active
            && self.used_count < self.total_uses
            && self.expires_at.map_or(true, |expiry| now < expiry)
    }

    /// Uses left before the code is exhausted.
    pub fn remaining_uses(&self) -> u32 {
        self.total_uses.saturating_sub(self.used_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> RedeemCode {
        RedeemCode {
            id: 1,
            code: "VALOR-2024".into(),
            total_uses: 3,
            used_count: 0,
            is_active: true,
            expires_at: None,
        }
    }

    #[test]
    fn fresh_code_is_redeemable() {
        assert!(code().is_redeemable(Timestamp::new(100)));
    }

    #[test]
    fn exhausted_code_is_not_redeemable() {
        let mut c = code();
        c.used_count = 3;
        assert!(!c.is_redeemable(Timestamp::new(100)));
        assert_eq!(c.remaining_uses(), 0);
    }

    #[test]
    fn disabled_code_is_not_redeemable() {
        let mut c = code();
        c.is_active = false;
        assert!(!c.is_redeemable(Timestamp::new(100)));
    }

    #[test]
    fn expiry_is_exclusive_at_the_boundary() {
        let mut c = code();
        c.expires_at = Some(Timestamp::new(200));
        assert!(c.is_redeemable(Timestamp::new(199)));
        assert!(!c.is_redeemable(Timestamp::new(200)));
        assert!(!c.is_redeemable(Timestamp::new(201)));
    }
}
