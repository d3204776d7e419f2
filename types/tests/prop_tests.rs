use proptest::prelude::*;

use valor_types::{RedeemCode, Timestamp};

fn arb_code() -> impl Strategy<Value = RedeemCode> {
    (0u32..1000, 0u32..1000, any::<bool>(), prop::option::of(0u64..10_000)).prop_map(
        |(total, used, active, expiry)| RedeemCode {
            id: 1,
            code: "CODE".into(),
            total_uses: total,
            used_count: used,
            is_active: active,
            expires_at: expiry.map(Timestamp::new),
        },
    )
}

proptest! {
    /// A redeemable code always has uses left, is active, and is unexpired.
    #[test]
    fn redeemable_implies_eligibility((code, now) in (arb_code(), 0u64..10_000)) {
        let now = Timestamp::new(now);
        if code.is_redeemable(now) {
            prop_assert!(code.is_active);
            prop_assert!(code.used_count < code.total_uses);
            if let Some(expiry) = code.expires_at {
                prop_assert!(now < expiry);
            }
        }
    }

    /// remaining_uses never underflows, even for invariant-violating inputs.
    #[test]
    fn remaining_uses_never_underflows(code in arb_code()) {
        prop_assert!(code.remaining_uses() <= code.total_uses);
    }
}
