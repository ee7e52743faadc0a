// ─────────────────────────────────────────────────────────────────
// PROPERTY-BASED TESTS — lahka-core
//
// Verifies ledger and hashing invariants hold for arbitrary account
// addresses and amounts, not just the hand-picked cases in src/.
//
// ZERO production code changes — integration test file only.
// ─────────────────────────────────────────────────────────────────

use lahka_core::{hash_value, EntryKind, Ledger};
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = String> {
    "[a-z]{3,16}"
}

proptest! {
    /// PROPERTY: a credit followed by a debit of the same amount restores
    /// the original balance, for any starting balance and any delta that
    /// fits.
    #[test]
    fn prop_credit_then_debit_round_trips(
        addr in arb_address(),
        start in 0u128..1_000_000_000,
        delta in 0u128..1_000_000,
    ) {
        let mut ledger = Ledger::new();
        ledger.create_account(&addr, start, 0);
        ledger
            .update_balance(&addr, delta as i128, "t", 0, 0, EntryKind::CreditAmount, "credit", 0)
            .unwrap();
        ledger
            .update_balance(&addr, -(delta as i128), "t", 0, 0, EntryKind::DebitAmount, "debit", 0)
            .unwrap();
        prop_assert_eq!(ledger.get_balance(&addr), start);
    }

    /// PROPERTY: a debit can never succeed when it would take the account
    /// balance below zero.
    #[test]
    fn prop_debit_never_goes_negative(
        addr in arb_address(),
        start in 0u128..1_000,
        overdraft in 1u128..1_000,
    ) {
        let mut ledger = Ledger::new();
        ledger.create_account(&addr, start, 0);
        let amount = start + overdraft;
        let result = ledger.update_balance(
            &addr, -(amount as i128), "t", 0, 0, EntryKind::DebitAmount, "overdraft", 0,
        );
        prop_assert!(result.is_err());
        prop_assert_eq!(ledger.get_balance(&addr), start);
    }

    /// PROPERTY: total supply is conserved across an arbitrary sequence of
    /// transfers between two accounts (no value is created or destroyed).
    #[test]
    fn prop_transfers_conserve_total_supply(
        a in arb_address(),
        b in arb_address(),
        start_a in 0u128..1_000_000,
        start_b in 0u128..1_000_000,
        transfer in 0u128..500_000,
    ) {
        prop_assume!(a != b);
        let mut ledger = Ledger::new();
        ledger.create_account(&a, start_a, 0);
        ledger.create_account(&b, start_b, 0);
        let before = ledger.get_total_supply();

        let amount = transfer.min(start_a);
        ledger
            .update_balance(&a, -(amount as i128), "t", 0, 0, EntryKind::DebitAmount, "xfer", 0)
            .unwrap();
        ledger
            .update_balance(&b, amount as i128, "t", 0, 0, EntryKind::CreditAmount, "xfer", 0)
            .unwrap();

        prop_assert_eq!(ledger.get_total_supply(), before);
    }

    /// PROPERTY: hashing the same JSON value twice always yields the same
    /// digest (canonical hashing is a pure function of content).
    #[test]
    fn prop_hash_is_deterministic(
        key in "[a-z]{1,10}",
        value in 0i64..1_000_000,
    ) {
        let obj = serde_json::json!({ key: value });
        prop_assert_eq!(hash_value(&obj), hash_value(&obj));
    }

    /// PROPERTY: key order in the source object never affects the hash —
    /// canonical serialization sorts keys lexicographically.
    #[test]
    fn prop_hash_is_order_independent(
        k1 in "[a-z]{1,8}",
        v1 in 0i64..1000,
        k2 in "[a-z]{1,8}",
        v2 in 0i64..1000,
    ) {
        prop_assume!(k1 != k2);
        let a = serde_json::json!({ k1.clone(): v1, k2.clone(): v2 });
        let b = serde_json::json!({ k2: v2, k1: v1 });
        prop_assert_eq!(hash_value(&a), hash_value(&b));
    }
}
