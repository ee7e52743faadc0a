// ─────────────────────────────────────────────────────────────────
// PROPERTY-BASED TESTS — lahka-consensus
//
// Verifies PoCS score invariants hold for arbitrary validator metric
// combinations, not just the hand-picked cases in src/validator.rs.
//
// ZERO production code changes — integration test file only.
// ─────────────────────────────────────────────────────────────────

use lahka_consensus::Validator;
use proptest::prelude::*;

proptest! {
    /// PROPERTY: the PoCS score is never negative, for any reachable
    /// combination of stake/uptime/contribution/reliability/reputation
    /// inputs.
    #[test]
    fn prop_score_is_nonnegative(
        stake in 0.0f64..1_000_000.0,
        contribution_score in 0.0f64..100.0,
        uptime_secs in 0u64..10_000_000,
        blocks_attempted in 0u64..100_000,
        blocks_successful in 0u64..100_000,
        txs_processed in 0u64..10_000,
        collaboration_score in 0.0f64..100.0,
        network_health_contribution in 0.0f64..100.0,
        reliability_score in 0.0f64..100.0,
        reputation_score in 0.0f64..100.0,
        diversity_bonus in 0.0f64..100.0,
    ) {
        let mut v = Validator::new("alice", stake, 10.0, 0);
        v.contribution_score = contribution_score;
        v.total_uptime_seconds = uptime_secs;
        v.blocks_attempted = blocks_attempted;
        v.blocks_successful = blocks_successful.min(blocks_attempted.max(blocks_successful));
        v.txs_processed = txs_processed;
        v.collaboration_score = collaboration_score;
        v.network_health_contribution = network_health_contribution;
        v.reliability_score = reliability_score;
        v.reputation_score = reputation_score;
        v.diversity_bonus = diversity_bonus;

        let score = v.pocs_score(1_000_000);
        prop_assert!(score >= 0.0, "PoCS score went negative: {}", score);
    }

    /// PROPERTY: calling `pocs_score` twice within the cache window with no
    /// mutating call in between returns bit-identical results.
    #[test]
    fn prop_cache_is_stable_within_window(
        stake in 0.0f64..1_000.0,
        t0 in 0u64..1_000_000,
        delta in 0u64..4,
    ) {
        let mut v = Validator::new("alice", stake, 10.0, t0);
        let s0 = v.pocs_score(t0);
        let s1 = v.pocs_score(t0 + delta);
        prop_assert_eq!(s0, s1, "cached score must not change within the window");
    }

    /// PROPERTY: any mutating call changes `cache_version` such that the
    /// next `pocs_score` call recomputes rather than reusing a stale cache
    /// entry in the same instant (detectable via a changed collaboration
    /// score always feeding through to the output).
    #[test]
    fn prop_mutation_is_observable_in_next_score(
        stake in 0.0f64..1_000.0,
        bump in 1.0f64..100.0,
        t0 in 0u64..1_000_000,
    ) {
        let mut v = Validator::new("alice", stake, 10.0, t0);
        let s0 = v.pocs_score(t0);
        v.record_collaboration(bump);
        let s1 = v.pocs_score(t0);
        prop_assert!(s1 >= s0, "adding collaboration must not decrease the score: {} < {}", s1, s0);
    }

    /// PROPERTY: penalties never increase reputation or reliability, for
    /// any severity in the representable range.
    #[test]
    fn prop_penalty_never_increases_scores(
        severity in 0.0f64..1_000.0,
        now in 0u64..10_000_000,
    ) {
        let mut v = Validator::new("alice", 100.0, 10.0, 0);
        let rep0 = v.reputation_score;
        let rel0 = v.reliability_score;
        v.apply_penalty("generic", severity, "prop test", now);
        prop_assert!(v.reputation_score <= rep0);
        prop_assert!(v.reliability_score <= rel0);
    }
}
