//! Peer review rounds, penalty escalation, and network-condition-driven
//! weight adjustment — the governance hooks layered on top of per-validator
//! state (`Validator`).

use crate::validator::{NetworkCondition, Validator};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

pub type ValidatorMap = BTreeMap<String, Validator>;

/// Shuffles active validator addresses and pairs consecutive entries. An
/// odd validator out is left unpaired, matching SPEC_FULL.md §4.5.
pub fn assign_peer_reviews<R: Rng>(validators: &ValidatorMap, rng: &mut R) -> Vec<(String, String)> {
    let mut addrs: Vec<String> = validators
        .iter()
        .filter(|(_, v)| v.is_active)
        .map(|(addr, _)| addr.clone())
        .collect();
    shuffle(&mut addrs, rng);

    addrs
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

fn shuffle<R: Rng>(items: &mut [String], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// One submitted or synthesized peer rating.
pub struct PeerRatingSubmission {
    pub reviewer: String,
    pub reviewee: String,
    pub rating: i64,
    pub reason: String,
}

/// Applies a batch of ratings: the reviewer rates the reviewee, then the
/// reviewee's reputation score is recomputed from the updated rating set.
pub fn process_peer_ratings(validators: &mut ValidatorMap, ratings: &[PeerRatingSubmission], now: u64) {
    for r in ratings {
        let rated = validators
            .get_mut(&r.reviewer)
            .map(|reviewer| reviewer.rate_peer(&r.reviewee, r.rating, &r.reason, now));
        match rated {
            Some(Ok(())) => {
                if let Some(reviewee) = validators.get_mut(&r.reviewee) {
                    reviewee.update_reputation_score();
                }
            }
            Some(Err(e)) => debug!(reviewer = %r.reviewer, error = %e, "rejected peer rating"),
            None => debug!(reviewer = %r.reviewer, "unknown reviewer in peer review round"),
        }
    }
}

/// Runs a full peer-review round: pairs active validators, synthesizes one
/// rating per pair from the reviewee's current reliability plus uniform
/// noise (a stand-in for real submissions — SPEC_FULL.md §4.5 keeps the
/// in-engine synthesis path alongside an external REST intake), and
/// applies the batch.
pub fn trigger_peer_reviews<R: Rng>(validators: &mut ValidatorMap, rng: &mut R, now: u64) {
    let pairs = assign_peer_reviews(validators, rng);
    let mut ratings = Vec::with_capacity(pairs.len());
    for (reviewer, reviewee) in pairs {
        let base = validators
            .get(&reviewee)
            .map(|v| v.reliability_score)
            .unwrap_or(100.0);
        let noise = rng.gen_range(-10.0..=10.0);
        let rating = (base + noise).clamp(1.0, 100.0).round() as i64;
        ratings.push(PeerRatingSubmission {
            reviewer,
            reviewee,
            rating,
            reason: "periodic peer review".to_string(),
        });
    }
    process_peer_ratings(validators, &ratings, now);
}

/// Records a synthetic, community-initiated penalty-multiplier override
/// without running it through `apply_penalty`'s severity math.
pub fn community_override_penalty(
    validators: &mut ValidatorMap,
    addr: &str,
    new_multiplier: f64,
    reason: &str,
    now: u64,
) {
    if let Some(v) = validators.get_mut(addr) {
        v.penalty_history.push(crate::validator::PenaltyRecord {
            timestamp: now,
            kind: "community_override".to_string(),
            severity: new_multiplier,
            reason: reason.to_string(),
        });
        v.current_penalty_multiplier = new_multiplier.clamp(1.0, crate::MAX_PENALTY_MULTIPLIER);
    }
}

/// Fans out `adjust_dynamic_weight` over every validator using the
/// network-condition table from SPEC_FULL.md §4.5.
pub fn update_network_conditions(validators: &mut ValidatorMap, condition: NetworkCondition) {
    let factor = match condition {
        NetworkCondition::HighLoad => 1.2,
        NetworkCondition::LowLoad => 0.8,
        NetworkCondition::Normal => 1.0,
    };
    for v in validators.values_mut() {
        v.adjust_dynamic_weight(condition, factor);
    }
}
