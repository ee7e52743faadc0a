use crate::error::ConsensusError;
use crate::{MAX_PENALTY_MULTIPLIER, PENALTY_WINDOW_DAYS, POCS_CACHE_SECONDS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRating {
    pub rating: i64,
    pub timestamp: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionActivity {
    pub timestamp: u64,
    pub kind: String,
    pub credits: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub timestamp: u64,
    pub kind: String,
    pub severity: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCondition {
    HighLoad,
    LowLoad,
    Normal,
}

/// Per-validator metric bundle and the cached PoCS score derived from it.
/// Fields are grouped by role to mirror SPEC_FULL.md §4.3; every mutating
/// method bumps `cache_version` so [`Validator::pocs_score`] never reads
/// a value that's gone stale from an input change (the wall-clock 5s
/// window is checked independently, see `pocs_score`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,

    // Stake
    pub stake: f64,
    pub minimum_stake: f64,
    pub is_active: bool,

    // Activity
    pub registered_at: u64,
    pub last_activity: u64,
    pub last_seen: u64,
    pub total_uptime_seconds: u64,

    // Block work
    pub blocks_attempted: u64,
    pub blocks_successful: u64,
    pub txs_processed: u64,
    pub unique_transaction_types: u64,
    pub blocks_validated: u64,
    pub last_block_time: u64,
    pub total_rewards: u128,

    // Quality
    pub reliability_score: f64,
    pub response_time_avg: f64,
    pub uptime_percentage: f64,

    // Reputation
    pub peer_ratings: BTreeMap<String, PeerRating>,
    pub average_peer_rating: f64,
    pub reputation_score: f64,
    pub last_peer_review: u64,

    // Contribution
    pub contribution_score: f64,
    pub contribution_credits: f64,
    pub contribution_activities: Vec<ContributionActivity>,

    // Penalties
    pub penalty_history: Vec<PenaltyRecord>,
    pub current_penalty_multiplier: f64,
    pub rehabilitation_progress: f64,

    // Network health
    pub collaboration_score: f64,
    pub network_health_contribution: f64,
    pub dynamic_weight_adjustment: f64,
    pub diversity_bonus: f64,

    // Cache
    cache_version: u64,
    cached: Option<(u64, u64, f64)>,
}

impl Validator {
    pub fn new(address: impl Into<String>, stake: f64, minimum_stake: f64, now: u64) -> Self {
        Validator {
            address: address.into(),
            stake,
            minimum_stake,
            is_active: true,
            registered_at: now,
            last_activity: now,
            last_seen: now,
            total_uptime_seconds: 0,
            blocks_attempted: 0,
            blocks_successful: 0,
            txs_processed: 0,
            unique_transaction_types: 0,
            blocks_validated: 0,
            last_block_time: 0,
            total_rewards: 0,
            reliability_score: 100.0,
            response_time_avg: 0.0,
            uptime_percentage: 0.0,
            peer_ratings: BTreeMap::new(),
            average_peer_rating: 100.0,
            reputation_score: 100.0,
            last_peer_review: 0,
            contribution_score: 0.0,
            contribution_credits: 0.0,
            contribution_activities: Vec::new(),
            penalty_history: Vec::new(),
            current_penalty_multiplier: 1.0,
            rehabilitation_progress: 0.0,
            collaboration_score: 0.0,
            network_health_contribution: 0.0,
            dynamic_weight_adjustment: 1.0,
            diversity_bonus: 0.0,
            cache_version: 0,
            cached: None,
        }
    }

    fn invalidate_cache(&mut self) {
        self.cache_version += 1;
    }

    /// The central PoCS formula (SPEC_FULL.md §4.3); cached for
    /// [`POCS_CACHE_SECONDS`] as long as no mutating call has happened
    /// since.
    pub fn pocs_score(&mut self, now: u64) -> f64 {
        if let Some((version, calculated_at, score)) = self.cached {
            if version == self.cache_version && now.saturating_sub(calculated_at) < POCS_CACHE_SECONDS
            {
                return score;
            }
        }

        let days_inactive = now.saturating_sub(self.last_activity) as f64 / 86_400.0;
        let effective_stake = self.stake * (0.1_f64).max(1.0 - 0.001 * days_inactive);

        let elapsed = now.saturating_sub(self.registered_at).max(1) as f64;
        let uptime_factor = (self.total_uptime_seconds as f64 / elapsed).min(1.0);
        let block_success =
            self.blocks_successful as f64 / (self.blocks_attempted.max(1) as f64);
        let txs_factor = (self.txs_processed as f64 / 100.0).min(1.0);

        let stake_comp = effective_stake * 0.35 * self.dynamic_weight_adjustment;
        let contribution_comp = (self.contribution_score * 0.2
            + uptime_factor * 10.0
            + block_success * 10.0
            + txs_factor * 10.0
            + self.collaboration_score * 5.0
            + self.network_health_contribution * 3.0)
            * 0.25;
        let reliability_comp = self.reliability_score * 0.2;
        let reputation_comp = self.reputation_score * 0.1;
        let diversity_comp = self.diversity_bonus * 0.1;

        let score = (stake_comp + contribution_comp + reliability_comp + reputation_comp + diversity_comp)
            .max(0.0);

        self.cached = Some((self.cache_version, now, score));
        score
    }

    pub fn touch_activity(&mut self, now: u64) {
        self.last_activity = now;
        self.last_seen = now;
        self.invalidate_cache();
    }

    pub fn update_contribution_score(&mut self, inc: f64, event: Option<&str>, now: u64) {
        self.contribution_score = 0.9 * self.contribution_score + 0.1 * inc;
        self.contribution_activities.push(ContributionActivity {
            timestamp: now,
            kind: event.unwrap_or("contribution").to_string(),
            credits: inc,
            description: event.unwrap_or_default().to_string(),
        });
        self.invalidate_cache();
    }

    pub fn update_reliability_score(&mut self, success: bool, rtt: f64) {
        self.response_time_avg = 0.9 * self.response_time_avg + 0.1 * rtt;
        self.reliability_score = if success {
            (self.reliability_score + 1.0).min(100.0)
        } else {
            (self.reliability_score - 5.0).max(0.0)
        };
        self.invalidate_cache();
    }

    pub fn rate_peer(
        &mut self,
        addr: &str,
        rating: i64,
        reason: &str,
        now: u64,
    ) -> Result<(), ConsensusError> {
        if !(1..=100).contains(&rating) {
            return Err(ConsensusError::InvalidRating(rating));
        }
        self.peer_ratings.insert(
            addr.to_string(),
            PeerRating {
                rating,
                timestamp: now,
                reason: reason.to_string(),
            },
        );
        self.invalidate_cache();
        Ok(())
    }

    pub fn update_reputation_score(&mut self) {
        self.average_peer_rating = if self.peer_ratings.is_empty() {
            100.0
        } else {
            self.peer_ratings.values().map(|r| r.rating as f64).sum::<f64>()
                / self.peer_ratings.len() as f64
        };
        self.reputation_score = 0.4 * self.average_peer_rating
            + 0.3 * self.reliability_score
            + 0.3 * self.contribution_score.min(100.0);
        self.invalidate_cache();
    }

    /// Never increases `reputation_score` or `reliability_score` (the
    /// invariant SPEC_FULL.md §8 property 7 requires).
    pub fn apply_penalty(&mut self, kind: &str, severity: f64, reason: &str, now: u64) {
        self.penalty_history.push(PenaltyRecord {
            timestamp: now,
            kind: kind.to_string(),
            severity,
            reason: reason.to_string(),
        });

        let recent = self.penalties_in_window(now, PENALTY_WINDOW_DAYS);
        self.current_penalty_multiplier = MAX_PENALTY_MULTIPLIER.min(1.0 + 0.5 * recent as f64);
        let effective = severity * self.current_penalty_multiplier;

        self.reputation_score = (self.reputation_score - 0.5 * effective).max(0.0);
        self.reliability_score = (self.reliability_score - 0.3 * effective).max(0.0);
        self.rehabilitation_progress = 0.0;
        self.invalidate_cache();
    }

    fn penalties_in_window(&self, now: u64, window_days: i64) -> usize {
        let window_secs = (window_days.max(0) as u64) * 86_400;
        self.penalty_history
            .iter()
            .filter(|p| now.saturating_sub(p.timestamp) <= window_secs)
            .count()
    }

    pub fn update_rehabilitation_progress(&mut self, inc: f64) {
        self.rehabilitation_progress = (self.rehabilitation_progress + inc).min(100.0);
        if self.rehabilitation_progress >= 100.0 {
            self.current_penalty_multiplier = (self.current_penalty_multiplier * 0.8).max(1.0);
            self.rehabilitation_progress = 0.0;
        }
        self.invalidate_cache();
    }

    pub fn earn_contribution_credits(
        &mut self,
        kind: &str,
        credits: f64,
        description: &str,
        now: u64,
    ) {
        self.contribution_credits += credits;
        self.contribution_activities.push(ContributionActivity {
            timestamp: now,
            kind: kind.to_string(),
            credits,
            description: description.to_string(),
        });
        self.update_rehabilitation_progress(0.1 * credits);
        self.update_contribution_score(0.5 * credits, Some(kind), now);
    }

    /// Returns the amount of stake actually gained (`0.1 * min(credits,
    /// available)`), decrementing `contribution_credits` by the consumed
    /// amount.
    pub fn convert_credits_to_stake(&mut self, credits: f64) -> f64 {
        let used = credits.min(self.contribution_credits).max(0.0);
        let gained_stake = 0.1 * used;
        self.stake += gained_stake;
        self.contribution_credits -= used;
        self.invalidate_cache();
        gained_stake
    }

    pub fn adjust_dynamic_weight(&mut self, condition: NetworkCondition, factor: f64) {
        self.dynamic_weight_adjustment = match condition {
            NetworkCondition::HighLoad => (self.dynamic_weight_adjustment * factor).min(1.5),
            NetworkCondition::LowLoad => (self.dynamic_weight_adjustment * factor).max(0.5),
            NetworkCondition::Normal => 1.0,
        };
        self.invalidate_cache();
    }

    pub fn record_block_attempt(&mut self, success: bool, tx_count: u64, now: u64) {
        self.blocks_attempted += 1;
        if success {
            self.blocks_successful += 1;
            self.blocks_validated += 1;
        }
        self.txs_processed += tx_count;
        self.last_block_time = now;
        self.invalidate_cache();
    }

    pub fn record_collaboration(&mut self, inc: f64) {
        self.collaboration_score = (self.collaboration_score + inc).min(100.0);
        self.invalidate_cache();
    }

    pub fn record_network_health_contribution(&mut self, inc: f64) {
        self.network_health_contribution = (self.network_health_contribution + inc).min(100.0);
        self.invalidate_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_validator_has_nonnegative_score() {
        let mut v = Validator::new("alice", 100.0, 10.0, 1_000);
        assert!(v.pocs_score(1_000) >= 0.0);
    }

    #[test]
    fn score_is_cached_within_window() {
        let mut v = Validator::new("alice", 100.0, 10.0, 1_000);
        let s0 = v.pocs_score(1_000);
        // mutate underlying clock only, no state change: should stay cached
        let s1 = v.pocs_score(1_002);
        assert_eq!(s0, s1);
    }

    #[test]
    fn mutation_invalidates_cache() {
        let mut v = Validator::new("alice", 100.0, 10.0, 1_000);
        let s0 = v.pocs_score(1_000);
        v.record_collaboration(50.0);
        let s1 = v.pocs_score(1_000);
        assert_ne!(s0, s1);
    }

    #[test]
    fn score_decays_over_ten_days_of_inactivity() {
        let mut v = Validator::new("alice", 100.0, 10.0, 0);
        let s0 = v.pocs_score(0);
        let mut v2 = v.clone();
        let s10 = v2.pocs_score(10 * 86_400);
        assert!(s10 < s0);
        assert!(s10 > 0.0);
    }

    #[test]
    fn apply_penalty_never_increases_scores() {
        let mut v = Validator::new("alice", 100.0, 10.0, 0);
        let rep0 = v.reputation_score;
        let rel0 = v.reliability_score;
        v.apply_penalty("x", 10.0, "", 0);
        assert!(v.reputation_score <= rep0);
        assert!(v.reliability_score <= rel0);
    }

    #[test]
    fn penalty_multiplier_escalates_then_caps() {
        let mut v = Validator::new("alice", 100.0, 10.0, 0);
        v.apply_penalty("x", 10.0, "", 0);
        v.apply_penalty("x", 10.0, "", 10);
        v.apply_penalty("x", 10.0, "", 20);
        assert_eq!(v.current_penalty_multiplier, 2.5);
    }

    #[test]
    fn rate_peer_rejects_out_of_range() {
        let mut v = Validator::new("alice", 100.0, 10.0, 0);
        assert!(matches!(v.rate_peer("bob", 0, "", 0), Err(ConsensusError::InvalidRating(0))));
        assert!(matches!(v.rate_peer("bob", 101, "", 0), Err(ConsensusError::InvalidRating(101))));
        assert!(v.rate_peer("bob", 80, "", 0).is_ok());
    }

    #[test]
    fn convert_credits_to_stake_conserves() {
        let mut v = Validator::new("alice", 100.0, 10.0, 0);
        v.contribution_credits = 50.0;
        let gained = v.convert_credits_to_stake(30.0);
        assert_eq!(gained, 3.0);
        assert_eq!(v.contribution_credits, 20.0);
        assert_eq!(v.stake, 103.0);
    }
}
