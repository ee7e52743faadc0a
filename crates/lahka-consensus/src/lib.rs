// ─────────────────────────────────────────────────────────────────
// LAHKA CONSENSUS
//
// Proof-of-Contribution-Stake: per-validator metric bundle, the PoCS
// scoring formula, and the governance hooks (peer review, penalties,
// network-condition weighting) that feed it.
// ─────────────────────────────────────────────────────────────────

pub mod error;
pub mod governance;
pub mod validator;

pub use error::ConsensusError;
pub use validator::Validator;

/// Cap on `current_penalty_multiplier`.
pub const MAX_PENALTY_MULTIPLIER: f64 = 5.0;
/// Window used when counting "penalties in the last N days" for the
/// escalating multiplier.
pub const PENALTY_WINDOW_DAYS: i64 = 30;
/// PoCS score cache lifetime.
pub const POCS_CACHE_SECONDS: u64 = 5;
