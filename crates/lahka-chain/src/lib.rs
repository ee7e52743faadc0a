// ─────────────────────────────────────────────────────────────────
// LAHKA CHAIN
//
// The chain engine: mempool, PoCS-weighted validator selection, block
// assembly and state-transition application on top of lahka-core's
// ledger/contract-store primitives and lahka-consensus's validator
// scoring.
// ─────────────────────────────────────────────────────────────────

pub mod chain;
pub mod config;
pub mod error;
pub mod mempool;
pub mod receipt;

pub use chain::Chain;
pub use config::ChainConfig;
pub use error::ChainError;
pub use mempool::Mempool;
pub use receipt::TransactionReceipt;
