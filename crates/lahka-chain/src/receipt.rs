use serde::{Deserialize, Serialize};

/// Outcome of applying one transaction during `add_block`. Kept separate
/// from `Transaction` itself so that a contract-call result (or a deploy
/// address) never has to be written back into a field the transaction's
/// hash was computed over — that would break hash purity (SPEC_FULL.md
/// §8, invariant 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub success: bool,
    pub result: serde_json::Value,
    pub error: Option<String>,
}
