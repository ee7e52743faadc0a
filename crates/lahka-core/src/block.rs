use crate::hash::hash_value;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const GENESIS_VALIDATOR: &str = "genesis";
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub validator: String,
    /// SHA-256 over the canonical encoding of ledger + contract store at
    /// the point this block was assembled.
    pub state_root: String,
    /// Unused by PoCS selection; retained for wire-format stability.
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
        validator: impl Into<String>,
        state_root: impl Into<String>,
        nonce: u64,
    ) -> Self {
        let mut block = Block {
            index,
            timestamp,
            transactions,
            previous_hash: previous_hash.into(),
            validator: validator.into(),
            state_root: state_root.into(),
            nonce,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn genesis(timestamp: u64, state_root: impl Into<String>) -> Self {
        Block::new(
            0,
            timestamp,
            Vec::new(),
            GENESIS_PREVIOUS_HASH,
            GENESIS_VALIDATOR,
            state_root,
            0,
        )
    }

    pub fn compute_hash(&self) -> String {
        hash_value(&self.canonical_value())
    }

    fn canonical_value(&self) -> Value {
        let txs: Vec<Value> = self
            .transactions
            .iter()
            .map(Transaction::canonical_value)
            .collect();
        json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "transactions": txs,
            "previous_hash": self.previous_hash,
            "validator": self.validator,
            "state_root": self.state_root,
            "nonce": self.nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_index_zero_and_sentinel_previous_hash() {
        let block = Block::genesis(1_700_000_000, "deadbeef");
        assert_eq!(block.index, 0);
        assert_eq!(block.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(block.validator, GENESIS_VALIDATOR);
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn hash_changes_with_transactions() {
        let empty = Block::new(1, 0, Vec::new(), "a", "v", "root", 0);
        let tx = Transaction::new(
            "a",
            "b",
            1,
            crate::TransactionKind::Transfer,
            Default::default(),
            1,
            1,
            0,
            "",
        );
        let with_tx = Block::new(1, 0, vec![tx], "a", "v", "root", 0);
        assert_ne!(empty.hash, with_tx.hash);
    }
}
