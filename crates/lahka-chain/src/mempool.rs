use lahka_core::Transaction;
use std::collections::HashSet;

/// Ordered sequence of pending transactions. Every element is assumed to
/// have already passed `Chain::validate_transaction` at insertion time —
/// the mempool itself does no deduplication or fee-based reordering (see
/// SPEC_FULL.md §3).
#[derive(Debug, Default)]
pub struct Mempool {
    pending: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Mempool::default()
    }

    pub fn add(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Clones up to `n` transactions from the front, without removing
    /// them — used by `create_block`, which only removes transactions
    /// once they've actually been applied by `add_block`.
    pub fn peek(&self, n: usize) -> Vec<Transaction> {
        self.pending.iter().take(n).cloned().collect()
    }

    /// Drops every transaction whose hash is in `hashes`.
    pub fn remove_hashes(&mut self, hashes: &HashSet<String>) {
        self.pending.retain(|tx| !hashes.contains(&tx.hash));
    }
}
