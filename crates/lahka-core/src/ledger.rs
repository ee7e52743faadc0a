use crate::account::Account;
use crate::error::LedgerError;
use crate::transaction::TransactionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag distinguishing the role a [`LedgerEntry`] plays within one
/// transaction's double-entry bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    DebitAmount,
    CreditAmount,
    DebitGas,
    GasRefund,
    Reward,
    Genesis,
    Stake,
    Unstake,
}

impl EntryKind {
    pub fn description(&self) -> &'static str {
        match self {
            EntryKind::DebitAmount => "debit_amount",
            EntryKind::CreditAmount => "credit_amount",
            EntryKind::DebitGas => "debit_gas",
            EntryKind::GasRefund => "gas_refund",
            EntryKind::Reward => "block_reward",
            EntryKind::Genesis => "genesis_allocation",
            EntryKind::Stake => "stake",
            EntryKind::Unstake => "unstake",
        }
    }
}

/// Sentinel ledger address stake/unstake entries are recorded against.
pub const STAKE_POOL: &str = "stake_pool";

/// Immutable record of one balance delta. Appended to the global log and
/// to the affected account's per-account log; never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub tx_hash: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub kind: EntryKind,
    pub description: String,
    pub gas_cost: u128,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub accounts: BTreeMap<String, Account>,
    /// Append-only global entry log, in creation order.
    pub entries: Vec<LedgerEntry>,
    /// Per-account index: entry ids in creation order.
    account_history: BTreeMap<String, Vec<u64>>,
    next_entry_id: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Idempotent: returns the existing account if `addr` is already known.
    pub fn create_account(&mut self, addr: &str, initial: u128, now: u64) -> &Account {
        self.accounts
            .entry(addr.to_string())
            .or_insert_with(|| Account::new(addr, initial, now));
        self.accounts.get(addr).expect("just inserted")
    }

    pub fn get_balance(&self, addr: &str) -> u128 {
        self.accounts.get(addr).map(|a| a.balance).unwrap_or(0)
    }

    pub fn get_account(&self, addr: &str) -> Option<&Account> {
        self.accounts.get(addr)
    }

    /// Applies `delta` to `addr`'s balance (creating the account on demand),
    /// appends one [`LedgerEntry`], and updates `last_updated`.
    ///
    /// Per SPEC_FULL.md §9 (Open Question 1), balances are not allowed to
    /// go below zero: a debit larger than the available balance is
    /// rejected rather than silently underflowing.
    #[allow(clippy::too_many_arguments)]
    pub fn update_balance(
        &mut self,
        addr: &str,
        delta: i128,
        tx_hash: &str,
        block_number: u64,
        now: u64,
        kind: EntryKind,
        description: impl Into<String>,
        gas_cost: u128,
    ) -> Result<(), LedgerError> {
        let (from, to) = if delta < 0 {
            (addr.to_string(), String::new())
        } else {
            (String::new(), addr.to_string())
        };
        self.apply_and_log(
            addr,
            delta,
            tx_hash,
            block_number,
            now,
            kind,
            from,
            to,
            description,
            gas_cost,
        )
    }

    /// Debits `from` by `amount` and logs a single entry naming
    /// [`STAKE_POOL`] as the counterparty, as SPEC_FULL.md §4.4 describes
    /// for the `STAKE` transaction kind.
    pub fn record_stake(
        &mut self,
        tx_hash: &str,
        block_number: u64,
        now: u64,
        from: &str,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.apply_and_log(
            from,
            -(amount as i128),
            tx_hash,
            block_number,
            now,
            EntryKind::Stake,
            from.to_string(),
            STAKE_POOL.to_string(),
            "stake",
            0,
        )
    }

    /// Credits `to` by `amount` from the stake pool sentinel, the inverse
    /// of [`Ledger::record_stake`] for the `UNSTAKE` transaction kind
    /// (SPEC_FULL.md §4.4, an operation reserved but unimplemented in the
    /// source this spec was distilled from).
    pub fn record_unstake(
        &mut self,
        tx_hash: &str,
        block_number: u64,
        now: u64,
        to: &str,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.apply_and_log(
            to,
            amount as i128,
            tx_hash,
            block_number,
            now,
            EntryKind::Unstake,
            STAKE_POOL.to_string(),
            to.to_string(),
            "unstake",
            0,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_and_log(
        &mut self,
        addr: &str,
        delta: i128,
        tx_hash: &str,
        block_number: u64,
        now: u64,
        kind: EntryKind,
        from: String,
        to: String,
        description: impl Into<String>,
        gas_cost: u128,
    ) -> Result<(), LedgerError> {
        self.create_account(addr, 0, now);
        let account = self.accounts.get_mut(addr).expect("just created");

        if delta < 0 {
            let debit = delta.unsigned_abs();
            if account.balance < debit {
                return Err(LedgerError::InsufficientBalance {
                    address: addr.to_string(),
                    available: account.balance,
                    required: debit,
                });
            }
            account.balance -= debit;
        } else {
            account.balance += delta as u128;
        }
        account.last_updated = now;

        let id = self.next_entry_id;
        self.next_entry_id += 1;
        let entry = LedgerEntry {
            id,
            tx_hash: tx_hash.to_string(),
            block_number,
            timestamp: now,
            from,
            to,
            amount: delta.unsigned_abs(),
            kind,
            description: description.into(),
            gas_cost,
        };
        self.entries.push(entry);
        self.account_history
            .entry(addr.to_string())
            .or_default()
            .push(id);
        Ok(())
    }

    /// Double-entry bookkeeping for one transaction: debit `from` by
    /// `amount`, credit `to` by `amount`, then separately debit `from` by
    /// `gas_cost`. Entries are appended in that stable order.
    #[allow(clippy::too_many_arguments)]
    pub fn record_transaction(
        &mut self,
        tx_hash: &str,
        block_number: u64,
        now: u64,
        from: &str,
        to: &str,
        amount: u128,
        _kind: TransactionKind,
        description: &str,
        gas_cost: u128,
    ) -> Result<(), LedgerError> {
        if !from.is_empty() && amount > 0 {
            self.update_balance(
                from,
                -(amount as i128),
                tx_hash,
                block_number,
                now,
                EntryKind::DebitAmount,
                description,
                0,
            )?;
        }
        if !to.is_empty() && amount > 0 {
            self.update_balance(
                to,
                amount as i128,
                tx_hash,
                block_number,
                now,
                EntryKind::CreditAmount,
                description,
                0,
            )?;
        }
        if gas_cost > 0 {
            self.update_balance(
                from,
                -(gas_cost as i128),
                tx_hash,
                block_number,
                now,
                EntryKind::DebitGas,
                description,
                gas_cost,
            )?;
        }
        Ok(())
    }

    pub fn get_account_history(&self, addr: &str, limit: usize) -> Vec<LedgerEntry> {
        let Some(ids) = self.account_history.get(addr) else {
            return Vec::new();
        };
        ids.iter()
            .rev()
            .take(limit)
            .filter_map(|id| self.entries.get(*id as usize).cloned())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    pub fn get_total_supply(&self) -> u128 {
        self.accounts.values().map(|a| a.balance).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_account_is_idempotent() {
        let mut ledger = Ledger::new();
        ledger.create_account("alice", 100, 1);
        ledger.create_account("alice", 999, 2);
        assert_eq!(ledger.get_balance("alice"), 100);
    }

    #[test]
    fn record_transaction_writes_three_entries_in_order() {
        let mut ledger = Ledger::new();
        ledger.create_account("alice", 1_000, 1);
        ledger
            .record_transaction(
                "txhash",
                1,
                2,
                "alice",
                "bob",
                100,
                TransactionKind::Transfer,
                "transfer",
                5,
            )
            .unwrap();

        assert_eq!(ledger.get_balance("alice"), 1_000 - 100 - 5);
        assert_eq!(ledger.get_balance("bob"), 100);
        assert_eq!(ledger.entries.len(), 3);
        assert_eq!(ledger.entries[0].kind, EntryKind::DebitAmount);
        assert_eq!(ledger.entries[1].kind, EntryKind::CreditAmount);
        assert_eq!(ledger.entries[2].kind, EntryKind::DebitGas);
    }

    #[test]
    fn update_balance_rejects_overdraft() {
        let mut ledger = Ledger::new();
        ledger.create_account("alice", 10, 1);
        let err = ledger
            .update_balance(
                "alice",
                -100,
                "tx",
                1,
                2,
                EntryKind::DebitAmount,
                "overdraft",
                0,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.get_balance("alice"), 10);
    }

    #[test]
    fn stake_then_unstake_round_trips_through_pool() {
        let mut ledger = Ledger::new();
        ledger.create_account("alice", 1_000, 1);
        ledger.record_stake("tx1", 1, 2, "alice", 100).unwrap();
        assert_eq!(ledger.get_balance("alice"), 900);
        assert_eq!(ledger.entries.last().unwrap().to, STAKE_POOL);

        ledger.record_unstake("tx2", 2, 3, "alice", 40).unwrap();
        assert_eq!(ledger.get_balance("alice"), 940);
        assert_eq!(ledger.entries.last().unwrap().from, STAKE_POOL);
    }

    #[test]
    fn history_is_most_recent_first_bounded_by_limit() {
        let mut ledger = Ledger::new();
        ledger.create_account("alice", 1_000, 1);
        for i in 0..5 {
            ledger
                .update_balance(
                    "alice",
                    -1,
                    &format!("tx{i}"),
                    i,
                    i,
                    EntryKind::DebitAmount,
                    "spend",
                    0,
                )
                .unwrap();
        }
        let history = ledger.get_account_history("alice", 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].tx_hash, "tx3");
        assert_eq!(history[1].tx_hash, "tx4");
    }
}
