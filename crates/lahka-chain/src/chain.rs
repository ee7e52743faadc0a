use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::mempool::Mempool;
use crate::receipt::TransactionReceipt;
use lahka_consensus::governance;
use lahka_consensus::Validator;
use lahka_core::{
    hash_value, Block, ContractStore, EntryKind, Ledger, Transaction, TransactionKind,
    ATOMIC_PER_TOKEN, GENESIS_BALANCE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

/// The state-transition engine: mempool, validator set, ledger, and
/// contract store, driven through genesis construction, transaction
/// validation/queueing, PoCS-weighted producer selection, and block
/// assembly/application (SPEC_FULL.md §4.4).
pub struct Chain {
    pub blocks: Vec<Block>,
    pub mempool: Mempool,
    pub validators: BTreeMap<String, Validator>,
    pub ledger: Ledger,
    pub contracts: ContractStore,
    pub receipts: Vec<TransactionReceipt>,
    pub config: ChainConfig,
    rng: StdRng,
}

impl Chain {
    /// `seed = None` seeds the RNG from OS entropy; pass a seed for
    /// reproducible test networks (SPEC_FULL.md §9 Open Question 3 /
    /// REDESIGN FLAGS "deterministic randomness").
    pub fn new(config: ChainConfig, seed: Option<u64>, now: u64) -> Self {
        let mut ledger = Ledger::new();
        ledger.create_account("genesis", GENESIS_BALANCE, now);
        let contracts = ContractStore::new();
        let state_root = state_root_of(&ledger, &contracts);
        let genesis = Block::genesis(now, state_root);
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Chain {
            blocks: vec![genesis],
            mempool: Mempool::new(),
            validators: BTreeMap::new(),
            ledger,
            contracts,
            receipts: Vec::new(),
            config,
            rng,
        }
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("genesis block always present")
    }

    pub fn get_balance(&self, addr: &str) -> u128 {
        self.ledger.get_balance(addr)
    }

    fn state_root(&self) -> String {
        state_root_of(&self.ledger, &self.contracts)
    }

    /// Rejects a transaction per SPEC_FULL.md §4.4's closed list of
    /// checks; does not mutate any state.
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<(), ChainError> {
        let required = tx.amount + tx.gas_price.saturating_mul(tx.gas_limit as u128);
        if self.ledger.get_balance(&tx.from) < required {
            return Err(ChainError::InvalidTransaction(format!(
                "{} has insufficient balance for amount + gas",
                tx.from
            )));
        }
        match tx.kind {
            TransactionKind::Transfer if tx.amount == 0 => {
                return Err(ChainError::InvalidTransaction(
                    "transfer amount must be > 0".into(),
                ))
            }
            TransactionKind::ContractDeploy if !tx.data.contains_key("contract_code") => {
                return Err(ChainError::InvalidTransaction(
                    "contract deploy missing contract_code".into(),
                ))
            }
            TransactionKind::ContractCall if !tx.data.contains_key("contract_address") => {
                return Err(ChainError::InvalidTransaction(
                    "contract call missing contract_address".into(),
                ))
            }
            TransactionKind::Stake if tx.amount < self.config.minimum_stake => {
                return Err(ChainError::InvalidTransaction(format!(
                    "stake {} below minimum {}",
                    tx.amount, self.config.minimum_stake
                )))
            }
            _ => {}
        }
        Ok(())
    }

    /// Validates then appends to the mempool. No deduplication or fee
    /// ordering (SPEC_FULL.md §3).
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), ChainError> {
        self.validate_transaction(&tx)?;
        self.mempool.add(tx);
        Ok(())
    }

    /// Fails if `stake` is below the minimum, or if the emitted `STAKE`
    /// transaction does not pass `add_transaction` (covers the amount
    /// itself plus its own gas, matching `examples/original_source/core.py`'s
    /// `if self.add_transaction(stake_tx): self.validators[address] = ...`).
    /// The `Validator` record is only created once that transaction is
    /// actually queued (SPEC_FULL.md §9 Open Question 2 — validator
    /// creation still isn't gated on the stake transaction mining, only
    /// on it being a valid mempool entry).
    pub fn register_validator(&mut self, addr: &str, stake: u128, now: u64) -> Result<(), ChainError> {
        if stake < self.config.minimum_stake {
            return Err(ChainError::InvalidTransaction(format!(
                "stake {stake} below minimum {}",
                self.config.minimum_stake
            )));
        }

        let stake_tx = Transaction::new(
            addr,
            lahka_core::STAKE_POOL,
            stake,
            TransactionKind::Stake,
            Default::default(),
            10,
            self.config.gas_price,
            now,
            "",
        );
        self.add_transaction(stake_tx)?;

        let stake_tokens = stake as f64 / ATOMIC_PER_TOKEN as f64;
        let min_stake_tokens = self.config.minimum_stake as f64 / ATOMIC_PER_TOKEN as f64;
        self.validators.insert(
            addr.to_string(),
            Validator::new(addr, stake_tokens, min_stake_tokens, now),
        );
        Ok(())
    }

    /// PoCS-weighted random sampling over active validators, falling back
    /// to stake-weighted sampling when every score is non-positive
    /// (SPEC_FULL.md §4.4).
    pub fn select_validator(&mut self, now: u64) -> Option<String> {
        let active: Vec<String> = self
            .validators
            .iter()
            .filter(|(_, v)| v.is_active)
            .map(|(addr, _)| addr.clone())
            .collect();
        if active.is_empty() {
            return None;
        }

        let scores: Vec<(String, f64)> = active
            .iter()
            .map(|addr| {
                let v = self.validators.get_mut(addr).expect("in active list");
                v.touch_activity(now);
                (addr.clone(), v.pocs_score(now))
            })
            .collect();
        let total: f64 = scores.iter().map(|(_, s)| s).sum();

        if total <= 0.0 {
            let stake_total: f64 = active.iter().map(|a| self.validators[a].stake).sum();
            if stake_total <= 0.0 {
                return active.last().cloned();
            }
            let r = self.rng.gen_range(0.0..stake_total);
            let mut acc = 0.0;
            for addr in &active {
                acc += self.validators[addr].stake;
                if acc >= r {
                    return Some(addr.clone());
                }
            }
            return active.last().cloned();
        }

        let r = self.rng.gen_range(0.0..total);
        let mut acc = 0.0;
        for (addr, score) in &scores {
            acc += score;
            if acc >= r {
                return Some(addr.clone());
            }
        }
        scores.last().map(|(addr, _)| addr.clone())
    }

    /// Takes up to `max_txs_per_block` mempool transactions (without
    /// removing them) and assembles an unsealed block on top of the tip.
    pub fn create_block(&self, producer: &str, now: u64) -> Block {
        let txs = self.mempool.peek(self.config.max_txs_per_block);
        let tip = self.tip();
        Block::new(
            tip.index + 1,
            now,
            txs,
            tip.hash.clone(),
            producer,
            self.state_root(),
            0,
        )
    }

    /// Validates chain-continuity invariants, applies every transaction
    /// (reverting ledger + contract-store state for any transaction that
    /// fails, per SPEC_FULL.md §4.4/§9 Open Question 4), removes applied
    /// transactions from the mempool, credits the producer, and updates
    /// its metrics. Triggers a peer-review round every
    /// `peer_review_every_n_blocks` blocks.
    pub fn add_block(&mut self, block: Block, now: u64) -> Result<(), ChainError> {
        let tip = self.tip();
        if block.index != tip.index + 1 {
            return Err(ChainError::InvalidBlock(format!(
                "expected index {}, got {}",
                tip.index + 1,
                block.index
            )));
        }
        if block.previous_hash != tip.hash {
            return Err(ChainError::InvalidBlock("previous_hash mismatch".into()));
        }
        if block.hash != block.compute_hash() {
            return Err(ChainError::InvalidBlock("hash does not match contents".into()));
        }
        if !self.validators.contains_key(&block.validator) {
            return Err(ChainError::InvalidBlock(format!(
                "unknown validator {}",
                block.validator
            )));
        }

        let mut applied = HashSet::with_capacity(block.transactions.len());
        let mut kinds_seen = HashSet::new();
        for tx in &block.transactions {
            let ledger_snapshot = self.ledger.clone();
            let contracts_snapshot = self.contracts.clone();
            match self.process_transaction(tx, block.index, now) {
                Ok(result) => {
                    self.receipts.push(TransactionReceipt {
                        tx_hash: tx.hash.clone(),
                        block_number: block.index,
                        success: true,
                        result,
                        error: None,
                    });
                }
                Err(e) => {
                    self.ledger = ledger_snapshot;
                    self.contracts = contracts_snapshot;
                    tracing::warn!(tx_hash = %tx.hash, error = %e, "transaction failed, skipping");
                    self.receipts.push(TransactionReceipt {
                        tx_hash: tx.hash.clone(),
                        block_number: block.index,
                        success: false,
                        result: Value::Null,
                        error: Some(e.to_string()),
                    });
                }
            }
            applied.insert(tx.hash.clone());
            kinds_seen.insert(tx.kind);
        }
        self.mempool.remove_hashes(&applied);

        let tx_count = block.transactions.len() as u64;
        let validator_addr = block.validator.clone();
        let block_index = block.index;
        let block_hash = block.hash.clone();
        self.blocks.push(block);

        self.ledger.update_balance(
            &validator_addr,
            self.config.block_reward as i128,
            &block_hash,
            block_index,
            now,
            EntryKind::Reward,
            "block_reward",
            0,
        )?;

        if let Some(v) = self.validators.get_mut(&validator_addr) {
            v.touch_activity(now);
            v.update_contribution_score(10.0, Some("block_validated"), now);
            let current_rtt = v.response_time_avg;
            v.update_reliability_score(true, current_rtt);
            v.total_uptime_seconds += self.config.block_time_secs;
            v.record_block_attempt(true, tx_count, now);
            v.total_rewards += self.config.block_reward;
            v.unique_transaction_types = v.unique_transaction_types.max(kinds_seen.len() as u64);
        }

        if block_index % self.config.peer_review_every_n_blocks == 0 && self.validators.len() >= 2 {
            governance::trigger_peer_reviews(&mut self.validators, &mut self.rng, now);
        }

        Ok(())
    }

    fn process_transaction(
        &mut self,
        tx: &Transaction,
        block_number: u64,
        now: u64,
    ) -> Result<Value, ChainError> {
        match tx.kind {
            TransactionKind::Transfer => {
                self.ledger.record_transaction(
                    &tx.hash,
                    block_number,
                    now,
                    &tx.from,
                    &tx.to,
                    tx.amount,
                    tx.kind,
                    "transfer",
                    tx.gas_cost(),
                )?;
                Ok(Value::Null)
            }
            TransactionKind::ContractDeploy => {
                let gas_cost = tx.gas_cost();
                self.ledger.update_balance(
                    &tx.from,
                    -(gas_cost as i128),
                    &tx.hash,
                    block_number,
                    now,
                    EntryKind::DebitGas,
                    "contract_deploy_gas",
                    gas_cost,
                )?;
                let code = tx
                    .data
                    .get("contract_code")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| ChainError::InvalidTransaction("missing contract_code".into()))?;
                let initial_state = tx
                    .data
                    .get("initial_state")
                    .and_then(|v| v.as_object())
                    .cloned()
                    .unwrap_or_default();
                match self.contracts.deploy(
                    code,
                    initial_state,
                    &tx.from,
                    tx.gas_limit,
                    now,
                    block_number,
                    &tx.hash,
                ) {
                    Ok(address) => Ok(json!({ "deployed_address": address })),
                    Err(e) => {
                        self.ledger.update_balance(
                            &tx.from,
                            gas_cost as i128,
                            &tx.hash,
                            block_number,
                            now,
                            EntryKind::GasRefund,
                            "contract_deploy_gas_refund",
                            0,
                        )?;
                        Err(e.into())
                    }
                }
            }
            TransactionKind::ContractCall => {
                let gas_cost = tx.gas_cost();
                self.ledger.update_balance(
                    &tx.from,
                    -(gas_cost as i128),
                    &tx.hash,
                    block_number,
                    now,
                    EntryKind::DebitGas,
                    "contract_call_gas",
                    gas_cost,
                )?;
                let addr = tx
                    .data
                    .get("contract_address")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| ChainError::InvalidTransaction("missing contract_address".into()))?
                    .to_string();
                let function = tx
                    .data
                    .get("function")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let args = tx.data.get("args").cloned().unwrap_or(Value::Null);
                match self
                    .contracts
                    .call(&addr, &function, &args, &tx.from, now, block_number, &tx.hash)
                {
                    Ok(result) => Ok(json!({ "result": result })),
                    Err(e) => {
                        self.ledger.update_balance(
                            &tx.from,
                            gas_cost as i128,
                            &tx.hash,
                            block_number,
                            now,
                            EntryKind::GasRefund,
                            "contract_call_gas_refund",
                            0,
                        )?;
                        Err(e.into())
                    }
                }
            }
            TransactionKind::Stake => {
                self.ledger
                    .record_stake(&tx.hash, block_number, now, &tx.from, tx.amount)?;
                Ok(Value::Null)
            }
            TransactionKind::Unstake => {
                self.ledger
                    .record_unstake(&tx.hash, block_number, now, &tx.from, tx.amount)?;
                if let Some(v) = self.validators.get_mut(&tx.from) {
                    v.stake = (v.stake - tx.amount as f64 / ATOMIC_PER_TOKEN as f64).max(0.0);
                }
                Ok(Value::Null)
            }
        }
    }

    /// Returns `false` without mutation if the mempool is empty.
    /// Producer is `"genesis"` only when the chain has exactly one block
    /// and no validators are registered yet; otherwise a PoCS-selected
    /// validator.
    pub fn mine_block(&mut self, now: u64) -> Result<bool, ChainError> {
        if self.mempool.is_empty() {
            return Ok(false);
        }
        let producer = if self.blocks.len() == 1 && self.validators.is_empty() {
            "genesis".to_string()
        } else {
            self.select_validator(now)
                .ok_or(ChainError::NoEligibleValidator)?
        };
        let block = self.create_block(&producer, now);
        self.add_block(block, now)?;
        Ok(true)
    }
}

fn state_root_of(ledger: &Ledger, contracts: &ContractStore) -> String {
    hash_value(&json!({ "ledger": ledger, "contracts": contracts }))
}
