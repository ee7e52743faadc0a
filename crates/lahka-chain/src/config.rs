use lahka_core::ATOMIC_PER_TOKEN;

/// Process-wide chain parameters (SPEC_FULL.md §6). Token-denominated
/// values (`minimum_stake`, `block_reward`) are stored in atomic units;
/// `gas_price` stays a small raw atomic-unit-per-gas figure so ordinary
/// transaction fees remain negligible next to transfer amounts, mirroring
/// the teacher's `BASE_FEE_CIL` being a tiny fraction of `CIL_PER_LOS`.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub minimum_stake: u128,
    pub block_time_secs: u64,
    pub block_reward: u128,
    pub gas_price: u128,
    pub max_txs_per_block: usize,
    pub max_contract_gas: u64,
    pub peer_review_every_n_blocks: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            minimum_stake: 10 * ATOMIC_PER_TOKEN,
            block_time_secs: 5,
            block_reward: 1 * ATOMIC_PER_TOKEN,
            gas_price: 1,
            max_txs_per_block: 100,
            max_contract_gas: 1_000_000,
            peer_review_every_n_blocks: 5,
        }
    }
}
