// ─────────────────────────────────────────────────────────────────
// LAHKA CORE
//
// Ledger primitives: Account, LedgerEntry, the double-entry Ledger,
// the contract key/value store, and the canonical Transaction/Block
// records that the chain engine (lahka-chain) drives.
// All financial arithmetic uses u128 atomic units (no floating-point).
// ─────────────────────────────────────────────────────────────────

pub mod account;
pub mod block;
pub mod contract;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod transaction;

pub use account::Account;
pub use block::Block;
pub use contract::{ContractEvent, ContractState, ContractStatus, ContractStore};
pub use error::{ContractError, LedgerError};
pub use hash::hash_value;
pub use ledger::{EntryKind, Ledger, LedgerEntry, STAKE_POOL};
pub use transaction::{Transaction, TransactionKind};

/// 1 token = 1_000_000 atomic units. Chosen for exact gas pricing without
/// floating point; see SPEC_FULL.md §3.
pub const ATOMIC_PER_TOKEN: u128 = 1_000_000;

/// Genesis account balance (1,000,000 tokens, in atomic units).
pub const GENESIS_BALANCE: u128 = 1_000_000 * ATOMIC_PER_TOKEN;

/// Upper bound on gas a single contract call/deploy may request.
pub const MAX_CONTRACT_GAS: u64 = 1_000_000;
