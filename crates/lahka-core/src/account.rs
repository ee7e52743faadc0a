use serde::{Deserialize, Serialize};

/// An owned balance in the ledger. Created lazily on first reference and
/// never destroyed — there is no account-deletion operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: String,
    pub balance: u128,
    /// Monotonic counter, currently unused by transaction validation.
    pub nonce: u64,
    pub created_at: u64,
    pub last_updated: u64,
    pub is_contract: bool,
}

impl Account {
    pub fn new(address: impl Into<String>, balance: u128, now: u64) -> Self {
        Account {
            address: address.into(),
            balance,
            nonce: 0,
            created_at: now,
            last_updated: now,
            is_contract: false,
        }
    }
}
