use crate::hash::hash_value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Transfer,
    ContractDeploy,
    ContractCall,
    Stake,
    Unstake,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Transfer => "TRANSFER",
            TransactionKind::ContractDeploy => "CONTRACT_DEPLOY",
            TransactionKind::ContractCall => "CONTRACT_CALL",
            TransactionKind::Stake => "STAKE",
            TransactionKind::Unstake => "UNSTAKE",
        }
    }
}

/// A single ledger-mutating intent. `hash` is a pure function of every
/// other field — see [`Transaction::compute_hash`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub kind: TransactionKind,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub timestamp: u64,
    #[serde(default)]
    pub signature: String,
    pub hash: String,
}

impl Transaction {
    /// Builds a transaction and fills in its content hash.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: u128,
        kind: TransactionKind,
        data: Map<String, Value>,
        gas_limit: u64,
        gas_price: u128,
        timestamp: u64,
        signature: impl Into<String>,
    ) -> Self {
        let mut tx = Transaction {
            from: from.into(),
            to: to.into(),
            amount,
            kind,
            data,
            gas_limit,
            gas_price,
            timestamp,
            signature: signature.into(),
            hash: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// SHA-256 over the canonical JSON of every field except `hash` and
    /// `signature` — amounts/prices are encoded as decimal strings so
    /// values beyond `u64` range hash identically regardless of the JSON
    /// backend's native integer width.
    pub fn compute_hash(&self) -> String {
        hash_value(&self.canonical_value())
    }

    pub fn canonical_value(&self) -> Value {
        json!({
            "from_address": self.from,
            "to_address": self.to,
            "amount": self.amount.to_string(),
            "transaction_type": self.kind.as_str(),
            "data": self.data,
            "gas_limit": self.gas_limit,
            "gas_price": self.gas_price.to_string(),
            "timestamp": self.timestamp,
        })
    }

    pub fn gas_cost(&self) -> u128 {
        self.gas_price.saturating_mul(self.gas_limit as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_pure_function_of_fields() {
        let tx = Transaction::new(
            "lakha_alice",
            "lakha_bob",
            100,
            TransactionKind::Transfer,
            Map::new(),
            10,
            1,
            1_700_000_000,
            "",
        );
        assert_eq!(tx.hash, tx.compute_hash());

        let mut tx2 = tx.clone();
        tx2.hash = "tampered".to_string();
        assert_ne!(tx2.hash, tx2.compute_hash());
        assert_eq!(tx.compute_hash(), tx2.compute_hash());
    }

    #[test]
    fn kind_serializes_to_spec_tag() {
        assert_eq!(TransactionKind::ContractDeploy.as_str(), "CONTRACT_DEPLOY");
        let v = serde_json::to_value(TransactionKind::Stake).unwrap();
        assert_eq!(v, Value::String("STAKE".into()));
    }
}
