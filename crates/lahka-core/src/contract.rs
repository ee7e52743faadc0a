use crate::error::ContractError;
use crate::MAX_CONTRACT_GAS;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    Active,
    Paused,
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractState {
    pub contract_address: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub code: String,
    pub owner: String,
    pub status: ContractStatus,
    pub created_at: u64,
    pub last_updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract_address: String,
    pub name: String,
    pub data: serde_json::Value,
    pub block_number: u64,
    pub tx_hash: String,
    pub timestamp: u64,
}

/// Deterministic key/value store for deployed contracts. Function
/// dispatch is a fixed set of built-ins (`set_state`, `get_state`,
/// `emit_event`) — there is no general-purpose execution engine here; see
/// SPEC_FULL.md §1 for why that's out of scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractStore {
    pub contracts: BTreeMap<String, ContractState>,
    pub events: Vec<ContractEvent>,
    /// Per-deployer monotonic counter feeding deterministic address
    /// derivation (SPEC_FULL.md §4.2 resolves the source's wall-clock +
    /// random derivation into this nonce scheme).
    deploy_nonces: BTreeMap<String, u64>,
}

impl ContractStore {
    pub fn new() -> Self {
        ContractStore::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn deploy(
        &mut self,
        code: &str,
        initial_state: serde_json::Map<String, serde_json::Value>,
        deployer: &str,
        gas_limit: u64,
        now: u64,
        block_number: u64,
        tx_hash: &str,
    ) -> Result<String, ContractError> {
        if gas_limit > MAX_CONTRACT_GAS {
            return Err(ContractError::GasLimitExceeded {
                requested: gas_limit,
                max: MAX_CONTRACT_GAS,
            });
        }

        let nonce = self.deploy_nonces.entry(deployer.to_string()).or_insert(0);
        let address = derive_contract_address(deployer, code, *nonce);
        *nonce += 1;

        self.contracts.insert(
            address.clone(),
            ContractState {
                contract_address: address.clone(),
                data: initial_state,
                code: code.to_string(),
                owner: deployer.to_string(),
                status: ContractStatus::Active,
                created_at: now,
                last_updated: now,
            },
        );
        self.events.push(ContractEvent {
            contract_address: address.clone(),
            name: "ContractDeployed".to_string(),
            data: serde_json::json!({ "deployer": deployer }),
            block_number,
            tx_hash: tx_hash.to_string(),
            timestamp: now,
        });
        Ok(address)
    }

    /// Dispatches a built-in function. On any error the contract's `data`
    /// is restored to its pre-call snapshot — calls are atomic.
    #[allow(clippy::too_many_arguments)]
    pub fn call(
        &mut self,
        addr: &str,
        function: &str,
        args: &serde_json::Value,
        _caller: &str,
        now: u64,
        block_number: u64,
        tx_hash: &str,
    ) -> Result<serde_json::Value, ContractError> {
        let snapshot = {
            let contract = self
                .contracts
                .get(addr)
                .ok_or_else(|| ContractError::ContractNotFound(addr.to_string()))?;
            if contract.status != ContractStatus::Active {
                return Err(ContractError::ContractInactive(addr.to_string()));
            }
            contract.data.clone()
        };

        let result = self.dispatch(addr, function, args, now, block_number, tx_hash);
        if result.is_err() {
            if let Some(contract) = self.contracts.get_mut(addr) {
                contract.data = snapshot;
            }
        } else if let Some(contract) = self.contracts.get_mut(addr) {
            contract.last_updated = now;
        }
        result
    }

    fn dispatch(
        &mut self,
        addr: &str,
        function: &str,
        args: &serde_json::Value,
        now: u64,
        block_number: u64,
        tx_hash: &str,
    ) -> Result<serde_json::Value, ContractError> {
        match function {
            "set_state" => {
                let key = args
                    .get("key")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let value = args.get("value").cloned().unwrap_or(serde_json::Value::Null);
                let contract = self.contracts.get_mut(addr).expect("checked above");
                contract.data.insert(key, value);
                Ok(serde_json::Value::Null)
            }
            "get_state" => {
                let key = args.get("key").and_then(|v| v.as_str()).unwrap_or_default();
                Ok(self.get_state(addr, key).unwrap_or(serde_json::Value::Null))
            }
            "emit_event" => {
                let name = args
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let data = args.get("data").cloned().unwrap_or(serde_json::Value::Null);
                self.events.push(ContractEvent {
                    contract_address: addr.to_string(),
                    name,
                    data,
                    block_number,
                    tx_hash: tx_hash.to_string(),
                    timestamp: now,
                });
                Ok(serde_json::Value::Null)
            }
            other => Err(ContractError::FunctionNotImplemented(other.to_string())),
        }
    }

    /// Dotted-path traversal of a contract's nested state. Returns `None`
    /// on any missing segment (the "absent marker" SPEC_FULL.md §4.2
    /// describes).
    pub fn get_state(&self, addr: &str, key_path: &str) -> Option<serde_json::Value> {
        let contract = self.contracts.get(addr)?;
        let mut current = serde_json::Value::Object(contract.data.clone());
        for segment in key_path.split('.') {
            current = current.as_object()?.get(segment)?.clone();
        }
        Some(current)
    }
}

fn derive_contract_address(deployer: &str, code: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(code.as_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..40].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deploy_rejects_excess_gas() {
        let mut store = ContractStore::new();
        let err = store
            .deploy("code", Default::default(), "alice", 2_000_000, 0, 0, "tx")
            .unwrap_err();
        assert!(matches!(err, ContractError::GasLimitExceeded { .. }));
    }

    #[test]
    fn deploy_is_deterministic_given_same_nonce() {
        let a = derive_contract_address("alice", "code", 0);
        let b = derive_contract_address("alice", "code", 0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        let c = derive_contract_address("alice", "code", 1);
        assert_ne!(a, c);
    }

    #[test]
    fn set_then_get_state_round_trips() {
        let mut store = ContractStore::new();
        let addr = store
            .deploy("code", Default::default(), "alice", 10, 0, 0, "tx")
            .unwrap();
        store
            .call(
                &addr,
                "set_state",
                &json!({"key": "balance", "value": 42}),
                "alice",
                1,
                1,
                "tx2",
            )
            .unwrap();
        assert_eq!(store.get_state(&addr, "balance"), Some(json!(42)));
        assert_eq!(store.get_state(&addr, "missing"), None);
    }

    #[test]
    fn failed_call_reverts_state() {
        let mut store = ContractStore::new();
        let addr = store
            .deploy("code", Default::default(), "alice", 10, 0, 0, "tx")
            .unwrap();
        store
            .call(&addr, "set_state", &json!({"key": "x", "value": 1}), "alice", 1, 1, "tx2")
            .unwrap();
        let err = store.call(&addr, "no_such_fn", &json!({}), "alice", 2, 2, "tx3");
        assert!(err.is_err());
        assert_eq!(store.get_state(&addr, "x"), Some(json!(1)));
    }

    #[test]
    fn call_on_unknown_contract_fails() {
        let mut store = ContractStore::new();
        let err = store.call("nope", "get_state", &json!({}), "alice", 0, 0, "tx");
        assert!(matches!(err, Err(ContractError::ContractNotFound(_))));
    }
}
