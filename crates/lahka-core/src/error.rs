use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: {address} has {available}, needs {required}")]
    InsufficientBalance {
        address: String,
        available: u128,
        required: u128,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("gas limit {requested} exceeds maximum {max}")]
    GasLimitExceeded { requested: u64, max: u64 },
    #[error("contract {0} not found")]
    ContractNotFound(String),
    #[error("contract {0} is not active")]
    ContractInactive(String),
    #[error("function {0} is not implemented")]
    FunctionNotImplemented(String),
}
