use lahka_consensus::ConsensusError;
use lahka_core::{ContractError, LedgerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    #[error("invalid block: {0}")]
    InvalidBlock(String),
    #[error("no eligible validator available")]
    NoEligibleValidator,
}
