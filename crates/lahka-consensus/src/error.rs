use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("rating {0} is outside the valid range [1, 100]")]
    InvalidRating(i64),
}
