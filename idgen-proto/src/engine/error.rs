use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("key does not exist")]
    KeyDoesNotExist,
    #[error("invalid skip: {0}")]
    InvalidSkip(u64),
    #[error("{0}")]
    ReservationFailed(String),
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}
