use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("tree depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },
    #[error("patch invoked from a hook while another pass is in progress")]
    Reentrant,
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}
