use thiserror::Error;

/// Misuse of a policy by its host cache.
///
/// These are bookkeeping bugs on the host side. The policy refuses the call
/// and leaves its state untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("key is already tracked by the eviction policy")]
    AlreadyTracked,
    #[error("key is not tracked by the eviction policy")]
    NotTracked,
    #[error("evicted key is not the least recently used entry")]
    NotVictim,
}

pub type Result<T> = std::result::Result<T, PolicyError>;

impl PolicyError {
    /// Logs the violation before handing it back to the caller.
    pub(crate) fn report(self) -> Self {
        tracing::error!(error = %self, "cache policy contract violation");
        self
    }
}
