use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed filter: {0}")]
    MalformedFilter(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single backend call.
///
/// Never propagated out of a blend: the orchestrator records it and keeps
/// going with the other backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Transport, protocol or server failure; the backend produced nothing.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend could not parse the query string. Primary only; eligible
    /// for a single repair-and-retry.
    #[error("Unparseable query: {0}")]
    UnparseableQuery(String),
}

impl BackendError {
    pub fn is_unparseable_query(&self) -> bool {
        matches!(self, Self::UnparseableQuery(_))
    }
}
