//! Error taxonomy shared by every core operation.
//!
//! Kinds are transport-agnostic; the HTTP layer decides status codes.

use serde::Serialize;
use std::fmt;

pub type CoreResult<T> = Result<T, CoreError>;

/// Which storage step a failed query was executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    Connect,
    Count,
    Data,
}

impl fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryPhase::Connect => "connect",
            QueryPhase::Count => "count",
            QueryPhase::Data => "data",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidArgument,
    QueryExecutionFailed,
    ReferenceDataUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("query execution failed during {phase} phase: {message}")]
    QueryExecutionFailed { phase: QueryPhase, message: String },

    #[error("reference data unavailable: {0}")]
    ReferenceDataUnavailable(String),
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument(message.into())
    }

    /// Adapter for `map_err` on sqlx futures: `.map_err(CoreError::query(QueryPhase::Data))`.
    pub fn query(phase: QueryPhase) -> impl FnOnce(sqlx::Error) -> Self {
        move |err| CoreError::QueryExecutionFailed {
            phase,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CoreError::QueryExecutionFailed { .. } => ErrorKind::QueryExecutionFailed,
            CoreError::ReferenceDataUnavailable(_) => ErrorKind::ReferenceDataUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_carries_phase_in_message() {
        let err = CoreError::query(QueryPhase::Count)(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::QueryExecutionFailed);
        assert!(err.to_string().contains("count phase"));
    }
}
