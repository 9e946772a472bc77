//! Error taxonomy for the trigger core.
//!
//! Errors fall in two classes. Fatal errors mean the bookkeeping can no
//! longer be trusted and the session must end; the [`session`](crate::session)
//! layer hands them to its fatal handler. Recoverable errors are confined to
//! the single event or artifact they concern.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::RuntimeError;

/// Which bounded table overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    SeenClassIndex,
    WorkerNameLedger,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::SeenClassIndex => f.write_str("seen class index"),
            Table::WorkerNameLedger => f.write_str("worker name ledger"),
        }
    }
}

/// Every failure the core can report.
///
/// # Fatal
/// - [`AgentError::Configuration`] - options or capability negotiation failed
/// - [`AgentError::MetadataResolution`] - the runtime could not describe an in-flight method
/// - [`AgentError::Runtime`] - a retransformation request was refused
/// - [`AgentError::CapacityExceeded`] - a bookkeeping table hit its ceiling
///
/// # Recoverable
/// - [`AgentError::RewriteEngine`] - the engine failed on one class
/// - [`AgentError::Cleanup`] - an artifact could not be deleted at shutdown
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot resolve method metadata: {0}")]
    MetadataResolution(#[source] RuntimeError),

    #[error("runtime request failed: {0}")]
    Runtime(#[source] RuntimeError),

    #[error("{table} exceeded its capacity of {capacity} entries")]
    CapacityExceeded { table: Table, capacity: usize },

    #[error("rewrite engine failed for {class}: {message}")]
    RewriteEngine { class: String, message: String },

    #[error("cannot remove artifact {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AgentError {
    /// Returns `true` if the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            AgentError::Configuration(_)
            | AgentError::MetadataResolution(_)
            | AgentError::Runtime(_)
            | AgentError::CapacityExceeded { .. } => true,
            AgentError::RewriteEngine { .. } | AgentError::Cleanup { .. } => false,
        }
    }
}

pub type Result<T, E = AgentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fatal_and_recoverable() {
        let capacity = AgentError::CapacityExceeded { table: Table::SeenClassIndex, capacity: 3 };
        assert!(capacity.is_fatal());
        assert!(AgentError::Configuration("bad".into()).is_fatal());
        assert!(AgentError::MetadataResolution(RuntimeError::new("gone")).is_fatal());

        let rewrite = AgentError::RewriteEngine { class: "App".into(), message: "boom".into() };
        assert!(!rewrite.is_fatal());
        let cleanup = AgentError::Cleanup {
            path: PathBuf::from("/tmp/x.class"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!cleanup.is_fatal());
    }

    #[test]
    fn capacity_message_names_table() {
        let err = AgentError::CapacityExceeded { table: Table::WorkerNameLedger, capacity: 30 };
        assert_eq!(err.to_string(), "worker name ledger exceeded its capacity of 30 entries");
    }
}
