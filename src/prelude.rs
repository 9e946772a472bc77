//! Common imports for host adapters.
//!
//! Covers what a host needs to wire runtime callbacks into a session and
//! implement the two collaborator traits.

pub use crate::config::AgentConfig;
pub use crate::coordinator::{CompileOutcome, LoadOutcome, TriggerState};
pub use crate::error::AgentError;
pub use crate::names::{ClassName, MethodName};
pub use crate::rewrite::{CorrelationHint, RewriteEngine, RewriteError, RewriteResult};
pub use crate::runtime::{EventKind, MethodMetadata, Runtime, RuntimeError};
pub use crate::session::{Event, Session};
pub use crate::sweeper::SweepReport;
