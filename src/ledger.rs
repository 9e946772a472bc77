//! Names of worker classes generated by the rewrite engine.

use crate::error::{AgentError, Table};
use crate::names::ClassName;
use crate::registry::BoundedRegistry;

/// Default ceiling. The engine emits a handful of workers per rewritten class.
pub const DEFAULT_WORKER_CAPACITY: usize = 30;

/// Append-only ledger of generated worker class names.
///
/// Lookups match by substring: a class whose name contains a registered
/// worker name is treated as that worker (a compiled-method event reports
/// `LApp_Worker_0;` for the registered `App_Worker_0`). The ledger is also
/// the list of files the [`ShutdownSweeper`](crate::sweeper::ShutdownSweeper)
/// removes.
#[derive(Debug, Clone)]
pub struct WorkerNameLedger {
    names: BoundedRegistry<ClassName>,
}

impl WorkerNameLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WORKER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WorkerNameLedger { names: BoundedRegistry::new(Table::WorkerNameLedger, capacity) }
    }

    pub fn is_worker_artifact(&self, name: &ClassName) -> bool {
        self.names.contains(name) || self.names.entries().iter().any(|w| name.contains(w.as_str()))
    }

    /// Registers `name` if absent. Returns `true` iff this call registered it.
    pub fn register_if_absent(&mut self, name: ClassName) -> Result<bool, AgentError> {
        self.names.insert_if_absent(name)
    }

    pub fn entries(&self) -> &[ClassName] {
        self.names.entries()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.len() == 0
    }
}

impl Default for WorkerNameLedger {
    fn default() -> Self {
        Self::new()
    }
}
