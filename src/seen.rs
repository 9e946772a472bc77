//! Registry of class/method pairs already selected for instrumentation.

use crate::error::{AgentError, Table};
use crate::names::CandidateKey;
use crate::registry::BoundedRegistry;

/// Default ceiling, sized for a few thousand hot methods.
pub const DEFAULT_SEEN_CAPACITY: usize = 3000;

/// Append-only, insertion-ordered set of [`CandidateKey`]s.
///
/// [`record_if_absent`](Self::record_if_absent) is the at-most-once gate:
/// for any key it answers `true` exactly once per session. The index is not
/// synchronized itself; the coordinator calls it under its lock.
#[derive(Debug, Clone)]
pub struct SeenClassIndex {
    keys: BoundedRegistry<CandidateKey>,
}

impl SeenClassIndex {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SEEN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SeenClassIndex { keys: BoundedRegistry::new(Table::SeenClassIndex, capacity) }
    }

    pub fn contains(&self, key: &CandidateKey) -> bool {
        self.keys.contains(key)
    }

    /// Records `key` if unseen. Returns `true` iff this call recorded it.
    ///
    /// Fails with [`AgentError::CapacityExceeded`] when a new key arrives at
    /// a full index; already-seen keys keep answering `false`.
    pub fn record_if_absent(&mut self, key: CandidateKey) -> Result<bool, AgentError> {
        self.keys.insert_if_absent(key)
    }

    /// Most recently selected key.
    pub fn latest(&self) -> Option<&CandidateKey> {
        self.keys.last()
    }

    pub fn entries(&self) -> &[CandidateKey] {
        self.keys.entries()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.keys.capacity()
    }
}

impl Default for SeenClassIndex {
    fn default() -> Self {
        Self::new()
    }
}
