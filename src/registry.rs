//! Capacity-checked, insertion-ordered set.
//!
//! Both bookkeeping tables are append-only for the whole session and carry a
//! hard ceiling. Writing past the ceiling is an error, never a silent drop.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::{AgentError, Table};

#[derive(Debug, Clone)]
pub(crate) struct BoundedRegistry<T> {
    order: Vec<T>,
    members: HashSet<T>,
    capacity: usize,
    table: Table,
}

impl<T: Clone + Eq + Hash> BoundedRegistry<T> {
    pub(crate) fn new(table: Table, capacity: usize) -> Self {
        BoundedRegistry {
            order: Vec::new(),
            members: HashSet::new(),
            capacity,
            table,
        }
    }

    pub(crate) fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Inserts `item` unless present. `Ok(true)` means this call inserted it.
    pub(crate) fn insert_if_absent(&mut self, item: T) -> Result<bool, AgentError> {
        if self.members.contains(&item) {
            return Ok(false);
        }
        if self.order.len() >= self.capacity {
            return Err(AgentError::CapacityExceeded { table: self.table, capacity: self.capacity });
        }
        self.members.insert(item.clone());
        self.order.push(item);
        Ok(true)
    }

    pub(crate) fn entries(&self) -> &[T] {
        &self.order
    }

    pub(crate) fn last(&self) -> Option<&T> {
        self.order.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
