//! Node identifier allocation.
//!
//! Identifiers are small unsigned integers, monotonically increasing and
//! never reused within one extraction or compilation call. A file-scoped
//! allocator and a pattern-scoped allocator are separate instances; the
//! two spaces never mix because file ids surface as ground `unsigned`
//! fact elements while pattern ids surface as rule variable names.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct IdAllocator {
    first: u32,
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts numbering at `first`, for callers that shard one logical
    /// id space across several units.
    pub fn starting_at(first: u32) -> Self {
        Self { first, next: first }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Count of identifiers issued so far.
    pub fn issued(&self) -> u32 {
        self.next - self.first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut alloc = IdAllocator::new();
        let a = alloc.next_id();
        let b = alloc.next_id();
        assert!(a < b);
        assert_eq!(alloc.issued(), 2);
    }

    #[test]
    fn sharded_allocator_counts_from_its_base() {
        let mut alloc = IdAllocator::starting_at(100);
        assert_eq!(alloc.next_id().index(), 100);
        assert_eq!(alloc.issued(), 1);
    }
}
