//! Size change notification types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a data component, carried as the source of its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

impl ComponentId {
    /// Allocates a process-unique ID.
    pub(crate) fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw ID value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// Fired when the number of items matching a component's current query
/// changes.
///
/// Only the count is carried, so observers never force items to be
/// fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChangeEvent {
    source: ComponentId,
    size: usize,
}

impl SizeChangeEvent {
    pub(crate) fn new(source: ComponentId, size: usize) -> Self {
        Self { source, size }
    }

    /// The component whose size changed.
    pub fn source(&self) -> ComponentId {
        self.source
    }

    /// The new number of matching items.
    pub fn size(&self) -> usize {
        self.size
    }
}
