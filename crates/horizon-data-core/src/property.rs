//! Change-detecting value cells.
//!
//! A data component remembers the last size it reported in a
//! [`Property<Option<usize>>`]. Writing a recomputed size answers the only
//! question the component cares about: did it differ from what listeners
//! were last told?
//!
//! ```
//! use horizon_data_core::Property;
//!
//! let last_size = Property::new(None);
//! assert!(last_size.set(Some(4)));
//! assert!(!last_size.set(Some(4)));
//! assert_eq!(last_size.get(), Some(4));
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value behind a lock whose writes report whether they changed it.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T> Property<T> {
    /// Creates a property holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Overwrites the value without comparing.
    pub fn reset(&self, value: T) {
        *self.value.write() = value;
    }

    /// Consumes the property, returning the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Clone> Property<T> {
    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: PartialEq> Property<T> {
    /// Stores `value` if it differs from the current one.
    ///
    /// Returns `true` if the stored value changed. Comparison and write
    /// happen under one lock, so of two racing writers of the same value
    /// only one observes a change.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        let changed = *current != value;
        if changed {
            *current = value;
        }
        changed
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}

static_assertions::assert_impl_all!(Property<Option<usize>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_unknown_to_known_is_a_change() {
        let size = Property::<Option<usize>>::default();
        assert!(size.set(Some(0)));
        assert!(!size.set(Some(0)));
        assert!(size.set(None));
        assert_eq!(size.get(), None);
    }

    #[test]
    fn test_reset_skips_comparison() {
        let size = Property::new(Some(3usize));
        size.reset(None);
        assert!(size.set(Some(3)));
        assert_eq!(size.into_inner(), Some(3));
    }

    #[test]
    fn test_racing_writers_see_one_change() {
        let size = Arc::new(Property::new(0usize));
        let changes = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let size = size.clone();
                let changes = changes.clone();
                std::thread::spawn(move || {
                    if size.set(42) {
                        changes.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(format!("{:?}", size), "Property(42)");
    }
}
