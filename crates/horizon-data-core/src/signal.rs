//! Synchronous change notification.
//!
//! A [`Signal<Args>`] keeps a table of slots and calls every one of them,
//! in connection order, before [`Signal::emit`] returns. Data components
//! rely on this: when a provider mutation triggers a size change, the
//! listeners have seen the new size by the time the mutating call returns.
//!
//! Slots are keyed by [`ConnectionId`], a slotmap key, so removing one
//! listener never disturbs the IDs of the others.
//!
//! # Re-entrancy
//!
//! Emission works on a snapshot of the slot table taken before the first
//! slot runs. A slot may therefore connect, disconnect, or emit on the
//! same signal. A slot disconnected mid-emission still receives the
//! current emission; a slot connected mid-emission first hears the next
//! one.
//!
//! ```
//! use std::sync::Arc;
//! use horizon_data_core::Signal;
//!
//! let data_changed = Arc::new(Signal::<&'static str>::new());
//!
//! let registration = data_changed.connect_registration(|what| {
//!     println!("{what} changed");
//! });
//! assert_eq!(data_changed.emit("items"), 1);
//!
//! registration.cancel();
//! assert_eq!(data_changed.emit("items"), 0);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;
use crate::registration::Registration;

new_key_type! {
    /// Key of one slot in a signal's slot table.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A table of slots called synchronously on every emission.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

static_assertions::assert_impl_all!(Signal<usize>: Send, Sync);

impl<Args: 'static> Signal<Args> {
    /// Creates a signal without slots.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Adds `slot` to the table.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Adds `slot` and returns a [`Registration`] that removes it again.
    ///
    /// The registration holds the signal weakly; cancelling it after the
    /// signal is gone does nothing.
    pub fn connect_registration<F>(self: &Arc<Self>, slot: F) -> Registration
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        let signal = Arc::downgrade(self);
        Registration::new(move || {
            if let Some(signal) = signal.upgrade() {
                signal.disconnect(id);
            }
        })
    }

    /// Removes a slot. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Returns `true` while the slot is in the table.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.slots.lock().contains_key(id)
    }

    /// Removes every slot.
    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    /// Number of slots in the table.
    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Calls every slot with `args` and returns how many were called.
    #[tracing::instrument(skip_all, target = "horizon_data_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        let snapshot: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, slots = snapshot.len(), "emit");
        for slot in &snapshot {
            slot(&args);
        }
        snapshot.len()
    }
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("horizon_data_core=trace"))
            .with_test_writer()
            .try_init();
    }

    fn recording<T: Clone + Send + 'static>(
        signal: &Signal<T>,
    ) -> (Arc<Mutex<Vec<T>>>, ConnectionId) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let id = signal.connect(move |value: &T| seen_clone.lock().push(value.clone()));
        (seen, id)
    }

    #[test]
    fn test_slots_run_in_connection_order() {
        let signal = Signal::<usize>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ['a', 'b', 'c'] {
            let order = order.clone();
            signal.connect(move |size: &usize| order.lock().push((tag, *size)));
        }

        assert_eq!(signal.emit(7), 3);
        assert_eq!(*order.lock(), vec![('a', 7), ('b', 7), ('c', 7)]);
    }

    #[test]
    fn test_disconnect_is_reported_once() {
        let signal = Signal::<u8>::new();
        let (seen, id) = recording(&signal);
        let (_, other) = recording(&signal);

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        assert!(signal.is_connected(other));
        signal.emit(2);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();
        let (seen, _) = recording(&signal);
        let (_, _) = recording(&signal);

        signal.disconnect_all();
        assert_eq!(signal.emit(()), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_slot_disconnecting_itself() {
        let signal = Arc::new(Signal::<u8>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let own_id = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&signal);
        let seen_clone = seen.clone();
        let own_id_clone = own_id.clone();
        let id = signal.connect(move |value: &u8| {
            seen_clone.lock().push(*value);
            if let (Some(signal), Some(id)) = (weak.upgrade(), *own_id_clone.lock()) {
                signal.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(1);
        signal.emit(2);
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_slot_connected_during_emit_waits_for_next() {
        let signal = Arc::new(Signal::<u8>::new());
        let late = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&signal);
        let late_clone = late.clone();
        signal.connect(move |value: &u8| {
            if *value == 1 {
                if let Some(signal) = weak.upgrade() {
                    let late = late_clone.clone();
                    signal.connect(move |value: &u8| late.lock().push(*value));
                }
            }
        });

        assert_eq!(signal.emit(1), 1);
        assert!(late.lock().is_empty());
        signal.emit(2);
        assert_eq!(*late.lock(), vec![2]);
    }

    #[test]
    fn test_nested_emit() {
        init_tracing();
        let signal = Arc::new(Signal::<u8>::new());
        let (seen, _) = recording(&*signal);

        let weak = Arc::downgrade(&signal);
        signal.connect(move |value: &u8| {
            if *value < 3 {
                if let Some(signal) = weak.upgrade() {
                    signal.emit(value + 1);
                }
            }
        });

        signal.emit(1);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_registration() {
        let signal = Arc::new(Signal::<u8>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let registration =
            signal.connect_registration(move |value: &u8| seen_clone.lock().push(*value));

        signal.emit(1);
        registration.cancel();
        registration.cancel();
        signal.emit(2);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_registration_outlives_signal() {
        let signal = Arc::new(Signal::<u8>::new());
        let registration = signal.connect_registration(|_| {});
        drop(signal);

        registration.cancel();
        assert!(registration.is_cancelled());
    }

    #[test]
    fn test_emit_from_many_threads() {
        init_tracing();
        let signal = Arc::new(Signal::<usize>::new());
        let (seen, _) = recording(&*signal);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let signal = signal.clone();
                std::thread::spawn(move || signal.emit(n))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }

        let mut values = seen.lock().clone();
        values.sort_unstable();
        assert_eq!(values, (0..8).collect::<Vec<_>>());
    }
}
