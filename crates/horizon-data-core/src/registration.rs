//! Cancellation handles for listener subscriptions.
//!
//! A [`Registration`] is returned whenever a listener is attached to
//! something that may outlive the caller's interest in it. Cancelling is
//! idempotent: the underlying cancel action runs at most once, no matter
//! how often [`Registration::cancel`] is called or whether the owner of the
//! listener still exists.

use std::fmt;

use parking_lot::Mutex;

type CancelFn = Box<dyn FnOnce() + Send>;

/// An opaque handle that removes a listener when cancelled.
///
/// Dropping a `Registration` does not cancel it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_data_core::Signal;
///
/// let signal = Arc::new(Signal::<u32>::new());
/// let registration = signal.connect_registration(|size| println!("{size}"));
///
/// registration.cancel();
/// registration.cancel(); // no-op
/// assert_eq!(signal.connection_count(), 0);
/// ```
pub struct Registration {
    cancel: Mutex<Option<CancelFn>>,
}

static_assertions::assert_impl_all!(Registration: Send, Sync);

impl Registration {
    /// Creates a registration that runs `cancel` the first time it is cancelled.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Removes the associated listener.
    ///
    /// Safe to call any number of times.
    pub fn cancel(&self) {
        // Take first so a cancel action that re-enters this handle sees it spent.
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Returns `true` once the registration has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.lock().is_none()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cancel_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let registration = Registration::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!registration.is_cancelled());
        registration.cancel();
        registration.cancel();
        registration.cancel();

        assert!(registration.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_does_not_cancel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let registration = Registration::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        drop(registration);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
