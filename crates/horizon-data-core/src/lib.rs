//! Core notification primitives for Horizon Data.
//!
//! This crate provides the building blocks the data-view layer uses to tell
//! observers that something changed:
//!
//! - **Signal/Slot System**: Type-safe, synchronous change notification
//! - **Registrations**: Idempotent cancellation handles for listeners
//! - **Properties**: Value cells that report whether a write changed them
//! - **Logging**: `tracing` target and span names
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_data_core::{Property, Signal};
//!
//! let size = Property::new(0usize);
//! let size_changed = Arc::new(Signal::<usize>::new());
//!
//! let registration = size_changed.connect_registration(|size| {
//!     println!("size changed to {size}");
//! });
//!
//! if size.set(10) {
//!     size_changed.emit(10);
//! }
//!
//! registration.cancel();
//! ```

pub mod logging;
pub mod property;
pub mod registration;
pub mod signal;

pub use property::Property;
pub use registration::Registration;
pub use signal::{ConnectionId, Signal};
