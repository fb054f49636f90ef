//! Data views and data providers for Horizon Data.
//!
//! This crate exposes a possibly large, possibly remote collection of items
//! to a component as a filtered, sorted, identity-aware view:
//!
//! - **Queries**: Immutable descriptions of offset, limit, sorting and filter
//! - **Data Providers**: In-memory, callback-backed, and composable wrappers
//! - **Components**: Own the provider binding, filter, sort orders and
//!   size-change listeners; listeners survive provider swaps
//! - **Data Views**: Lazy, restartable item streams, size, and containment
//!   checks through a single equality strategy
//! - **Identity**: Key-based item identity for mutable items reloaded from a
//!   backend
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_data::{DataComponent, IdentifierProvider, ItemFilter, ListDataProvider};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Ticket { id: u32, title: String, open: bool }
//!
//! let provider = Arc::new(ListDataProvider::new(vec![
//!     Ticket { id: 1, title: "crash on start".into(), open: true },
//!     Ticket { id: 2, title: "typo".into(), open: false },
//! ]));
//!
//! let component = DataComponent::new();
//! let view = component.set_data_provider(provider.clone())?;
//! view.set_identifier_provider(IdentifierProvider::new(|t: &Ticket| t.id))?;
//!
//! let sizes = Arc::new(Mutex::new(Vec::new()));
//! let sizes_clone = sizes.clone();
//! let registration = view.add_size_change_listener(move |event| {
//!     sizes_clone.lock().push(event.size());
//! })?;
//!
//! component.set_filter(ItemFilter::new(|t: &Ticket| t.open))?;
//! assert_eq!(view.size()?, 1);
//!
//! // The title changed on the backend; the ticket is still the same one.
//! let reloaded = Ticket { id: 1, title: "crash on startup".into(), open: true };
//! assert!(view.contains(&reloaded)?);
//!
//! provider.push(Ticket { id: 3, title: "slow search".into(), open: true });
//! assert_eq!(*sizes.lock(), vec![1, 2]);
//!
//! registration.cancel();
//! # Ok::<(), horizon_data::DataError>(())
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod identity;
pub mod list_view;
pub mod provider;
pub mod query;
pub mod view;

pub use component::DataComponent;
pub use config::{DEFAULT_PAGE_SIZE, DataViewConfig};
pub use error::{DataError, Result};
pub use event::{ComponentId, SizeChangeEvent};
pub use filter::{AnyFilter, ItemFilter};
pub use identity::{EqualityStrategy, IdentifierProvider, ItemIdentity, ItemMatcher};
pub use list_view::ListDataView;
pub use provider::{
    CallbackDataProvider, CombineFn, CompareFn, ConvertedFilterProvider, CountCallback,
    DataChangeEvent, DataProvider, DataProviderExt, FetchCallback, FilteredProvider, Items,
    ListDataProvider, ProviderSignals, SortedProvider,
};
pub use query::{BackendQuery, Query, SortDirection, SortOrder, SortOrderBuilder};
pub use view::{DataView, ItemStream, PagedItems};

pub use horizon_data_core::{Registration, Signal};
