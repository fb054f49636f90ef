//! Data providers.
//!
//! A [`DataProvider`] answers two questions for a [`Query`]: how many items
//! match its filter, and which items fall into its window, in its sort
//! order. Providers hold no per-query state; everything that varies between
//! calls travels in the query, so one provider can back many components.
//!
//! # Provider Implementations
//!
//! - [`ListDataProvider`]: In-memory list, filtered and sorted locally
//! - [`CallbackDataProvider`]: Delegates counting and fetching to closures,
//!   typically a remote backend
//! - [`ConvertedFilterProvider`], [`FilteredProvider`], [`SortedProvider`]:
//!   Wrappers that change the filter type, inject a filter, or add default
//!   sorting without changing the wrapped provider's contract
//!
//! # Change Notification
//!
//! Providers expose [`ProviderSignals`]. Whoever mutates the data behind a
//! provider emits [`DataChangeEvent`]s through them, and bound components
//! recompute their size in response, synchronously, before the mutating
//! call returns.

mod callback;
mod list;
mod wrapper;

use std::sync::Arc;

use horizon_data_core::Signal;

use crate::error::Result;
use crate::filter::AnyFilter;
use crate::identity::ItemIdentity;
use crate::query::Query;

pub use callback::{CallbackDataProvider, CountCallback, FetchCallback};
pub use list::{CompareFn, ListDataProvider};
pub use wrapper::{
    CombineFn, ConvertedFilterProvider, DataProviderExt, FilteredProvider, SortedProvider,
};

/// A finite sequence of fetched items.
pub type Items<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// What changed in a provider's data.
#[derive(Debug, Clone, PartialEq)]
pub enum DataChangeEvent<T> {
    /// Any item may have been added, removed or changed.
    Refreshed,
    /// A single item's content changed; the set of items did not.
    ItemRefreshed(T),
}

/// Signals emitted by data providers.
///
/// Wrapping providers hand out the wrapped provider's signals, so a change
/// to the underlying data reaches observers of every wrapper.
pub struct ProviderSignals<T> {
    /// Emitted after the provider's data changed.
    pub data_changed: Arc<Signal<DataChangeEvent<T>>>,
}

impl<T: 'static> ProviderSignals<T> {
    /// Creates a set of signals with no connections.
    pub fn new() -> Self {
        Self {
            data_changed: Arc::new(Signal::new()),
        }
    }
}

impl<T: 'static> Default for ProviderSignals<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The contract every data source implements.
///
/// # Implementation Requirements
///
/// - [`size`](DataProvider::size) counts all items matching the query's
///   filter and ignores `offset` and `limit`. It must never return a stale
///   count after the provider performed a mutation.
/// - [`fetch`](DataProvider::fetch) yields at most `limit` items starting
///   at `offset`, filtered and sorted per the query. For a query whose
///   filter the provider applies fully, `size(q)` equals the number of
///   items `fetch(q)` yields without a window.
/// - Equal queries against unchanged data produce equal results.
///
/// # Example
///
/// ```
/// use horizon_data::{DataProvider, ListDataProvider, ItemFilter, Query};
///
/// let provider = ListDataProvider::new(vec![1, 2, 3, 4]);
/// let query = Query::new().with_filter(ItemFilter::new(|n: &i32| *n > 2));
///
/// assert_eq!(provider.size(&query).unwrap(), 2);
/// let items: Vec<_> = provider.fetch(&query).unwrap().collect();
/// assert_eq!(items, vec![3, 4]);
/// ```
pub trait DataProvider<T: 'static>: Send + Sync {
    /// The filter type this provider understands.
    type Filter: Clone + Send + Sync + 'static;

    /// Number of items matching the query's filter.
    ///
    /// A negative value is a contract violation reported to the caller.
    fn size(&self, query: &Query<Self::Filter>) -> Result<i64>;

    /// The items in the query's window.
    fn fetch(&self, query: &Query<Self::Filter>) -> Result<Items<'_, T>>;

    /// Signals for change notification.
    fn signals(&self) -> &ProviderSignals<T>;

    /// Returns `true` if all data is held locally.
    fn is_in_memory(&self) -> bool {
        false
    }

    /// Identity the provider assigns to its items.
    ///
    /// Components without an identifier provider of their own decide item
    /// sameness with this identity, falling back to `PartialEq` when it is
    /// `None`.
    fn identity(&self) -> Option<Arc<dyn ItemIdentity<T>>> {
        None
    }

    /// Notifies observers that any of the data may have changed.
    fn refresh_all(&self) {
        self.signals().data_changed.emit(DataChangeEvent::Refreshed);
    }

    /// Notifies observers that the content of one item changed.
    fn refresh_item(&self, item: T) {
        self.signals()
            .data_changed
            .emit(DataChangeEvent::ItemRefreshed(item));
    }
}

/// A provider whose filter type is only known at run time.
///
/// Components store their provider behind this trait. The filter carried by
/// the query is downcast on every call, so a component filter that does not
/// fit the provider fails the call instead of being ignored.
pub(crate) trait ErasedProvider<T>: Send + Sync {
    fn erased_size(&self, query: &Query<AnyFilter>) -> Result<i64>;
    fn erased_fetch(&self, query: &Query<AnyFilter>) -> Result<Items<'_, T>>;
    fn erased_signals(&self) -> &ProviderSignals<T>;
    fn erased_in_memory(&self) -> bool;
    fn erased_identity(&self) -> Option<Arc<dyn ItemIdentity<T>>>;
    fn filter_type_name(&self) -> &'static str;
}

impl<T: 'static, P: DataProvider<T>> ErasedProvider<T> for P {
    fn erased_size(&self, query: &Query<AnyFilter>) -> Result<i64> {
        self.size(&typed_query::<P::Filter>(query)?)
    }

    fn erased_fetch(&self, query: &Query<AnyFilter>) -> Result<Items<'_, T>> {
        self.fetch(&typed_query::<P::Filter>(query)?)
    }

    fn erased_signals(&self) -> &ProviderSignals<T> {
        self.signals()
    }

    fn erased_in_memory(&self) -> bool {
        self.is_in_memory()
    }

    fn erased_identity(&self) -> Option<Arc<dyn ItemIdentity<T>>> {
        self.identity()
    }

    fn filter_type_name(&self) -> &'static str {
        std::any::type_name::<P::Filter>()
    }
}

/// Shared handle to a type-erased provider.
pub(crate) type SharedProvider<T> = Arc<dyn ErasedProvider<T>>;

/// Address of the provider behind a shared handle, for identity checks.
pub(crate) fn provider_addr<T: 'static>(provider: &SharedProvider<T>) -> *const () {
    Arc::as_ptr(provider) as *const ()
}

fn typed_query<F: Clone + 'static>(query: &Query<AnyFilter>) -> Result<Query<F>> {
    query.clone().try_map_filter(|filter| filter.downcast::<F>())
}
