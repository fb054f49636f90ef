//! Provider wrappers.
//!
//! Wrappers sit between a component and another provider and adjust the
//! queries passing through. They never copy data: size and fetch are always
//! answered by the wrapped provider, and its change signals are handed out
//! unchanged.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{DataProvider, Items, ProviderSignals};
use crate::error::Result;
use crate::identity::ItemIdentity;
use crate::query::{Query, SortOrder};

/// Type alias for a filter combination function.
///
/// Receives the wrapper's own filter first and the query's filter second.
pub type CombineFn<F> = Arc<dyn Fn(&F, &F) -> F + Send + Sync>;

type ConvertFn<G, F> = Arc<dyn Fn(&G) -> F + Send + Sync>;

/// Exposes a provider under a different filter type.
///
/// Query filters of type `G` are converted to the wrapped provider's filter
/// type before every call. A query without a filter stays without one.
pub struct ConvertedFilterProvider<T, P, G>
where
    T: 'static,
    P: DataProvider<T>,
{
    inner: Arc<P>,
    convert: ConvertFn<G, P::Filter>,
    _item: PhantomData<fn() -> T>,
}

impl<T, P, G> ConvertedFilterProvider<T, P, G>
where
    T: 'static,
    P: DataProvider<T>,
    G: Clone + Send + Sync + 'static,
{
    /// Wraps `inner`, converting filters with `convert`.
    pub fn new<C>(inner: Arc<P>, convert: C) -> Self
    where
        C: Fn(&G) -> P::Filter + Send + Sync + 'static,
    {
        Self {
            inner,
            convert: Arc::new(convert),
            _item: PhantomData,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    fn convert_query(&self, query: &Query<G>) -> Query<P::Filter> {
        query.clone().map_filter(|filter| (self.convert)(&filter))
    }
}

impl<T, P, G> DataProvider<T> for ConvertedFilterProvider<T, P, G>
where
    T: 'static,
    P: DataProvider<T>,
    G: Clone + Send + Sync + 'static,
{
    type Filter = G;

    fn size(&self, query: &Query<G>) -> Result<i64> {
        self.inner.size(&self.convert_query(query))
    }

    fn fetch(&self, query: &Query<G>) -> Result<Items<'_, T>> {
        self.inner.fetch(&self.convert_query(query))
    }

    fn signals(&self) -> &ProviderSignals<T> {
        self.inner.signals()
    }

    fn is_in_memory(&self) -> bool {
        self.inner.is_in_memory()
    }

    fn identity(&self) -> Option<Arc<dyn ItemIdentity<T>>> {
        self.inner.identity()
    }
}

impl<T, P, G> fmt::Debug for ConvertedFilterProvider<T, P, G>
where
    T: 'static,
    P: DataProvider<T> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertedFilterProvider")
            .field("inner", &self.inner)
            .field("filter", &std::any::type_name::<G>())
            .finish()
    }
}

/// Applies a fixed base filter to every query.
///
/// When a query carries its own filter, the two are merged with the
/// combination function; otherwise the base filter is used alone.
pub struct FilteredProvider<T, P>
where
    T: 'static,
    P: DataProvider<T>,
{
    inner: Arc<P>,
    filter: P::Filter,
    combine: CombineFn<P::Filter>,
    _item: PhantomData<fn() -> T>,
}

impl<T, P> FilteredProvider<T, P>
where
    T: 'static,
    P: DataProvider<T>,
{
    /// Wraps `inner` with a base filter.
    pub fn new<C>(inner: Arc<P>, filter: P::Filter, combine: C) -> Self
    where
        C: Fn(&P::Filter, &P::Filter) -> P::Filter + Send + Sync + 'static,
    {
        Self {
            inner,
            filter,
            combine: Arc::new(combine),
            _item: PhantomData,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    /// The filter applied to every query.
    pub fn base_filter(&self) -> &P::Filter {
        &self.filter
    }

    fn effective_query(&self, query: &Query<P::Filter>) -> Query<P::Filter> {
        let filter = match query.filter() {
            Some(requested) => (self.combine)(&self.filter, requested),
            None => self.filter.clone(),
        };
        query.clone().with_filter(filter)
    }
}

impl<T, P> DataProvider<T> for FilteredProvider<T, P>
where
    T: 'static,
    P: DataProvider<T>,
{
    type Filter = P::Filter;

    fn size(&self, query: &Query<P::Filter>) -> Result<i64> {
        self.inner.size(&self.effective_query(query))
    }

    fn fetch(&self, query: &Query<P::Filter>) -> Result<Items<'_, T>> {
        self.inner.fetch(&self.effective_query(query))
    }

    fn signals(&self) -> &ProviderSignals<T> {
        self.inner.signals()
    }

    fn is_in_memory(&self) -> bool {
        self.inner.is_in_memory()
    }

    fn identity(&self) -> Option<Arc<dyn ItemIdentity<T>>> {
        self.inner.identity()
    }
}

impl<T, P> fmt::Debug for FilteredProvider<T, P>
where
    T: 'static,
    P: DataProvider<T> + fmt::Debug,
    P::Filter: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredProvider")
            .field("inner", &self.inner)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Adds default sort orders to every query.
///
/// Defaults come after the query's own orders and are skipped for
/// properties the query already sorts by.
pub struct SortedProvider<T, P> {
    inner: Arc<P>,
    default_orders: Vec<SortOrder>,
    _item: PhantomData<fn() -> T>,
}

impl<T, P> SortedProvider<T, P>
where
    T: 'static,
    P: DataProvider<T>,
{
    /// Wraps `inner` with default sort orders.
    pub fn new(inner: Arc<P>, default_orders: Vec<SortOrder>) -> Self {
        Self {
            inner,
            default_orders,
            _item: PhantomData,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    /// Sort orders appended to every query.
    pub fn default_orders(&self) -> &[SortOrder] {
        &self.default_orders
    }

    fn effective_query(&self, query: &Query<P::Filter>) -> Query<P::Filter> {
        let mut orders = query.sort_orders().to_vec();
        for default in &self.default_orders {
            if !orders.iter().any(|o| o.property() == default.property()) {
                orders.push(default.clone());
            }
        }
        query.clone().with_sort_orders(orders)
    }
}

impl<T, P> DataProvider<T> for SortedProvider<T, P>
where
    T: 'static,
    P: DataProvider<T>,
{
    type Filter = P::Filter;

    fn size(&self, query: &Query<P::Filter>) -> Result<i64> {
        // Sorting never changes the count.
        self.inner.size(query)
    }

    fn fetch(&self, query: &Query<P::Filter>) -> Result<Items<'_, T>> {
        self.inner.fetch(&self.effective_query(query))
    }

    fn signals(&self) -> &ProviderSignals<T> {
        self.inner.signals()
    }

    fn is_in_memory(&self) -> bool {
        self.inner.is_in_memory()
    }

    fn identity(&self) -> Option<Arc<dyn ItemIdentity<T>>> {
        self.inner.identity()
    }
}

impl<T, P: fmt::Debug> fmt::Debug for SortedProvider<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedProvider")
            .field("inner", &self.inner)
            .field("default_orders", &self.default_orders)
            .finish()
    }
}

/// Wrapper constructors available on every shared provider.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_data::{DataProvider, DataProviderExt, ItemFilter, ListDataProvider, Query};
///
/// let numbers = Arc::new(ListDataProvider::new((1..=10).collect::<Vec<i32>>()));
/// let at_least = numbers.with_converted_filter(|min: &i32| {
///     let min = *min;
///     ItemFilter::new(move |n: &i32| *n >= min)
/// });
///
/// assert_eq!(at_least.size(&Query::new().with_filter(8)).unwrap(), 3);
/// assert_eq!(at_least.size(&Query::new()).unwrap(), 10);
/// ```
pub trait DataProviderExt<T: 'static>: DataProvider<T> + Sized {
    /// Exposes this provider under filter type `G`.
    fn with_converted_filter<G, C>(self: Arc<Self>, convert: C) -> ConvertedFilterProvider<T, Self, G>
    where
        G: Clone + Send + Sync + 'static,
        C: Fn(&G) -> Self::Filter + Send + Sync + 'static,
    {
        ConvertedFilterProvider::new(self, convert)
    }

    /// Applies `filter` to every query, merged with the query's own filter
    /// by `combine`.
    fn with_filter<C>(self: Arc<Self>, filter: Self::Filter, combine: C) -> FilteredProvider<T, Self>
    where
        C: Fn(&Self::Filter, &Self::Filter) -> Self::Filter + Send + Sync + 'static,
    {
        FilteredProvider::new(self, filter, combine)
    }

    /// Appends `orders` to every query's sort orders.
    fn with_default_sort(self: Arc<Self>, orders: Vec<SortOrder>) -> SortedProvider<T, Self> {
        SortedProvider::new(self, orders)
    }
}

impl<T: 'static, P: DataProvider<T>> DataProviderExt<T> for P {}
