//! In-memory data provider.
//!
//! `ListDataProvider<T>` keeps its items in a list and evaluates filters
//! and sort orders locally. Sorting goes through comparators registered
//! per property name when the provider is built; the provider's filter type
//! is [`ItemFilter<T>`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{DataProvider, FilteredProvider, Items, ProviderSignals};
use crate::error::{DataError, Result};
use crate::filter::ItemFilter;
use crate::provider::DataProviderExt;
use crate::query::{Query, SortDirection, SortOrder};

/// Type alias for a compare function used for sorting.
pub type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A data provider over an in-memory list.
///
/// Mutating methods emit [`DataChangeEvent`](super::DataChangeEvent)s
/// after the list lock has been released, so observers may read the
/// provider from their slots.
///
/// # Example
///
/// ```
/// use horizon_data::{DataProvider, ListDataProvider, Query, SortOrder};
///
/// #[derive(Clone)]
/// struct Person { name: String, age: u32 }
///
/// let provider = ListDataProvider::new(vec![
///     Person { name: "Charlie".into(), age: 35 },
///     Person { name: "Alice".into(), age: 30 },
/// ])
/// .with_sort_key("name", |p: &Person| p.name.clone());
///
/// let query = Query::new().with_sort_orders(vec![SortOrder::asc("name")]);
/// let names: Vec<_> = provider.fetch(&query).unwrap().map(|p| p.name).collect();
/// assert_eq!(names, vec!["Alice", "Charlie"]);
/// ```
pub struct ListDataProvider<T> {
    items: RwLock<Vec<T>>,
    comparators: HashMap<String, CompareFn<T>>,
    signals: ProviderSignals<T>,
}

impl<T: Clone + Send + Sync + 'static> ListDataProvider<T> {
    /// Creates a provider over the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            comparators: HashMap::new(),
            signals: ProviderSignals::new(),
        }
    }

    /// Registers a comparator for a sort property.
    pub fn with_sort_property<C>(mut self, property: impl Into<String>, compare: C) -> Self
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparators.insert(property.into(), Arc::new(compare));
        self
    }

    /// Registers a sort property that compares by an extracted key.
    pub fn with_sort_key<K, G>(self, property: impl Into<String>, key: G) -> Self
    where
        K: Ord,
        G: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.with_sort_property(property, move |a, b| key(a).cmp(&key(b)))
    }

    /// Returns `true` if the provider can sort by `property`.
    pub fn has_sort_property(&self, property: &str) -> bool {
        self.comparators.contains_key(property)
    }

    /// Wraps this provider so every query is additionally filtered by `filter`.
    pub fn with_item_filter(self: Arc<Self>, filter: ItemFilter<T>) -> FilteredProvider<T, Self> {
        self.with_filter(filter, |base, requested| base.and(requested))
    }

    /// A copy of all items, unfiltered, in list order.
    pub fn items(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Access the backing list without copying it.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.read())
    }

    /// Number of items in the backing list, ignoring any filter.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the backing list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Replaces all items.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
        self.refresh_all();
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        self.items.write().push(item);
        self.refresh_all();
    }

    /// Appends several items.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.write().extend(items);
        self.refresh_all();
    }

    /// Inserts an item at `index`, or appends it if `index` is past the end.
    pub fn insert(&self, index: usize, item: T) {
        {
            let mut items = self.items.write();
            let index = index.min(items.len());
            items.insert(index, item);
        }
        self.refresh_all();
    }

    /// Removes every item matching `predicate`, returning how many were removed.
    pub fn remove_where<P>(&self, mut predicate: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let removed = {
            let mut items = self.items.write();
            let before = items.len();
            items.retain(|item| !predicate(item));
            before - items.len()
        };
        if removed > 0 {
            self.refresh_all();
        }
        removed
    }

    /// Replaces the first item matching `predicate` with `item`.
    ///
    /// Returns `false` if nothing matched. A replacement is reported as
    /// [`DataChangeEvent::ItemRefreshed`](super::DataChangeEvent::ItemRefreshed).
    pub fn replace_where<P>(&self, predicate: P, item: T) -> bool
    where
        P: Fn(&T) -> bool,
    {
        let replaced = {
            let mut items = self.items.write();
            match items.iter_mut().find(|candidate| predicate(candidate)) {
                Some(slot) => {
                    *slot = item.clone();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.refresh_item(item);
        }
        replaced
    }

    /// Runs an arbitrary mutation on the backing list and reports a refresh.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.items.write());
        self.refresh_all();
        result
    }

    /// Copies of the items in the query's window.
    ///
    /// Only windowed items are cloned; sorting works on references into the
    /// backing list.
    fn window(&self, query: &Query<ItemFilter<T>>) -> Result<Vec<T>> {
        let comparators = self.comparators_for(query.sort_orders())?;

        let items = self.items.read();
        let visible = items
            .iter()
            .filter(|item| query.filter().is_none_or(|filter| filter.test(item)));

        if comparators.is_empty() {
            return Ok(query.page(visible).cloned().collect());
        }

        let mut sorted: Vec<&T> = visible.collect();
        sorted.sort_by(|a, b| compare_by(&comparators, *a, *b));
        Ok(query.page(sorted).cloned().collect())
    }

    fn comparators_for(&self, orders: &[SortOrder]) -> Result<Vec<(CompareFn<T>, SortDirection)>> {
        orders
            .iter()
            .map(|order| {
                self.comparators
                    .get(order.property())
                    .map(|compare| (compare.clone(), order.direction()))
                    .ok_or_else(|| DataError::unknown_sort_property(order.property()))
            })
            .collect()
    }
}

fn compare_by<T>(comparators: &[(CompareFn<T>, SortDirection)], a: &T, b: &T) -> Ordering {
    comparators
        .iter()
        .map(|(compare, direction)| direction.apply(compare(a, b)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl<T: Clone + Send + Sync + 'static> DataProvider<T> for ListDataProvider<T> {
    type Filter = ItemFilter<T>;

    fn size(&self, query: &Query<ItemFilter<T>>) -> Result<i64> {
        let items = self.items.read();
        let count = match query.filter() {
            Some(filter) => items.iter().filter(|item| filter.test(item)).count(),
            None => items.len(),
        };
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    fn fetch(&self, query: &Query<ItemFilter<T>>) -> Result<Items<'_, T>> {
        Ok(Box::new(self.window(query)?.into_iter()))
    }

    fn signals(&self) -> &ProviderSignals<T> {
        &self.signals
    }

    fn is_in_memory(&self) -> bool {
        true
    }
}

impl<T> fmt::Debug for ListDataProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut properties: Vec<&str> = self.comparators.keys().map(String::as_str).collect();
        properties.sort_unstable();
        f.debug_struct("ListDataProvider")
            .field("len", &self.items.read().len())
            .field("sort_properties", &properties)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> From<Vec<T>> for ListDataProvider<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}
