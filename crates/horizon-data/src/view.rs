//! The component-facing data view.
//!
//! A [`DataView`] combines a component's provider binding with its filter,
//! sort orders and equality strategy. Every read builds a fresh query from
//! the component's current state, so a view never answers from a stale
//! filter.
//!
//! Items are exposed as an [`ItemStream`], which fetches the matching set
//! page by page instead of materializing it.

use std::fmt;

use horizon_data_core::Registration;
use horizon_data_core::logging::{span_names, targets};

use crate::component::{DataComponent, Snapshot};
use crate::config::DataViewConfig;
use crate::error::{DataError, Result};
use crate::event::{ComponentId, SizeChangeEvent};
use crate::filter::AnyFilter;
use crate::identity::{EqualityStrategy, IdentifierProvider};
use crate::provider::SharedProvider;
use crate::query::Query;

/// Read and observe access to a component's current data.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_data::{DataComponent, IdentifierProvider, ListDataProvider};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Person { id: u64, name: String }
///
/// let component = DataComponent::new();
/// let provider = Arc::new(ListDataProvider::new(vec![
///     Person { id: 1, name: "B".into() },
/// ]));
/// let view = component.set_data_provider(provider).unwrap();
///
/// let stale = Person { id: 1, name: "A".into() };
/// assert!(!view.contains(&stale).unwrap());
///
/// view.set_identifier_provider(IdentifierProvider::new(|p: &Person| p.id)).unwrap();
/// assert!(view.contains(&stale).unwrap());
/// ```
pub struct DataView<T> {
    component: DataComponent<T>,
}

impl<T> Clone for DataView<T> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
        }
    }
}

impl<T> DataView<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub(crate) fn new(component: DataComponent<T>) -> Self {
        Self { component }
    }

    /// The component this view reads from.
    pub fn component(&self) -> &DataComponent<T> {
        &self.component
    }

    /// Identity of the owning component.
    pub fn component_id(&self) -> ComponentId {
        self.component.id()
    }

    /// All items matching the current filter, in the current sort order.
    ///
    /// The returned stream captures the query at the time of this call.
    /// Iterating it again re-issues that query; call `items` again to pick
    /// up later filter or sort changes.
    pub fn items(&self) -> Result<ItemStream<T>> {
        let Snapshot {
            provider, query, ..
        } = self.component.snapshot()?;
        Ok(ItemStream::new(provider, query, self.component.config()))
    }

    /// Number of items matching the current filter.
    ///
    /// A negative count from the provider fails with
    /// [`DataError::NegativeSize`].
    pub fn size(&self) -> Result<usize> {
        self.component.current_size()
    }

    /// Returns `true` if an item that is the same as `item` is currently
    /// available, i.e. present in the backing data and accepted by the
    /// current filter.
    ///
    /// Sameness is decided by the component's equality strategy.
    pub fn contains(&self, item: &T) -> Result<bool> {
        let Snapshot {
            provider,
            query,
            equality,
        } = self.component.snapshot()?;
        let matches = equality.matcher(item)?;
        let stream = ItemStream::new(provider, query, self.component.config());
        for candidate in &stream {
            if matches(&candidate?) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The item at `index` in the current filtered and sorted set.
    pub fn item(&self, index: usize) -> Result<Option<T>> {
        let page = self.items()?.fetch_window(index, 1)?;
        Ok(page.into_iter().next())
    }

    /// Registers a size-change listener on the owning component.
    ///
    /// The registration survives provider swaps.
    pub fn add_size_change_listener<F>(&self, listener: F) -> Result<Registration>
    where
        F: Fn(&SizeChangeEvent) + Send + Sync + 'static,
    {
        self.component.add_size_change_listener(listener)
    }

    /// Decides item sameness by the key `provider` derives.
    ///
    /// Takes precedence over the bound provider's own identity. Streams
    /// already handed out are unaffected.
    pub fn set_identifier_provider<K>(&self, provider: IdentifierProvider<T, K>) -> Result<()>
    where
        K: PartialEq + 'static,
    {
        self.component
            .set_equality(EqualityStrategy::identifier(provider))
    }

    /// Drops the identifier provider.
    ///
    /// Sameness falls back to the bound provider's identity, or to
    /// `PartialEq` if the provider has none.
    pub fn clear_identifier_provider(&self) -> Result<()> {
        self.component.set_equality(EqualityStrategy::Structural)
    }

    /// The strategy currently deciding item sameness.
    pub fn equality(&self) -> Result<EqualityStrategy<T>> {
        Ok(self.component.snapshot()?.equality)
    }
}

impl<T> fmt::Debug for DataView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataView")
            .field("component", &self.component)
            .finish()
    }
}

/// The full matching set of one query, fetched lazily.
///
/// Each call to [`iter`](ItemStream::iter) starts over at offset zero and
/// requests `page_size` items per provider call, so a stream can be
/// consumed any number of times and always reflects the provider's current
/// data.
pub struct ItemStream<T> {
    provider: SharedProvider<T>,
    query: Query<AnyFilter>,
    page_size: usize,
    verify_limits: bool,
}

impl<T: 'static> ItemStream<T> {
    pub(crate) fn new(
        provider: SharedProvider<T>,
        query: Query<AnyFilter>,
        config: &DataViewConfig,
    ) -> Self {
        Self {
            provider,
            query,
            page_size: config.page_size.max(1),
            verify_limits: config.verify_fetch_limits,
        }
    }

    /// Iterates the matching items.
    ///
    /// The first provider error is yielded and ends the iteration. Without
    /// fetch limit verification, the provider's size is queried up front
    /// and caps the number of items yielded.
    pub fn iter(&self) -> PagedItems<'_, T> {
        PagedItems {
            stream: self,
            offset: 0,
            page: Vec::new().into_iter(),
            remaining: None,
            exhausted: false,
        }
    }

    /// Collects all matching items.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }

    /// Counts the matching items by fetching them.
    pub fn count(&self) -> Result<usize> {
        self.iter().try_fold(0, |count, item| item.map(|_| count + 1))
    }

    /// The query this stream re-issues, without window.
    pub fn query(&self) -> &Query<AnyFilter> {
        &self.query
    }

    /// Number of items requested per provider call.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn reported_size(&self) -> Result<usize> {
        let size = self.provider.erased_size(&self.query)?;
        usize::try_from(size).map_err(|_| DataError::NegativeSize { size })
    }

    pub(crate) fn fetch_window(&self, offset: usize, limit: usize) -> Result<Vec<T>> {
        let _span = tracing::trace_span!(
            target: targets::VIEW,
            span_names::FETCH,
            offset,
            limit
        )
        .entered();

        let query = self.query.clone().with_window(offset, limit);
        let items = self.provider.erased_fetch(&query)?;
        let page: Vec<T> = if self.verify_limits {
            items.take(limit.saturating_add(1)).collect()
        } else {
            items.take(limit).collect()
        };

        if page.len() > limit {
            return Err(DataError::TooManyItems {
                requested: limit,
                returned: page.len(),
            });
        }
        tracing::trace!(target: targets::VIEW, fetched = page.len(), "fetched page");
        Ok(page)
    }
}

impl<'a, T: 'static> IntoIterator for &'a ItemStream<T> {
    type Item = Result<T>;
    type IntoIter = PagedItems<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for ItemStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemStream")
            .field("query", &self.query)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

/// Iterator over an [`ItemStream`].
pub struct PagedItems<'a, T> {
    stream: &'a ItemStream<T>,
    offset: usize,
    page: std::vec::IntoIter<T>,
    remaining: Option<usize>,
    exhausted: bool,
}

impl<T: 'static> Iterator for PagedItems<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.page.next() {
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }

            if self.remaining.is_none() && !self.stream.verify_limits {
                match self.stream.reported_size() {
                    Ok(size) => self.remaining = Some(size),
                    Err(err) => {
                        self.exhausted = true;
                        return Some(Err(err));
                    }
                }
            }
            if self.remaining == Some(0) {
                self.exhausted = true;
                return None;
            }

            let page_size = self.stream.page_size;
            match self.stream.fetch_window(self.offset, page_size) {
                Ok(mut page) => {
                    // A short page is the last one.
                    self.exhausted = page.len() < page_size;
                    if let Some(remaining) = self.remaining.as_mut() {
                        page.truncate(*remaining);
                        *remaining -= page.len();
                    }
                    self.offset += page.len();
                    self.page = page.into_iter();
                }
                Err(err) => {
                    self.exhausted = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
