//! Data view over an in-memory list.
//!
//! [`ListDataView`] adds item mutation, navigation and local filtering to
//! [`DataView`]. It is tied to the [`ListDataProvider`] it was created
//! for: once the component is rebound to another provider, every operation
//! fails with [`DataError::StaleView`].
//!
//! Mutations match items through the component's equality strategy, so with
//! an identifier provider set, a modified copy of an item addresses the
//! stored one.

use std::fmt;
use std::sync::Arc;

use horizon_data_core::Registration;

use crate::component::DataComponent;
use crate::error::{DataError, Result};
use crate::event::{ComponentId, SizeChangeEvent};
use crate::filter::ItemFilter;
use crate::identity::{EqualityStrategy, IdentifierProvider};
use crate::provider::ListDataProvider;
use crate::query::SortOrder;
use crate::view::{DataView, ItemStream};

/// A [`DataView`] that can also change the list behind it.
///
/// # Example
///
/// ```
/// use horizon_data::{DataComponent, ItemFilter};
///
/// let component = DataComponent::new();
/// let view = component.set_items(vec!["a", "b"]).unwrap();
///
/// view.add_item_after("x", &"a").unwrap();
/// assert_eq!(view.items().unwrap().to_vec().unwrap(), vec!["a", "x", "b"]);
///
/// view.set_filter(ItemFilter::new(|s: &&str| *s != "x")).unwrap();
/// assert_eq!(view.size().unwrap(), 2);
/// assert_eq!(view.next_item(&"a").unwrap(), Some("b"));
/// ```
pub struct ListDataView<T> {
    view: DataView<T>,
    provider: Arc<ListDataProvider<T>>,
}

impl<T> Clone for ListDataView<T> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl<T> ListDataView<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub(crate) fn new(component: DataComponent<T>, provider: Arc<ListDataProvider<T>>) -> Self {
        Self {
            view: DataView::new(component),
            provider,
        }
    }

    /// The provider this view mutates.
    pub fn provider(&self) -> &Arc<ListDataProvider<T>> {
        &self.provider
    }

    /// The generic view of the same component.
    pub fn as_data_view(&self) -> &DataView<T> {
        &self.view
    }

    /// Identity of the owning component.
    pub fn component_id(&self) -> ComponentId {
        self.view.component_id()
    }

    fn component(&self) -> &DataComponent<T> {
        self.view.component()
    }

    fn ensure_current(&self) -> Result<()> {
        self.component()
            .ensure_bound_to(Arc::as_ptr(&self.provider) as *const ())
    }

    fn equality(&self) -> Result<EqualityStrategy<T>> {
        self.ensure_current()?;
        self.view.equality()
    }

    // Reads

    /// See [`DataView::items`].
    pub fn items(&self) -> Result<ItemStream<T>> {
        self.ensure_current()?;
        self.view.items()
    }

    /// See [`DataView::size`].
    pub fn size(&self) -> Result<usize> {
        self.ensure_current()?;
        self.view.size()
    }

    /// See [`DataView::contains`].
    pub fn contains(&self, item: &T) -> Result<bool> {
        self.ensure_current()?;
        self.view.contains(item)
    }

    /// See [`DataView::item`].
    pub fn item(&self, index: usize) -> Result<Option<T>> {
        self.ensure_current()?;
        self.view.item(index)
    }

    /// The item after `item` in the filtered and sorted set.
    ///
    /// Returns `None` if `item` is last or not in the set.
    pub fn next_item(&self, item: &T) -> Result<Option<T>> {
        self.neighbour(item, |index, len| (index + 1 < len).then_some(index + 1))
    }

    /// The item before `item` in the filtered and sorted set.
    pub fn previous_item(&self, item: &T) -> Result<Option<T>> {
        self.neighbour(item, |index, _| index.checked_sub(1))
    }

    fn neighbour(
        &self,
        item: &T,
        step: impl FnOnce(usize, usize) -> Option<usize>,
    ) -> Result<Option<T>> {
        let equality = self.equality()?;
        let mut visible = self.view.items()?.to_vec()?;
        let Some(index) = equality.position(&visible, item)? else {
            return Ok(None);
        };
        Ok(step(index, visible.len()).map(|target| visible.swap_remove(target)))
    }

    /// See [`DataView::add_size_change_listener`].
    pub fn add_size_change_listener<F>(&self, listener: F) -> Result<Registration>
    where
        F: Fn(&SizeChangeEvent) + Send + Sync + 'static,
    {
        self.ensure_current()?;
        self.view.add_size_change_listener(listener)
    }

    /// See [`DataView::set_identifier_provider`].
    pub fn set_identifier_provider<K>(&self, provider: IdentifierProvider<T, K>) -> Result<()>
    where
        K: PartialEq + 'static,
    {
        self.ensure_current()?;
        self.view.set_identifier_provider(provider)
    }

    /// See [`DataView::clear_identifier_provider`].
    pub fn clear_identifier_provider(&self) -> Result<()> {
        self.ensure_current()?;
        self.view.clear_identifier_provider()
    }

    // Mutations

    /// Appends `item` unless the list already holds the same item.
    ///
    /// Returns `true` if the item was added.
    pub fn add_item(&self, item: T) -> Result<bool> {
        let equality = self.equality()?;
        if self
            .provider
            .with_items(|items| equality.position(items, &item))?
            .is_some()
        {
            return Ok(false);
        }
        self.component().track_refresh(|| self.provider.push(item))?;
        Ok(true)
    }

    /// Appends every item not already held, returning how many were added.
    pub fn add_items<I>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let equality = self.equality()?;
        let mut added: Vec<T> = Vec::new();
        for item in items {
            let held = self
                .provider
                .with_items(|stored| equality.position(stored, &item))?
                .is_some();
            if !held && equality.position(&added, &item)?.is_none() {
                added.push(item);
            }
        }
        let count = added.len();
        if count > 0 {
            self.component()
                .track_refresh(|| self.provider.extend(added))?;
        }
        Ok(count)
    }

    /// Inserts `item` directly after `anchor`.
    ///
    /// An item that is already held is moved. Fails with
    /// [`DataError::ItemNotFound`] if `anchor` is not in the list.
    pub fn add_item_after(&self, item: T, anchor: &T) -> Result<()> {
        self.insert_relative(item, anchor, 1)
    }

    /// Inserts `item` directly before `anchor`.
    pub fn add_item_before(&self, item: T, anchor: &T) -> Result<()> {
        self.insert_relative(item, anchor, 0)
    }

    fn insert_relative(&self, item: T, anchor: &T, shift: usize) -> Result<()> {
        let equality = self.equality()?;
        let is_anchor = equality.matcher(anchor)?;
        if !self.provider.with_items(|items| items.iter().any(|c| is_anchor(c))) {
            return Err(DataError::ItemNotFound);
        }
        if equality.same(&item, anchor) {
            return Ok(());
        }

        let probe = item.clone();
        let is_item = equality.matcher(&probe)?;
        self.component().track_refresh(|| {
            self.provider.update(|items| {
                items.retain(|candidate| !is_item(candidate));
                let index = items
                    .iter()
                    .position(|candidate| is_anchor(candidate))
                    .map_or(items.len(), |anchor_index| anchor_index + shift);
                items.insert(index.min(items.len()), item);
            })
        })
    }

    /// Removes the item that is the same as `item`.
    ///
    /// Returns `false` if no such item was held.
    pub fn remove_item(&self, item: &T) -> Result<bool> {
        let equality = self.equality()?;
        let matches = equality.matcher(item)?;
        let removed = self
            .component()
            .track_refresh(|| self.provider.remove_where(|candidate| matches(candidate)))?;
        Ok(removed > 0)
    }

    /// Removes every held item that is the same as one of `items`.
    pub fn remove_items<'a, I>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let equality = self.equality()?;
        let matchers = items
            .into_iter()
            .map(|item| equality.matcher(item))
            .collect::<Result<Vec<_>>>()?;
        self.component().track_refresh(|| {
            self.provider
                .remove_where(|candidate| matchers.iter().any(|matches| matches(candidate)))
        })
    }

    /// Replaces the held item that is the same as `item` with `item`.
    ///
    /// Useful with an identifier provider, when a changed copy of an item
    /// arrives from elsewhere. Returns `false` if no such item was held.
    pub fn refresh_item(&self, item: T) -> Result<bool> {
        let equality = self.equality()?;
        let probe = item.clone();
        let matches = equality.matcher(&probe)?;
        self.component()
            .track_refresh(|| self.provider.replace_where(|candidate| matches(candidate), item))
    }

    // Local filtering and sorting

    /// Replaces the component filter with `filter`.
    pub fn set_filter(&self, filter: ItemFilter<T>) -> Result<()> {
        self.ensure_current()?;
        self.component().set_filter(filter)
    }

    /// Narrows the current filter with `filter`.
    pub fn add_filter(&self, filter: ItemFilter<T>) -> Result<()> {
        self.ensure_current()?;
        let combined = match self.component().filter() {
            Some(current) => current.downcast::<ItemFilter<T>>()?.and(&filter),
            None => filter,
        };
        self.component().set_filter(combined)
    }

    /// Removes every filter.
    pub fn remove_filters(&self) -> Result<()> {
        self.ensure_current()?;
        self.component().clear_filter()
    }

    /// Sorts by `orders`.
    ///
    /// Every property must have a comparator registered on the provider,
    /// otherwise [`DataError::UnknownSortProperty`] is returned and the
    /// current sorting is kept.
    pub fn set_sort_orders(&self, orders: Vec<SortOrder>) -> Result<()> {
        self.ensure_current()?;
        if let Some(unknown) = orders
            .iter()
            .find(|order| !self.provider.has_sort_property(order.property()))
        {
            return Err(DataError::unknown_sort_property(unknown.property()));
        }
        self.component().set_sort_orders(orders)
    }

    /// Returns to the list's own order.
    pub fn remove_sorting(&self) -> Result<()> {
        self.ensure_current()?;
        self.component().set_sort_orders(Vec::new())
    }
}

impl<T> fmt::Debug for ListDataView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListDataView")
            .field("view", &self.view)
            .field("provider", &self.provider)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Task {
        id: u32,
        title: String,
        done: bool,
    }

    fn task(id: u32, title: &str, done: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            done,
        }
    }

    fn tasks() -> (DataComponent<Task>, ListDataView<Task>) {
        let component = DataComponent::new();
        let provider = ListDataProvider::new(vec![
            task(1, "write", false),
            task(2, "review", true),
            task(3, "ship", false),
        ])
        .with_sort_key("title", |t: &Task| t.title.clone());
        let view = component
            .set_list_data_provider(Arc::new(provider))
            .unwrap();
        view.set_identifier_provider(IdentifierProvider::new(|t: &Task| t.id))
            .unwrap();
        (component, view)
    }

    fn ids(view: &ListDataView<Task>) -> Vec<u32> {
        view.items()
            .unwrap()
            .to_vec()
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect()
    }

    #[test]
    fn test_add_item_is_identity_aware() {
        let (_, view) = tasks();

        assert!(!view.add_item(task(1, "renamed", true)).unwrap());
        assert!(view.add_item(task(4, "deploy", false)).unwrap());
        assert_eq!(ids(&view), vec![1, 2, 3, 4]);

        let added = view
            .add_items(vec![task(4, "dup", false), task(5, "a", false), task(5, "b", false)])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(view.size().unwrap(), 5);
    }

    #[test]
    fn test_mutation_recomputes_size_once() {
        let (component, view) = tasks();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        view.set_filter(ItemFilter::new(move |_: &Task| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            true
        }))
        .unwrap();

        calls.store(0, Ordering::SeqCst);
        assert!(view.add_item(task(4, "deploy", false)).unwrap());
        // One filter pass over the four held items.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(component.last_size(), Some(4));
    }

    #[test]
    fn test_mutation_reports_size_error() {
        let (component, view) = tasks();
        assert!(component.set_filter(7u8).is_err());

        let err = view.add_item(task(4, "deploy", false)).unwrap_err();
        assert!(matches!(err, DataError::FilterTypeMismatch { .. }));
        assert_eq!(view.provider().len(), 4);

        // Nothing removed, nothing recomputed.
        assert!(!view.remove_item(&task(9, "", false)).unwrap());
    }

    #[test]
    fn test_positional_insert() {
        let (_, view) = tasks();

        view.add_item_before(task(9, "plan", false), &task(1, "", false))
            .unwrap();
        assert_eq!(ids(&view), vec![9, 1, 2, 3]);

        // Moving an existing item.
        view.add_item_after(task(9, "plan", false), &task(3, "", false))
            .unwrap();
        assert_eq!(ids(&view), vec![1, 2, 3, 9]);

        let err = view
            .add_item_after(task(7, "x", false), &task(42, "", false))
            .unwrap_err();
        assert!(matches!(err, DataError::ItemNotFound));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_remove_and_refresh() {
        let (_, view) = tasks();
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sizes_clone = sizes.clone();
        let _registration = view
            .add_size_change_listener(move |event| sizes_clone.lock().push(event.size()))
            .unwrap();

        assert!(view.refresh_item(task(2, "review again", false)).unwrap());
        assert_eq!(
            view.item(1).unwrap().map(|t| t.title),
            Some("review again".to_string())
        );

        assert!(view.remove_item(&task(1, "changed", false)).unwrap());
        assert!(!view.remove_item(&task(1, "", false)).unwrap());
        assert_eq!(view.remove_items(&[task(2, "", false), task(3, "", false)]).unwrap(), 2);

        assert_eq!(*sizes.lock(), vec![2, 0]);
    }

    #[test]
    fn test_navigation_in_sorted_set() {
        let (_, view) = tasks();
        view.set_sort_orders(vec![SortOrder::asc("title")]).unwrap();

        // review, ship, write
        assert_eq!(view.next_item(&task(2, "", false)).unwrap().map(|t| t.id), Some(3));
        assert_eq!(view.previous_item(&task(3, "", false)).unwrap().map(|t| t.id), Some(2));
        assert_eq!(view.previous_item(&task(2, "", false)).unwrap(), None);
        assert_eq!(view.next_item(&task(1, "", false)).unwrap(), None);
        assert_eq!(view.next_item(&task(8, "", false)).unwrap(), None);

        view.remove_sorting().unwrap();
        assert_eq!(ids(&view), vec![1, 2, 3]);
    }

    #[test]
    fn test_filters_compose() {
        let (component, view) = tasks();

        view.set_filter(ItemFilter::new(|t: &Task| !t.done)).unwrap();
        view.add_filter(ItemFilter::new(|t: &Task| t.id > 1)).unwrap();
        assert_eq!(ids(&view), vec![3]);
        assert!(!view.contains(&task(1, "write", false)).unwrap());

        view.remove_filters().unwrap();
        assert_eq!(view.size().unwrap(), 3);
        assert!(component.filter_type_name().is_none());
    }

    #[test]
    fn test_unknown_sort_property_keeps_sorting() {
        let (component, view) = tasks();
        view.set_sort_orders(vec![SortOrder::desc("title")]).unwrap();

        let err = view
            .set_sort_orders(vec![SortOrder::asc("priority")])
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownSortProperty { .. }));
        assert_eq!(component.sort_orders(), vec![SortOrder::desc("title")]);
    }

    #[test]
    fn test_stale_after_rebind() {
        let (component, view) = tasks();
        let replacement = component.set_items(vec![task(10, "new", false)]).unwrap();

        assert!(matches!(view.size(), Err(DataError::StaleView)));
        assert!(matches!(
            view.add_item(task(11, "late", false)),
            Err(DataError::StaleView)
        ));
        assert_eq!(replacement.size().unwrap(), 1);
        assert_eq!(view.provider().len(), 3);
    }
}
