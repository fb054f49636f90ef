//! The component that owns a data binding.
//!
//! A [`DataComponent`] is the stable half of the data layer. It holds the
//! current provider binding together with everything that outlives a
//! provider swap: filter, sort orders, equality strategy, and the table of
//! size-change listeners. Views are thin handles onto a component; swapping
//! the provider hands out a new view but keeps every listener attached.
//!
//! # Lifecycle
//!
//! ```text
//! Unbound --set_*provider--> Bound(p) --set_*provider--> Bound(p') --discard--> Discarded
//! ```
//!
//! Reads before the first binding fail with [`DataError::Unbound`]; every
//! operation after [`DataComponent::discard`] fails with
//! [`DataError::Discarded`].

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Weak};

use horizon_data_core::logging::{span_names, targets};
use horizon_data_core::{Property, Registration, Signal};
use parking_lot::{Mutex, RwLock};

use crate::config::DataViewConfig;
use crate::error::{DataError, Result};
use crate::event::{ComponentId, SizeChangeEvent};
use crate::filter::AnyFilter;
use crate::identity::EqualityStrategy;
use crate::list_view::ListDataView;
use crate::provider::{
    DataChangeEvent, DataProvider, ListDataProvider, SharedProvider, provider_addr,
};
use crate::query::{Query, SortOrder};
use crate::view::DataView;

/// Owner of a provider binding and its size-change listeners.
///
/// Cloning a component yields another handle to the same state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use horizon_data::{DataComponent, ItemFilter};
///
/// let component = DataComponent::new();
/// let view = component.set_items(vec![1, 2, 3, 4]).unwrap();
///
/// let sizes = Arc::new(Mutex::new(Vec::new()));
/// let sizes_clone = sizes.clone();
/// view.add_size_change_listener(move |event| sizes_clone.lock().push(event.size()))
///     .unwrap();
///
/// component.set_filter(ItemFilter::new(|n: &i32| *n > 2)).unwrap();
/// assert_eq!(*sizes.lock(), vec![2]);
/// ```
pub struct DataComponent<T> {
    inner: Arc<ComponentInner<T>>,
}

struct ComponentInner<T> {
    id: ComponentId,
    config: DataViewConfig,
    state: RwLock<ComponentState<T>>,
    size_changed: Arc<Signal<SizeChangeEvent>>,
    last_size: Property<Option<usize>>,
    // Outcome of the latest size recomputation triggered by the provider.
    notified_error: Mutex<Option<DataError>>,
}

struct ComponentState<T> {
    binding: Option<ProviderBinding<T>>,
    filter: Option<AnyFilter>,
    sort_orders: Vec<SortOrder>,
    equality: EqualityStrategy<T>,
    discarded: bool,
}

struct ProviderBinding<T> {
    provider: SharedProvider<T>,
    subscription: Registration,
}

/// Everything one read needs, captured under a single lock acquisition.
pub(crate) struct Snapshot<T> {
    pub(crate) provider: SharedProvider<T>,
    pub(crate) query: Query<AnyFilter>,
    pub(crate) equality: EqualityStrategy<T>,
}

impl<T> Clone for DataComponent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> DataComponent<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates an unbound component with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(DataViewConfig::default())
    }

    /// Creates an unbound component with the given configuration.
    pub fn with_config(config: DataViewConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: DataViewConfig) -> Self {
        Self {
            inner: Arc::new(ComponentInner {
                id: ComponentId::next(),
                config,
                state: RwLock::new(ComponentState {
                    binding: None,
                    filter: None,
                    sort_orders: Vec::new(),
                    equality: EqualityStrategy::Structural,
                    discarded: false,
                }),
                size_changed: Arc::new(Signal::new()),
                last_size: Property::new(None),
                notified_error: Mutex::new(None),
            }),
        }
    }

    /// The identity carried by this component's events.
    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    /// The configuration shared by all views of this component.
    pub fn config(&self) -> &DataViewConfig {
        &self.inner.config
    }

    /// Binds a fixed list of items, wrapped in a [`ListDataProvider`].
    pub fn set_items(&self, items: Vec<T>) -> Result<ListDataView<T>> {
        self.set_list_data_provider(Arc::new(ListDataProvider::new(items)))
    }

    /// Binds an in-memory provider and returns a view that can mutate it.
    pub fn set_list_data_provider(
        &self,
        provider: Arc<ListDataProvider<T>>,
    ) -> Result<ListDataView<T>> {
        self.bind(provider.clone())?;
        Ok(ListDataView::new(self.clone(), provider))
    }

    /// Binds any provider.
    ///
    /// The binding takes effect even when the first size computation fails,
    /// for example because the component's filter does not fit the new
    /// provider; the error is returned and the filter can be fixed
    /// afterwards.
    pub fn set_data_provider<P>(&self, provider: Arc<P>) -> Result<DataView<T>>
    where
        P: DataProvider<T> + 'static,
    {
        self.bind(provider)?;
        Ok(DataView::new(self.clone()))
    }

    /// A view of the current binding.
    pub fn data_view(&self) -> Result<DataView<T>> {
        self.provider()?;
        Ok(DataView::new(self.clone()))
    }

    /// Returns `true` once a provider has been bound.
    pub fn is_bound(&self) -> bool {
        self.inner.state.read().binding.is_some()
    }

    /// Sets the filter passed to the provider with every query.
    ///
    /// The filter must be of the bound provider's filter type; a mismatch
    /// is reported as [`DataError::FilterTypeMismatch`] by the size
    /// recomputation this triggers.
    pub fn set_filter<F>(&self, filter: F) -> Result<()>
    where
        F: Clone + Send + Sync + 'static,
    {
        self.update_state(|state| state.filter = Some(AnyFilter::new(filter)))
    }

    /// Removes the filter.
    pub fn clear_filter(&self) -> Result<()> {
        self.update_state(|state| state.filter = None)
    }

    /// Type name of the current filter, if any.
    pub fn filter_type_name(&self) -> Option<&'static str> {
        self.inner
            .state
            .read()
            .filter
            .as_ref()
            .map(AnyFilter::type_name)
    }

    /// Sets the sort orders passed to the provider with every query.
    pub fn set_sort_orders(&self, sort_orders: Vec<SortOrder>) -> Result<()> {
        self.update_state(|state| state.sort_orders = sort_orders)
    }

    /// Current sort orders.
    pub fn sort_orders(&self) -> Vec<SortOrder> {
        self.inner.state.read().sort_orders.clone()
    }

    /// Registers a listener for size changes.
    ///
    /// Listeners belong to the component, not to the provider, and stay
    /// registered across provider swaps. No event is replayed on
    /// registration.
    pub fn add_size_change_listener<F>(&self, listener: F) -> Result<Registration>
    where
        F: Fn(&SizeChangeEvent) + Send + Sync + 'static,
    {
        if self.inner.state.read().discarded {
            return Err(DataError::Discarded);
        }
        Ok(self.inner.size_changed.connect_registration(listener))
    }

    /// Number of registered size-change listeners.
    pub fn size_change_listener_count(&self) -> usize {
        self.inner.size_changed.connection_count()
    }

    /// Last size reported to listeners, if one has been computed.
    pub fn last_size(&self) -> Option<usize> {
        self.inner.last_size.get()
    }

    /// Discards the component.
    ///
    /// The provider subscription is cancelled and every size-change
    /// listener is dropped. All further operations fail with
    /// [`DataError::Discarded`]. Discarding twice is a no-op.
    pub fn discard(&self) {
        let binding = {
            let mut state = self.inner.state.write();
            if state.discarded {
                return;
            }
            state.discarded = true;
            state.binding.take()
        };
        if let Some(binding) = binding {
            binding.subscription.cancel();
        }
        self.inner.size_changed.disconnect_all();
        self.inner.last_size.reset(None);
        tracing::debug!(target: targets::COMPONENT, component = %self.inner.id, "component discarded");
    }

    /// Returns `true` after [`discard`](Self::discard).
    pub fn is_discarded(&self) -> bool {
        self.inner.state.read().discarded
    }

    pub(crate) fn set_equality(&self, equality: EqualityStrategy<T>) -> Result<()> {
        let mut state = self.inner.state.write();
        if state.discarded {
            return Err(DataError::Discarded);
        }
        state.equality = equality;
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Result<Snapshot<T>> {
        self.inner.snapshot()
    }

    pub(crate) fn filter(&self) -> Option<AnyFilter> {
        self.inner.state.read().filter.clone()
    }

    pub(crate) fn provider(&self) -> Result<SharedProvider<T>> {
        let state = self.inner.state.read();
        if state.discarded {
            return Err(DataError::Discarded);
        }
        state
            .binding
            .as_ref()
            .map(|binding| binding.provider.clone())
            .ok_or(DataError::Unbound)
    }

    /// Fails with [`DataError::StaleView`] unless the component is bound to
    /// the provider at `addr`.
    pub(crate) fn ensure_bound_to(&self, addr: *const ()) -> Result<()> {
        if provider_addr(&self.provider()?) == addr {
            Ok(())
        } else {
            Err(DataError::StaleView)
        }
    }

    pub(crate) fn current_size(&self) -> Result<usize> {
        self.inner.current_size()
    }

    /// Runs a provider mutation and returns the error the size
    /// recomputation it triggered ran into, if any.
    ///
    /// A mutation that emits no change notification cannot fail here.
    pub(crate) fn track_refresh<R>(&self, mutate: impl FnOnce() -> R) -> Result<R> {
        self.inner.notified_error.lock().take();
        let value = mutate();
        match self.inner.notified_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }

    fn bind(&self, provider: SharedProvider<T>) -> Result<()> {
        let weak: Weak<ComponentInner<T>> = Arc::downgrade(&self.inner);
        let subscription = provider.erased_signals().data_changed.connect_registration(
            move |event: &DataChangeEvent<T>| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if let DataChangeEvent::ItemRefreshed(_) = event {
                    tracing::trace!(target: targets::COMPONENT, component = %inner.id, "item refreshed");
                }
                let refreshed = inner.refresh_size();
                if let Err(err) = &refreshed {
                    tracing::warn!(
                        target: targets::COMPONENT,
                        component = %inner.id,
                        error = %err,
                        "size recomputation after data change failed"
                    );
                }
                *inner.notified_error.lock() = refreshed.err();
            },
        );

        let in_memory = provider.erased_in_memory();
        let filter_type = provider.filter_type_name();
        let previous = {
            let mut state = self.inner.state.write();
            if state.discarded {
                drop(state);
                subscription.cancel();
                return Err(DataError::Discarded);
            }
            state.binding.replace(ProviderBinding {
                provider,
                subscription,
            })
        };
        if let Some(previous) = previous {
            previous.subscription.cancel();
        }

        tracing::debug!(
            target: targets::COMPONENT,
            component = %self.inner.id,
            in_memory,
            filter_type,
            "data provider bound"
        );
        self.inner.refresh_size()
    }

    fn update_state(&self, f: impl FnOnce(&mut ComponentState<T>)) -> Result<()> {
        let bound = {
            let mut state = self.inner.state.write();
            if state.discarded {
                return Err(DataError::Discarded);
            }
            f(&mut state);
            state.binding.is_some()
        };
        if bound {
            self.inner.refresh_size()
        } else {
            Ok(())
        }
    }
}

impl<T: 'static> ComponentInner<T> {
    fn snapshot(&self) -> Result<Snapshot<T>> {
        let state = self.state.read();
        if state.discarded {
            return Err(DataError::Discarded);
        }
        let binding = state.binding.as_ref().ok_or(DataError::Unbound)?;
        // The provider's identity stands in for structural equality.
        let equality = match (&state.equality, binding.provider.erased_identity()) {
            (EqualityStrategy::Structural, Some(identity)) => EqualityStrategy::Identifier(identity),
            (equality, _) => equality.clone(),
        };
        Ok(Snapshot {
            provider: binding.provider.clone(),
            query: Query::new()
                .with_optional_filter(state.filter.clone())
                .with_sort_orders(state.sort_orders.clone()),
            equality,
        })
    }

    fn current_size(&self) -> Result<usize> {
        let Snapshot {
            provider, query, ..
        } = self.snapshot()?;
        let size = provider.erased_size(&query)?;
        usize::try_from(size).map_err(|_| DataError::NegativeSize { size })
    }

    /// Recomputes the size and notifies listeners if it differs from the
    /// last reported one.
    fn refresh_size(&self) -> Result<()> {
        let _span =
            tracing::trace_span!(target: targets::COMPONENT, span_names::SIZE_REFRESH, component = %self.id)
                .entered();

        let size = self.current_size()?;
        if self.last_size.set(Some(size)) {
            tracing::debug!(target: targets::COMPONENT, component = %self.id, size, "size changed");
            self.size_changed.emit(SizeChangeEvent::new(self.id, size));
        }
        Ok(())
    }
}

impl<T> Drop for ComponentInner<T> {
    fn drop(&mut self) {
        if let Some(binding) = self.state.get_mut().binding.take() {
            binding.subscription.cancel();
        }
    }
}

impl<T> Default for DataComponent<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DataComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("DataComponent")
            .field("id", &self.inner.id)
            .field("item", &type_name::<T>())
            .field("bound", &state.binding.is_some())
            .field("filter", &state.filter)
            .field("sort_orders", &state.sort_orders)
            .field("equality", &state.equality)
            .field("discarded", &state.discarded)
            .finish()
    }
}

static_assertions::assert_impl_all!(DataComponent<String>: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ItemFilter;
    use crate::provider::CallbackDataProvider;
    use parking_lot::Mutex;

    fn recorder(component: &DataComponent<i32>) -> (Arc<Mutex<Vec<usize>>>, Registration) {
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sizes_clone = sizes.clone();
        let registration = component
            .add_size_change_listener(move |event| sizes_clone.lock().push(event.size()))
            .unwrap();
        (sizes, registration)
    }

    #[test]
    fn test_unbound_component() {
        let component = DataComponent::<i32>::new();
        assert!(!component.is_bound());
        assert!(matches!(component.data_view(), Err(DataError::Unbound)));
        assert!(matches!(component.current_size(), Err(DataError::Unbound)));

        // Configuration before binding is allowed.
        component
            .set_filter(ItemFilter::new(|n: &i32| *n > 1))
            .unwrap();
        component.set_items(vec![1, 2, 3]).unwrap();
        assert_eq!(component.current_size().unwrap(), 2);
    }

    #[test]
    fn test_first_size_counts_as_change() {
        let component = DataComponent::<i32>::new();
        let (sizes, _registration) = recorder(&component);

        component.set_items(vec![1, 2, 3]).unwrap();
        assert_eq!(*sizes.lock(), vec![3]);
        assert_eq!(component.last_size(), Some(3));
    }

    #[test]
    fn test_filter_and_sort_changes() {
        let component = DataComponent::<i32>::new();
        component.set_items(vec![1, 2, 3, 4]).unwrap();
        let (sizes, _registration) = recorder(&component);

        component
            .set_filter(ItemFilter::new(|n: &i32| n % 2 == 0))
            .unwrap();
        component.set_sort_orders(Vec::new()).unwrap();
        component.clear_filter().unwrap();

        assert_eq!(*sizes.lock(), vec![2, 4]);
        assert!(component.filter_type_name().is_none());
    }

    #[test]
    fn test_provider_mutation_notifies() {
        let component = DataComponent::<i32>::new();
        let provider = Arc::new(ListDataProvider::new(vec![1, 2]));
        component.set_list_data_provider(provider.clone()).unwrap();
        let (sizes, _registration) = recorder(&component);

        provider.push(3);
        provider.set_items(vec![7, 8, 9]);
        provider.remove_where(|n| *n == 7);

        assert_eq!(*sizes.lock(), vec![3, 2]);
    }

    #[test]
    fn test_swap_cancels_old_subscription() {
        let component = DataComponent::<i32>::new();
        let first = Arc::new(ListDataProvider::new(vec![1, 2]));
        component.set_list_data_provider(first.clone()).unwrap();
        assert_eq!(first.signals().data_changed.connection_count(), 1);

        let second = Arc::new(ListDataProvider::new(vec![1]));
        component.set_list_data_provider(second.clone()).unwrap();
        assert_eq!(first.signals().data_changed.connection_count(), 0);
        assert_eq!(second.signals().data_changed.connection_count(), 1);

        let (sizes, _registration) = recorder(&component);
        first.push(3);
        assert!(sizes.lock().is_empty());
        second.push(3);
        assert_eq!(*sizes.lock(), vec![2]);
    }

    #[test]
    fn test_negative_size_is_reported() {
        let component = DataComponent::<i32>::new();
        let provider = Arc::new(CallbackDataProvider::<i32, ()>::new(
            |_| Ok(Vec::new()),
            |_| Ok(-1),
        ));

        let err = component.set_data_provider(provider).err().unwrap();
        assert!(matches!(err, DataError::NegativeSize { size: -1 }));
        assert!(err.is_contract_violation());
        assert!(component.is_bound());
        assert_eq!(component.last_size(), None);
    }

    #[test]
    fn test_discard() {
        let component = DataComponent::<i32>::new();
        let provider = Arc::new(ListDataProvider::new(vec![1, 2]));
        component.set_list_data_provider(provider.clone()).unwrap();
        let (sizes, registration) = recorder(&component);

        component.discard();
        component.discard();

        assert!(component.is_discarded());
        assert_eq!(component.size_change_listener_count(), 0);
        assert_eq!(provider.signals().data_changed.connection_count(), 0);
        assert!(matches!(component.data_view(), Err(DataError::Discarded)));
        assert!(matches!(
            component.set_filter(ItemFilter::new(|_: &i32| true)),
            Err(DataError::Discarded)
        ));
        assert!(matches!(
            component.set_items(vec![1]),
            Err(DataError::Discarded)
        ));
        assert!(component.add_size_change_listener(|_| {}).is_err());

        provider.push(3);
        assert!(sizes.lock().is_empty());
        registration.cancel();
    }

    #[test]
    fn test_with_config_validates() {
        let err = DataComponent::<i32>::with_config(DataViewConfig::default().with_page_size(0))
            .err()
            .unwrap();
        assert!(err.is_configuration_error());

        let component =
            DataComponent::<i32>::with_config(DataViewConfig::default().with_page_size(2)).unwrap();
        assert_eq!(component.config().page_size, 2);
    }

    #[test]
    fn test_dropped_component_ignores_provider_changes() {
        let provider = Arc::new(ListDataProvider::new(vec![1]));
        {
            let component = DataComponent::<i32>::new();
            component.set_list_data_provider(provider.clone()).unwrap();
        }
        assert_eq!(provider.signals().data_changed.connection_count(), 0);
        provider.push(2);
        assert_eq!(provider.len(), 2);
    }
}
