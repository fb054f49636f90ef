//! Backend-delegating data provider.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{DataProvider, Items, ProviderSignals};
use crate::error::{DataError, Result};
use crate::identity::{IdentifierProvider, ItemIdentity};
use crate::query::{BackendQuery, Query};

/// Type alias for a fetch callback.
///
/// Must return at most `query.limit()` items.
pub type FetchCallback<T, F> = Arc<dyn Fn(&Query<F>) -> Result<Vec<T>> + Send + Sync>;

/// Type alias for a count callback.
///
/// Receives the query without its window.
pub type CountCallback<F> = Arc<dyn Fn(&Query<F>) -> Result<i64> + Send + Sync>;

/// A provider that delegates counting and fetching to callbacks.
///
/// This is the usual way to put a remote service behind a data view: the
/// callbacks run the backend request synchronously and translate its
/// failures into [`DataError::Provider`]. Filtering and sorting are pushed
/// down to the backend; the provider never looks at items itself.
///
/// A fetch callback returning more items than requested is a contract
/// violation and fails the fetch with [`DataError::TooManyItems`].
///
/// Backend rows usually carry a primary key. Registering it with
/// [`with_identifier_provider`](Self::with_identifier_provider) makes every
/// component bound to the provider compare items by that key unless the
/// component sets an identifier provider of its own.
///
/// # Example
///
/// ```
/// use horizon_data::{CallbackDataProvider, DataProvider, Query};
///
/// let rows: Vec<u32> = (0..1000).collect();
/// let backend = rows.clone();
/// let provider = CallbackDataProvider::new(
///     move |query: &Query<u32>| {
///         let min = query.filter().copied().unwrap_or(0);
///         Ok(query.page(backend.iter().copied().filter(|n| *n >= min)).collect())
///     },
///     move |query: &Query<u32>| {
///         let min = query.filter().copied().unwrap_or(0);
///         Ok(rows.iter().filter(|n| **n >= min).count() as i64)
///     },
/// );
///
/// assert_eq!(provider.size(&Query::new().with_filter(990)).unwrap(), 10);
/// ```
pub struct CallbackDataProvider<T, F> {
    fetch: FetchCallback<T, F>,
    count: CountCallback<F>,
    identity: Option<Arc<dyn ItemIdentity<T>>>,
    signals: ProviderSignals<T>,
}

impl<T, F> CallbackDataProvider<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a provider from fetch and count callbacks.
    pub fn new<Fe, Co>(fetch: Fe, count: Co) -> Self
    where
        Fe: Fn(&Query<F>) -> Result<Vec<T>> + Send + Sync + 'static,
        Co: Fn(&Query<F>) -> Result<i64> + Send + Sync + 'static,
    {
        Self {
            fetch: Arc::new(fetch),
            count: Arc::new(count),
            identity: None,
            signals: ProviderSignals::new(),
        }
    }

    /// Identifies items by the key `provider` derives.
    pub fn with_identifier_provider<K>(mut self, provider: IdentifierProvider<T, K>) -> Self
    where
        K: PartialEq + 'static,
    {
        self.identity = Some(Arc::new(provider));
        self
    }
}

impl<T, F> CallbackDataProvider<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Serialize + Send + Sync + 'static,
{
    /// Creates a provider whose callbacks receive the query in serialized
    /// form, with the filter converted to JSON.
    pub fn from_backend<Fe, Co>(fetch: Fe, count: Co) -> Self
    where
        Fe: Fn(&BackendQuery) -> Result<Vec<T>> + Send + Sync + 'static,
        Co: Fn(&BackendQuery) -> Result<i64> + Send + Sync + 'static,
    {
        Self::new(
            move |query: &Query<F>| fetch(&query.to_backend()?),
            move |query: &Query<F>| count(&query.to_backend()?),
        )
    }
}

impl<T, F> DataProvider<T> for CallbackDataProvider<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    type Filter = F;

    fn size(&self, query: &Query<F>) -> Result<i64> {
        (self.count)(&query.without_window())
    }

    fn fetch(&self, query: &Query<F>) -> Result<Items<'_, T>> {
        let items = (self.fetch)(query)?;
        if items.len() > query.limit() {
            tracing::warn!(
                target: horizon_data_core::logging::targets::PROVIDER,
                requested = query.limit(),
                returned = items.len(),
                "fetch callback ignored the query limit"
            );
            return Err(DataError::TooManyItems {
                requested: query.limit(),
                returned: items.len(),
            });
        }
        Ok(Box::new(items.into_iter()))
    }

    fn signals(&self) -> &ProviderSignals<T> {
        &self.signals
    }

    fn identity(&self) -> Option<Arc<dyn ItemIdentity<T>>> {
        self.identity.clone()
    }
}

impl<T, F> fmt::Debug for CallbackDataProvider<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDataProvider")
            .field("filter", &std::any::type_name::<F>())
            .field("identity", &self.identity.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortOrder;
    use parking_lot::Mutex;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct StatusFilter {
        status: String,
    }

    #[test]
    fn test_size_receives_query_without_window() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let provider = CallbackDataProvider::<u32, ()>::new(
            |_| Ok(Vec::new()),
            move |query| {
                seen_clone.lock().push((query.offset(), query.limit()));
                Ok(7)
            },
        );

        let query = Query::new().with_window(20, 10);
        assert_eq!(provider.size(&query).unwrap(), 7);
        assert_eq!(*seen.lock(), vec![(0, usize::MAX)]);
    }

    #[test]
    fn test_fetch_over_limit_is_rejected() {
        let provider = CallbackDataProvider::<u32, ()>::new(|_| Ok(vec![1, 2, 3]), |_| Ok(3));

        let err = provider
            .fetch(&Query::new().with_window(0, 2))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DataError::TooManyItems {
                requested: 2,
                returned: 3
            }
        ));
        assert_eq!(provider.fetch(&Query::new()).unwrap().count(), 3);
    }

    #[test]
    fn test_backend_errors_propagate() {
        let provider = CallbackDataProvider::<u32, ()>::new(
            |_| Err(DataError::provider("service unavailable")),
            |_| Err(DataError::provider("service unavailable")),
        );

        assert!(matches!(
            provider.size(&Query::new()),
            Err(DataError::Provider(_))
        ));
        assert!(provider.fetch(&Query::new()).is_err());
    }

    #[test]
    fn test_from_backend_serializes_filter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let provider = CallbackDataProvider::<String, StatusFilter>::from_backend(
            move |query| {
                seen_clone.lock().push(query.clone());
                Ok(vec!["ticket-1".to_string()])
            },
            |query| Ok(if query.filter.is_some() { 1 } else { 10 }),
        );

        let query = Query::new()
            .with_filter(StatusFilter {
                status: "open".into(),
            })
            .with_sort_orders(vec![SortOrder::desc("updated")])
            .with_window(0, 25);

        assert_eq!(provider.size(&query).unwrap(), 1);
        assert_eq!(provider.size(&Query::new()).unwrap(), 10);
        assert_eq!(provider.fetch(&query).unwrap().count(), 1);

        let seen = seen.lock();
        assert_eq!(seen[0].limit, Some(25));
        assert_eq!(seen[0].filter, Some(serde_json::json!({ "status": "open" })));
        assert_eq!(seen[0].sort_orders, vec![SortOrder::desc("updated")]);
    }
}
