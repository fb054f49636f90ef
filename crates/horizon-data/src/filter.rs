//! Filter values.
//!
//! Components keep their current filter as an [`AnyFilter`]: the component
//! does not know which provider it will be bound to next, so the concrete
//! filter type is only checked when a query reaches a provider. A mismatch
//! is reported as [`DataError::FilterTypeMismatch`], never treated as
//! "no filter".
//!
//! [`ItemFilter`] is the filter type of in-memory providers: a shared
//! predicate over items.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{DataError, Result};

/// A type-erased, cloneable filter value.
#[derive(Clone)]
pub struct AnyFilter {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AnyFilter {
    /// Wraps a concrete filter value.
    pub fn new<F>(filter: F) -> Self
    where
        F: Send + Sync + 'static,
    {
        Self {
            value: Arc::new(filter),
            type_name: type_name::<F>(),
        }
    }

    /// Name of the wrapped filter type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is an `F`.
    pub fn is<F: 'static>(&self) -> bool {
        self.value.is::<F>()
    }

    /// Borrows the wrapped value as an `F`.
    pub fn downcast_ref<F: 'static>(&self) -> Result<&F> {
        self.value
            .downcast_ref::<F>()
            .ok_or_else(|| DataError::filter_mismatch(type_name::<F>(), self.type_name))
    }

    /// Clones the wrapped value out as an `F`.
    pub fn downcast<F: Clone + 'static>(&self) -> Result<F> {
        self.downcast_ref::<F>().cloned()
    }
}

impl fmt::Debug for AnyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyFilter").field(&self.type_name).finish()
    }
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A shared predicate used to filter items in memory.
///
/// Two `ItemFilter`s are equal only if they are clones of the same
/// predicate, so queries carrying them stay comparable.
///
/// # Example
///
/// ```
/// use horizon_data::ItemFilter;
///
/// let positive = ItemFilter::new(|n: &i32| *n > 0);
/// let even = ItemFilter::new(|n: &i32| n % 2 == 0);
/// let both = positive.and(&even);
///
/// assert!(both.test(&4));
/// assert!(!both.test(&3));
/// assert!(!both.test(&-2));
/// ```
pub struct ItemFilter<T> {
    predicate: Predicate<T>,
}

impl<T: 'static> ItemFilter<T> {
    /// Creates a filter from a predicate.
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// A filter that accepts every item.
    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    /// Returns `true` if `item` passes the filter.
    pub fn test(&self, item: &T) -> bool {
        (self.predicate)(item)
    }

    /// Items passing both filters.
    pub fn and(&self, other: &Self) -> Self {
        let (a, b) = (self.predicate.clone(), other.predicate.clone());
        Self::new(move |item| a(item) && b(item))
    }

    /// Items passing either filter.
    pub fn or(&self, other: &Self) -> Self {
        let (a, b) = (self.predicate.clone(), other.predicate.clone());
        Self::new(move |item| a(item) || b(item))
    }

    /// Items rejected by this filter.
    pub fn negate(&self) -> Self {
        let a = self.predicate.clone();
        Self::new(move |item| !a(item))
    }
}

impl<T> Clone for ItemFilter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> PartialEq for ItemFilter<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl<T> fmt::Debug for ItemFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemFilter")
            .field("item", &type_name::<T>())
            .finish_non_exhaustive()
    }
}
