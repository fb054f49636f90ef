//! Item identity.
//!
//! Every equality decision the data layer makes ("is this item in the
//! view?", "which stored item does this refreshed copy replace?") goes
//! through one [`EqualityStrategy`]. By default items are compared
//! structurally with `PartialEq`; an [`IdentifierProvider`] switches the
//! comparison to a derived key, so a mutable item reloaded from a backend
//! is still recognized as the same entity after its fields changed.

use std::fmt;
use std::sync::Arc;

use crate::error::{DataError, Result};

/// Derives a stable identity key from an item.
///
/// The function must be total, deterministic and free of side effects.
///
/// # Example
///
/// ```
/// use horizon_data::IdentifierProvider;
///
/// #[derive(Clone, PartialEq)]
/// struct Person { id: u64, name: String }
///
/// let by_id = IdentifierProvider::new(|p: &Person| p.id);
/// let stale = Person { id: 1, name: "A".into() };
/// let fresh = Person { id: 1, name: "B".into() };
/// assert_eq!(by_id.identify(&stale), by_id.identify(&fresh));
/// ```
pub struct IdentifierProvider<T, K> {
    key: Arc<dyn Fn(&T) -> K + Send + Sync>,
}

impl<T, K> IdentifierProvider<T, K> {
    /// Creates an identifier provider from a key function.
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Arc::new(key) }
    }

    /// Returns the identifier of `item`.
    pub fn identify(&self, item: &T) -> K {
        (self.key)(item)
    }
}

impl<T, K> Clone for IdentifierProvider<T, K> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
        }
    }
}

impl<T, K> fmt::Debug for IdentifierProvider<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierProvider")
            .field("key", &std::any::type_name::<K>())
            .finish()
    }
}

/// Matches stored items against one probe item.
pub type ItemMatcher<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// Key-based identity with the key type erased.
///
/// Implemented by [`IdentifierProvider`]; stored behind
/// [`EqualityStrategy::Identifier`].
pub trait ItemIdentity<T>: Send + Sync {
    /// Builds a predicate matching items with the same key as `item`.
    fn matcher<'a>(&'a self, item: &T) -> Result<ItemMatcher<'a, T>>;

    /// Returns `true` if `a` and `b` have the same key.
    fn same(&self, a: &T, b: &T) -> bool;
}

impl<T, K> ItemIdentity<T> for IdentifierProvider<T, K>
where
    T: 'static,
    K: PartialEq + 'static,
{
    fn matcher<'a>(&'a self, item: &T) -> Result<ItemMatcher<'a, T>> {
        let key = self.identify(item);
        if self.identify(item) != key {
            return Err(DataError::NonDeterministicIdentifier);
        }
        Ok(Box::new(move |other: &T| self.identify(other) == key))
    }

    fn same(&self, a: &T, b: &T) -> bool {
        self.identify(a) == self.identify(b)
    }
}

/// How two items are decided to be the same item.
pub enum EqualityStrategy<T> {
    /// `PartialEq` on the items themselves.
    Structural,
    /// Equality of keys derived by an identifier provider.
    Identifier(Arc<dyn ItemIdentity<T>>),
}

impl<T> EqualityStrategy<T> {
    /// Key-based identity from an identifier provider.
    pub fn identifier<K>(provider: IdentifierProvider<T, K>) -> Self
    where
        T: 'static,
        K: PartialEq + 'static,
    {
        Self::Identifier(Arc::new(provider))
    }

    /// Returns `true` for structural equality.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural)
    }
}

impl<T: PartialEq> EqualityStrategy<T> {
    /// Returns `true` if `a` and `b` are the same item.
    pub fn same(&self, a: &T, b: &T) -> bool {
        match self {
            Self::Structural => a == b,
            Self::Identifier(identity) => identity.same(a, b),
        }
    }

    /// Builds a predicate matching items that are the same as `item`.
    ///
    /// Fails with [`DataError::NonDeterministicIdentifier`] if the identifier
    /// provider derives two different keys for `item`.
    pub fn matcher<'a>(&'a self, item: &'a T) -> Result<ItemMatcher<'a, T>> {
        match self {
            Self::Structural => Ok(Box::new(move |other: &T| other == item)),
            Self::Identifier(identity) => identity.matcher(item),
        }
    }

    /// Position of the first item in `items` that is the same as `item`.
    pub fn position(&self, items: &[T], item: &T) -> Result<Option<usize>> {
        let matches = self.matcher(item)?;
        Ok(items.iter().position(|candidate| matches(candidate)))
    }
}

impl<T> Default for EqualityStrategy<T> {
    fn default() -> Self {
        Self::Structural
    }
}

impl<T> Clone for EqualityStrategy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Structural => Self::Structural,
            Self::Identifier(identity) => Self::Identifier(identity.clone()),
        }
    }
}

impl<T> fmt::Debug for EqualityStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => f.write_str("Structural"),
            Self::Identifier(_) => f.write_str("Identifier"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: u64,
        name: String,
    }

    fn person(id: u64, name: &str) -> Person {
        Person {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_structural() {
        let strategy = EqualityStrategy::<Person>::default();
        assert!(strategy.is_structural());
        assert!(strategy.same(&person(1, "A"), &person(1, "A")));
        assert!(!strategy.same(&person(1, "A"), &person(1, "B")));
    }

    #[test]
    fn test_identifier() {
        let strategy = EqualityStrategy::identifier(IdentifierProvider::new(|p: &Person| p.id));
        assert!(strategy.same(&person(1, "A"), &person(1, "B")));
        assert!(!strategy.same(&person(1, "A"), &person(2, "A")));

        let probe = person(1, "A");
        let matches = strategy.matcher(&probe).unwrap();
        assert!(matches(&person(1, "B")));
        assert!(!matches(&person(3, "A")));
    }

    #[test]
    fn test_position() {
        let items = vec![person(1, "A"), person(2, "B"), person(3, "C")];
        let by_id = EqualityStrategy::identifier(IdentifierProvider::new(|p: &Person| p.id));

        assert_eq!(by_id.position(&items, &person(2, "changed")).unwrap(), Some(1));
        assert_eq!(
            EqualityStrategy::Structural
                .position(&items, &person(2, "changed"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_non_deterministic_identifier() {
        let counter = Arc::new(AtomicU64::new(0));
        let counter_clone = counter.clone();
        let strategy = EqualityStrategy::identifier(IdentifierProvider::new(move |_: &Person| {
            counter_clone.fetch_add(1, Ordering::SeqCst)
        }));

        let probe = person(1, "A");
        let err = strategy.matcher(&probe).err().unwrap();
        assert!(matches!(err, DataError::NonDeterministicIdentifier));
        assert!(err.is_contract_violation());
    }
}
