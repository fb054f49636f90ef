//! Query descriptors passed from views to data providers.
//!
//! A [`Query`] describes which slice of the data is requested: a window
//! (`offset`, `limit`), an ordered list of [`SortOrder`]s and an optional
//! filter value whose type is chosen by the provider. Queries are plain
//! values; building a new one never affects a query already handed out.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Direction of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Applies this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Sorting by one named property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    property: String,
    direction: SortDirection,
}

impl SortOrder {
    /// Creates a sort order.
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Ascending order by `property`.
    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Ascending)
    }

    /// Descending order by `property`.
    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Descending)
    }

    /// The property being sorted on.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The sort direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Same property, opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.property.clone(), self.direction.reverse())
    }
}

/// Fluent builder for multi-property sort orders.
///
/// # Example
///
/// ```
/// use horizon_data::{SortOrder, SortOrderBuilder};
///
/// let orders = SortOrderBuilder::new().then_asc("last_name").then_desc("age").build();
/// assert_eq!(orders, vec![SortOrder::asc("last_name"), SortOrder::desc("age")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SortOrderBuilder {
    orders: Vec<SortOrder>,
}

impl SortOrderBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending order.
    pub fn then_asc(mut self, property: impl Into<String>) -> Self {
        self.orders.push(SortOrder::asc(property));
        self
    }

    /// Appends a descending order.
    pub fn then_desc(mut self, property: impl Into<String>) -> Self {
        self.orders.push(SortOrder::desc(property));
        self
    }

    /// Returns the collected sort orders.
    pub fn build(self) -> Vec<SortOrder> {
        self.orders
    }
}

/// An immutable description of one data request.
///
/// `limit == usize::MAX` means "no limit". The size of a query's matching
/// set ignores the window; only `fetch` honours `offset` and `limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<F> {
    offset: usize,
    limit: usize,
    sort_orders: Vec<SortOrder>,
    filter: Option<F>,
}

impl<F> Default for Query<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Query<F> {
    /// A query for everything: no window, no sorting, no filter.
    pub fn new() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
            sort_orders: Vec::new(),
            filter: None,
        }
    }

    /// Returns a copy with the given filter.
    pub fn with_filter(self, filter: F) -> Self {
        self.with_optional_filter(Some(filter))
    }

    /// Returns a copy with the given filter, or none.
    pub fn with_optional_filter(mut self, filter: Option<F>) -> Self {
        self.filter = filter;
        self
    }

    /// Returns a copy requesting `limit` items starting at `offset`.
    pub fn with_window(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Returns a copy with the given sort orders.
    pub fn with_sort_orders(mut self, sort_orders: Vec<SortOrder>) -> Self {
        self.sort_orders = sort_orders;
        self
    }

    /// Index of the first requested item.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Maximum number of requested items.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns `true` when the query has no limit.
    pub fn is_unbounded(&self) -> bool {
        self.limit == usize::MAX
    }

    /// Index one past the last requested item.
    pub fn requested_range_end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    /// Requested sort orders, most significant first.
    pub fn sort_orders(&self) -> &[SortOrder] {
        &self.sort_orders
    }

    /// The filter value, if any.
    pub fn filter(&self) -> Option<&F> {
        self.filter.as_ref()
    }

    /// The same query without window, as used for counting.
    pub fn without_window(&self) -> Self
    where
        F: Clone,
    {
        self.clone().with_window(0, usize::MAX)
    }

    /// Converts the filter to another type, keeping window and sorting.
    pub fn map_filter<G>(self, convert: impl FnOnce(F) -> G) -> Query<G> {
        Query {
            offset: self.offset,
            limit: self.limit,
            sort_orders: self.sort_orders,
            filter: self.filter.map(convert),
        }
    }

    /// Fallible version of [`Query::map_filter`].
    pub fn try_map_filter<G>(self, convert: impl FnOnce(F) -> Result<G>) -> Result<Query<G>> {
        let filter = self.filter.map(convert).transpose()?;
        Ok(Query {
            offset: self.offset,
            limit: self.limit,
            sort_orders: self.sort_orders,
            filter,
        })
    }

    /// Applies this query's window to an already filtered and sorted sequence.
    pub fn page<I>(&self, items: I) -> std::iter::Take<std::iter::Skip<I::IntoIter>>
    where
        I: IntoIterator,
    {
        items.into_iter().skip(self.offset).take(self.limit)
    }
}

impl<F: Serialize> Query<F> {
    /// Builds the serializable form handed to backend services.
    pub fn to_backend(&self) -> Result<BackendQuery> {
        let filter = self.filter.as_ref().map(serde_json::to_value).transpose()?;
        Ok(BackendQuery {
            offset: self.offset,
            limit: if self.is_unbounded() { None } else { Some(self.limit) },
            sort_orders: self.sort_orders.clone(),
            filter,
        })
    }
}

/// A query with its filter serialized, for providers that push filtering
/// and sorting down to a remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendQuery {
    /// Index of the first requested item.
    pub offset: usize,
    /// Maximum number of items, `None` for no limit.
    pub limit: Option<usize>,
    /// Requested sort orders, most significant first.
    #[serde(default)]
    pub sort_orders: Vec<SortOrder>,
    /// The filter in JSON form.
    #[serde(default)]
    pub filter: Option<serde_json::Value>,
}
