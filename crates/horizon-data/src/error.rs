//! Error types for the data-view layer.

/// Result type alias for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by data providers, components and views.
///
/// There is no retryable class here. Variants are either contract
/// violations (a supplied provider or identifier provider is buggy),
/// configuration errors (the caller used a view or component in a state
/// where the operation is invalid), or errors a provider raised itself,
/// which are passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A provider reported a negative item count.
    #[error("data provider reported a negative size: {size}")]
    NegativeSize { size: i64 },

    /// The query's filter value is not of the type the provider filters by.
    #[error("filter type mismatch: provider expects `{expected}`, query carries `{found}`")]
    FilterTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An identifier provider returned different keys for the same item.
    #[error("identifier provider returned different identifiers for the same item")]
    NonDeterministicIdentifier,

    /// A provider returned more items than the query's limit allows.
    #[error("data provider returned {returned} items for a query limited to {requested}")]
    TooManyItems { requested: usize, returned: usize },

    /// An in-memory provider was asked to sort by a property it cannot compare.
    #[error("no comparator registered for sort property '{property}'")]
    UnknownSortProperty { property: String },

    /// The owning component has been discarded.
    #[error("data view used after its component was discarded")]
    Discarded,

    /// The component has no data provider yet.
    #[error("component has no data provider bound")]
    Unbound,

    /// The component was rebound to another provider after this view was created.
    #[error("data view is stale: its component is bound to a different data provider")]
    StaleView,

    /// A positional mutation referenced an item that is not in the list.
    #[error("anchor item is not present in the data")]
    ItemNotFound,

    /// Configuration values are out of range.
    #[error("invalid data view configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("failed to parse data view configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A filter could not be serialized for a backend query.
    #[error("failed to serialize query filter: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error raised by the data provider's own backend.
    #[error("data provider failed: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DataError {
    /// Wraps a backend error raised inside a provider.
    pub fn provider<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Provider(err.into())
    }

    /// Create a filter type mismatch error.
    pub fn filter_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::FilterTypeMismatch { expected, found }
    }

    /// Create an unknown sort property error.
    pub fn unknown_sort_property(property: impl Into<String>) -> Self {
        Self::UnknownSortProperty {
            property: property.into(),
        }
    }

    /// Returns `true` for errors that indicate a bug in a supplied provider
    /// or identifier provider.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::NegativeSize { .. }
                | Self::FilterTypeMismatch { .. }
                | Self::NonDeterministicIdentifier
                | Self::TooManyItems { .. }
                | Self::UnknownSortProperty { .. }
        )
    }

    /// Returns `true` for errors caused by using a view or component in a
    /// state where the operation is invalid.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Discarded
                | Self::Unbound
                | Self::StaleView
                | Self::ItemNotFound
                | Self::InvalidConfig(_)
                | Self::ConfigParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(DataError::NegativeSize { size: -1 }.is_contract_violation());
        assert!(DataError::filter_mismatch("a", "b").is_contract_violation());
        assert!(DataError::Discarded.is_configuration_error());
        assert!(!DataError::Discarded.is_contract_violation());

        let backend = DataError::provider("connection reset");
        assert!(!backend.is_contract_violation());
        assert!(!backend.is_configuration_error());
    }

    #[test]
    fn test_messages() {
        let err = DataError::filter_mismatch("ItemFilter<u32>", "alloc::string::String");
        assert_eq!(
            err.to_string(),
            "filter type mismatch: provider expects `ItemFilter<u32>`, query carries `alloc::string::String`"
        );
        assert_eq!(
            DataError::NegativeSize { size: -3 }.to_string(),
            "data provider reported a negative size: -3"
        );
    }

    #[test]
    fn test_provider_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "backend timed out");
        let err = DataError::provider(io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("backend timed out"));
    }
}
