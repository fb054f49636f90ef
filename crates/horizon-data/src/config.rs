//! Data view configuration.
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```
//! use horizon_data::DataViewConfig;
//!
//! let config = DataViewConfig::from_toml_str("page_size = 200").unwrap();
//! assert_eq!(config.page_size, 200);
//! assert!(config.verify_fetch_limits);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Default number of items requested per fetch by item streams.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Settings shared by every view of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataViewConfig {
    /// Number of items an item stream requests from the provider per fetch.
    pub page_size: usize,
    /// Reject providers that return more items than a query's limit.
    ///
    /// When disabled, surplus items are dropped and item streams stop after
    /// as many items as the provider's size reports, at the cost of one
    /// extra size query per iteration.
    pub verify_fetch_limits: bool,
}

impl Default for DataViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            verify_fetch_limits: true,
        }
    }
}

impl DataViewConfig {
    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets whether fetch results are checked against the query limit.
    pub fn with_fetch_limit_verification(mut self, verify: bool) -> Self {
        self.verify_fetch_limits = verify;
        self
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that all values are in range.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DataError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
