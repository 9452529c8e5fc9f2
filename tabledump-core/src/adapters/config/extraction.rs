//! Extraction run configuration.

use crate::dialect::Dialect;
use serde::{Deserialize, Serialize};

/// Events buffered between the extractor and its consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Configuration for one extraction run.
///
/// The page size comes from the dialect. It can be overridden for paginating
/// dialects; a non-paginating dialect always reads each table in one page.
///
/// # Example
/// ```rust
/// use tabledump_core::{Dialect, ExtractionConfig};
///
/// let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL).with_page_size(500);
/// assert_eq!(config.page_size, Some(500));
///
/// let config = ExtractionConfig::for_dialect(Dialect::Redshift).with_page_size(500);
/// assert_eq!(config.page_size, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Rows per page, `None` for a single unbounded page
    pub page_size: Option<u32>,
    /// Capacity of the bounded event channel
    pub channel_capacity: usize,
}

impl ExtractionConfig {
    /// Creates a config with the dialect's paging rule.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            page_size: dialect.page_size(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Builder method to override the page size of a paginating dialect.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        if self.page_size.is_some() {
            self.page_size = Some(page_size);
        }
        self
    }

    /// Builder method to set the event channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if the page size or channel capacity is zero
    pub fn validate(&self) -> crate::Result<()> {
        if self.page_size == Some(0) {
            return Err(crate::error::ExtractError::configuration(
                "page_size must be greater than 0",
            ));
        }

        if self.channel_capacity == 0 {
            return Err(crate::error::ExtractError::configuration(
                "channel_capacity must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Validates the configuration against the dialect it will run on.
    ///
    /// # Errors
    /// Returns error if [`validate`](Self::validate) fails or the paging rule
    /// disagrees with whether `dialect` paginates
    pub fn validate_for(&self, dialect: Dialect) -> crate::Result<()> {
        self.validate()?;
        if self.page_size.is_some() != dialect.paginates() {
            let rule = if dialect.paginates() {
                "requires a page size"
            } else {
                "reads each table in one page"
            };
            return Err(crate::error::ExtractError::configuration(format!(
                "{} {}, but the configuration disagrees",
                dialect, rule
            )));
        }
        Ok(())
    }
}
