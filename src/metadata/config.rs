//! Reader configuration.
//!
//! ```rust
//! use winmdscope::ReaderConfig;
//!
//! let config = ReaderConfig {
//!     max_resolution_depth: 8,
//!     ..ReaderConfig::strict()
//! };
//! assert!(config.verify_sorted_tables);
//! ```

/// Options applied while loading and querying a [`crate::Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Check at load time that every association table is sorted by its key column.
    /// An unsorted table fails the load with [`crate::Error::UnsortedTable`].
    pub verify_sorted_tables: bool,

    /// Maximum depth of nested `TypeRef` scopes and signature types followed before giving up
    /// with [`crate::Error::RecursionLimit`]
    pub max_resolution_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verify_sorted_tables: cfg!(debug_assertions),
            max_resolution_depth: 64,
        }
    }
}

impl ReaderConfig {
    /// No load-time verification
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            verify_sorted_tables: false,
            max_resolution_depth: 64,
        }
    }

    /// Every load-time verification enabled, regardless of build profile
    #[must_use]
    pub fn strict() -> Self {
        Self {
            verify_sorted_tables: true,
            max_resolution_depth: 64,
        }
    }
}
