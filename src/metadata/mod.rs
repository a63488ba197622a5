//! ECMA-335 metadata: root, streams, tables and the queries built on them.
//!
//! # Key Components
//!
//! - [`database`] - A loaded image and its parsed streams
//! - [`tables`] - Table schema, coded indexes and typed row handles
//! - [`association`] - Equal-range lookups over tables sorted by owner
//! - [`architecture`] - The `SupportedArchitectureAttribute` dialect of Win32 metadata
//! - [`resolver`] - `TypeRef` to `TypeDef` resolution with architecture variant selection
//! - [`typecache`] - The module-wide index of top-level and nested types
//! - [`signatures`] and [`customattributes`] - Blob decoders
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmdscope::Database;
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! for namespace in db.namespaces() {
//!     println!("{namespace}: {} types", db.namespace_types(namespace).count());
//! }
//! # Ok::<(), winmdscope::Error>(())
//! ```

/// CPU architecture declarations and display names
pub mod architecture;
/// Sorted one-to-many table relations
pub mod association;
/// Reader options
pub mod config;
/// The CLI header of a PE image
pub mod cor20header;
/// Custom attribute decoding
pub mod customattributes;
/// The loaded image
pub mod database;
/// Type reference resolution
pub mod resolver;
/// The metadata root and stream directory
pub mod root;
/// Signature blob decoding
pub mod signatures;
/// Metadata streams: the tables stream and the four heaps
pub mod streams;
/// Metadata tables and typed rows
pub mod tables;
/// Metadata tokens
pub mod token;
/// Module-wide type index
pub mod typecache;
