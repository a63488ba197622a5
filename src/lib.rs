// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # winmdscope
//!
//! A read-only reader for ECMA-335 metadata, aimed at Windows metadata (`.winmd`) files such as
//! `Windows.Win32.winmd`. The image is memory mapped once; every query afterwards reads the
//! tables and heaps in place through cheap, `Copy` row handles.
//!
//! On top of plain table access the crate understands the architecture dialect of the Win32
//! metadata: a type whose layout differs between CPUs is emitted once per architecture subset,
//! tagged with `SupportedArchitectureAttribute`. Type references resolve to the variant matching
//! a requested [`Architecture`].
//!
//! ## Features
//!
//! - **Zero-copy access** - Strings, blobs and rows are borrowed from the mapped image
//! - **Typed rows** - One handle type per table, decoding columns on demand
//! - **Sorted lookups** - Custom attributes, nested types, constants and other owned rows are
//!   found with binary searches
//! - **Architecture-aware resolution** - `TypeRef` to `TypeDef` with variant selection
//! - **Signature and attribute decoding** - Method, field, property and `TypeSpec` signatures,
//!   custom attribute values including enums
//! - **Thread safe** - A [`Database`] is `Send + Sync` and needs no locking
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use winmdscope::prelude::*;
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! let context = db.find_required("Windows.Win32.System.Diagnostics.Debug", "CONTEXT")?;
//! for variant in db.variants(context) {
//!     println!("{} ({} fields)", variant.display_name()?, variant.fields()?.len());
//! }
//! # Ok::<(), winmdscope::Error>(())
//! ```
//!
//! ### Resolving references
//!
//! ```rust,no_run
//! use winmdscope::{
//!     metadata::tables::{TableRow, TypeRef},
//!     Architecture, Database,
//! };
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! for type_ref in db.rows::<TypeRef>() {
//!     match type_ref.resolve(Architecture::ARM64)? {
//!         Some(definition) => println!("{} -> {}", type_ref.display_name()?, definition.token()),
//!         None => println!("{} is external", type_ref.display_name()?),
//!     }
//! }
//! # Ok::<(), winmdscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Streams, tables, typed rows, signatures and resolution
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: load milestones at `debug`,
//! resolution decisions at `trace`. The crate never installs a logger.
//!
//! ## Standards Compliance
//!
//! - **ECMA-335 6th Edition** - Partition II, metadata tables, heaps and signatures
//! - **PE/COFF** - Through [goblin](https://docs.rs/goblin)

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use winmdscope::prelude::*;
///
/// let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
/// let handle = db.find_required("Windows.Win32.Foundation", "HANDLE")?;
/// println!("{}", handle.display_name()?);
/// # Ok::<(), winmdscope::Error>(())
/// ```
pub mod prelude;

/// ECMA-335 metadata: streams, tables, typed rows and type resolution
pub mod metadata;

/// `winmdscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `winmdscope` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use winmdscope::{Database, Error};
///
/// match Database::from_file(std::path::Path::new("Windows.Win32.winmd")) {
///     Ok(db) => println!("{} types", db.type_count()),
///     Err(Error::NotSupported) => println!("No CLI metadata"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// A loaded metadata image, the entry point of every query
pub use metadata::database::Database;

/// CPU architecture sets of the Win32 metadata
pub use metadata::architecture::Architecture;

/// Reader options
pub use metadata::config::ReaderConfig;

/// Metadata streams and heaps for direct access to ECMA-335 data structures.
///
/// - [`Blob`] - Binary blob heap for signatures and attribute values
/// - [`Guid`] - GUID heap for module identifiers
/// - [`Strings`] - String heap for names and namespaces
/// - [`UserStrings`] - User string heap for string literals
/// - [`TablesHeader`] - The tables stream
/// - [`StreamHeader`] - Individual stream header information
pub use metadata::streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings};

/// Low-level access to the loaded image and blob data.
///
/// ```rust
/// use winmdscope::Parser;
///
/// let mut parser = Parser::new(&[0x81, 0x00]);
/// assert_eq!(parser.read_compressed_uint()?, 0x100);
/// # Ok::<(), winmdscope::Error>(())
/// ```
pub use file::{parser::Parser, File};
