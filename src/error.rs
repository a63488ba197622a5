use thiserror::Error;

use crate::metadata::tables::TableId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Format errors
/// - [`Error::Malformed`] - Corrupted or non-conformant metadata (bad coded-index tag,
///   invalid heap offset, unexpected custom attribute shape, unsorted association table)
/// - [`Error::OutOfBounds`] - A read would have left the backing data
/// - [`Error::InvalidOffset`] - An RVA could not be mapped to a file offset
/// - [`Error::NotSupported`] - The input is not a CLI image or uses unsupported tables
/// - [`Error::Empty`] - Empty input provided
///
/// ## Resolution errors
/// - [`Error::TypeNotFound`] - A required type could not be located
/// - [`Error::RecursionLimit`] - Resolution or signature parsing nested too deep
///
/// ## I/O errors
/// - [`Error::FileError`] - Underlying filesystem failure
/// - [`Error::GoblinErr`] - The PE container could not be parsed
///
/// # Examples
///
/// ```rust,no_run
/// use winmdscope::{Database, Error};
///
/// match Database::from_file(std::path::Path::new("Windows.Win32.winmd")) {
///     Ok(db) => println!("{} types", db.type_count()),
///     Err(Error::NotSupported) => eprintln!("not a metadata file"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed at {file}:{line}: {message}")
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An RVA or offset does not map into the image.
    #[error("Could not retrieve a valid offset!")]
    InvalidOffset,

    /// The data violates the ECMA-335 encoding.
    ///
    /// Carries the source location that detected the problem, which makes triaging broken
    /// input files considerably easier.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A read would have gone past the end of a buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The input is not a supported metadata file.
    #[error("This file type is not supported")]
    NotSupported,

    /// Empty input.
    #[error("Provided input was empty")]
    Empty,

    /// Filesystem error while opening or mapping a file.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The PE container failed to parse.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// A table's association key column is not sorted.
    #[error("Table {0:?} is not sorted by its key column")]
    UnsortedTable(TableId),

    /// A required type lookup failed. The message names the fully qualified type.
    #[error("{0}")]
    TypeNotFound(String),

    /// A recursive operation exceeded its configured depth.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
