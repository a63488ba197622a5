//! Metadata streams (ECMA-335 II.24.2).
//!
//! - **`#Strings`** - NUL-terminated UTF-8 identifiers; index 0 is the empty string
//! - **`#US`** - length-prefixed UTF-16 string literals
//! - **`#Blob`** - length-prefixed binary data such as signatures and attribute values
//! - **`#GUID`** - 1-based array of 16-byte GUIDs
//! - **`#~`** / **`#-`** - the metadata tables
//!
//! Every stream type borrows its bytes from the loaded image; nothing is copied.
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2.2 - Stream Headers

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;
mod userstrings;

pub use blob::Blob;
pub use guid::Guid;
pub use streamheader::{StreamHeader, STREAM_NAMES};
pub use strings::Strings;
pub use tablesheader::TablesHeader;
pub use userstrings::UserStrings;
