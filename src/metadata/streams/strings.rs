//! The `#Strings` heap: NUL-terminated UTF-8 identifiers.

use std::{ffi::CStr, str};

use crate::Result;

/// View over the `#Strings` heap.
///
/// Index 0 always yields the empty string.
///
/// # Examples
///
/// ```rust
/// use winmdscope::Strings;
///
/// let data = [0x00, b'W', b'i', b'n', 0x00];
/// let strings = Strings::from(&data)?;
/// assert_eq!(strings.get(1)?, "Win");
/// assert_eq!(strings.get(0)?, "");
/// # Ok::<(), winmdscope::Error>(())
/// ```
#[derive(Clone, Copy)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` view over heap data
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the empty string.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #String heap is empty"));
        }

        Ok(Strings { data })
    }

    /// Get the string starting at heap offset `index`
    ///
    /// # Errors
    /// Returns an error if `index` is outside the heap, or the string is unterminated or not
    /// valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        CStr::from_bytes_until_nul(&self.data[index..])
            .ok()
            .and_then(|result| result.to_str().ok())
            .ok_or_else(|| malformed_error!("Invalid string at index - {}", index))
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds nothing but the empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }
}
