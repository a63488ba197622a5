//! The `#US` heap: length-prefixed UTF-16 string literals.

use widestring::U16String;

use crate::{file::parser::Parser, Result};

/// View over the `#US` heap.
///
/// Each entry is a compressed byte length, the UTF-16LE payload and one trailing flag byte
/// that marks strings needing more than a byte-wise comparison.
#[derive(Clone, Copy)]
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Create a `UserStrings` view over heap data
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the empty entry.
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #US heap"));
        }

        Ok(UserStrings { data })
    }

    /// Get the string literal stored at heap offset `index`
    ///
    /// # Errors
    /// Returns an error if `index` or the encoded length point outside the heap.
    pub fn get(&self, index: usize) -> Result<U16String> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        if len == 0 {
            return Ok(U16String::new());
        }

        let payload = parser.read_bytes(len)?;
        let chars = payload[..len - 1]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>();

        Ok(U16String::from_vec(chars))
    }
}
