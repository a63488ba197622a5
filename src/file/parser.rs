//! Cursor-based byte parser for metadata blobs.
//!
//! [`crate::file::parser::Parser`] walks a byte slice front to back, which is the access
//! pattern of every blob-heap structure in ECMA-335: signatures, custom attribute values and
//! constant payloads. All reads are bounds-checked.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser::read_le`] - Primitive reads
//! - [`crate::file::parser::Parser::read_compressed_uint`] - ECMA-335 II.23.2 unsigned integers
//! - [`crate::file::parser::Parser::read_compressed_int`] - ECMA-335 II.23.2 signed integers
//! - [`crate::file::parser::Parser::read_type_def_or_ref`] - Compressed `TypeDefOrRef` references
//! - [`crate::file::parser::Parser::read_ser_string`] - `SerString` from custom attribute blobs

use crate::{
    file::io::{read_le_at, CilIO},
    metadata::tables::{CodedIndex, CodedIndexType},
    Result,
};

/// A generic binary data parser for reading metadata structures.
///
/// # Examples
///
/// ```rust
/// use winmdscope::Parser;
///
/// let data = [0x81, 0x23, 0x05];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_compressed_uint()?, 0x123);
/// assert_eq!(parser.read_le::<u8>()?, 5);
/// assert!(!parser.has_more_data());
/// # Ok::<(), winmdscope::Error>(())
/// ```
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new `Parser` positioned at the start of `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if there are unread bytes left
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Current offset into the data
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Skip a single byte
    ///
    /// # Errors
    /// Returns an error if the parser is already at the end.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Skip `step` bytes
    ///
    /// # Errors
    /// Returns an error if fewer than `step` bytes remain.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if step > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Look at the next byte without consuming it
    ///
    /// # Errors
    /// Returns an error if no data is left.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(out_of_bounds_error!())
    }

    /// Read a little-endian primitive and advance
    ///
    /// # Errors
    /// Returns an error if not enough data is left.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them
    ///
    /// # Errors
    /// Returns an error if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Read a compressed unsigned integer (ECMA-335 II.23.2)
    ///
    /// # Errors
    /// Returns an error on truncated data or an invalid leading byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            return Ok(((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte));
        }

        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            return Ok(((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed signed integer (ECMA-335 II.23.2)
    ///
    /// The value is rotated left by one with the sign in bit 0, and sign-extended from the width
    /// of the encoding that was used.
    ///
    /// # Errors
    /// Returns an error on truncated data or an invalid leading byte.
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let start = self.position;
        let unsigned = self.read_compressed_uint()?;

        let sign_mask: u32 = match self.position - start {
            1 => 0xFFFF_FFC0,
            2 => 0xFFFF_E000,
            _ => 0xF000_0000,
        };

        let value = if (unsigned & 1) == 0 {
            unsigned >> 1
        } else {
            (unsigned >> 1) | sign_mask
        };

        #[allow(clippy::cast_possible_wrap)]
        Ok(value as i32)
    }

    /// Read a compressed `TypeDefOrRef` reference as used inside signatures
    ///
    /// # Errors
    /// Returns an error on truncated data or if the tag is not TypeDef, TypeRef or TypeSpec.
    pub fn read_type_def_or_ref(&mut self) -> Result<CodedIndex> {
        let raw = self.read_compressed_uint()?;
        CodedIndexType::TypeDefOrRef.decode(raw)
    }

    /// Read a `SerString`: a compressed length followed by UTF-8 bytes, with `0xFF` for null
    ///
    /// # Errors
    /// Returns an error on truncated data or invalid UTF-8.
    pub fn read_ser_string(&mut self) -> Result<Option<&'a str>> {
        if self.peek_byte()? == 0xFF {
            self.advance()?;
            return Ok(None);
        }

        let length = self.read_compressed_uint()? as usize;
        let bytes = self.read_bytes(length)?;

        std::str::from_utf8(bytes)
            .map(Some)
            .map_err(|e| malformed_error!("Invalid UTF-8 SerString at {} - {}", self.position, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::TableId;

    #[test]
    fn compressed_uint() {
        let test_cases = vec![
            (vec![0x03], 3),
            (vec![0x7F], 0x7F),
            (vec![0x80, 0x80], 0x80),
            (vec![0xAE, 0x57], 0x2E57),
            (vec![0xBF, 0xFF], 0x3FFF),
            (vec![0xC0, 0x00, 0x40, 0x00], 0x4000),
            (vec![0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_uint().unwrap(), expected);
            assert!(!parser.has_more_data());
        }

        let mut parser = Parser::new(&[0xFF]);
        assert!(parser.read_compressed_uint().is_err());
    }

    #[test]
    fn compressed_int() {
        // Values from ECMA-335 II.23.2
        let test_cases = vec![
            (vec![0x06], 3),
            (vec![0x7B], -3),
            (vec![0x80, 0x80], 64),
            (vec![0x01], -64),
            (vec![0xC0, 0x00, 0x40, 0x00], 8192),
            (vec![0x80, 0x01], -8192),
            (vec![0xDF, 0xFF, 0xFF, 0xFE], 268_435_455),
            (vec![0xC0, 0x00, 0x00, 0x01], -268_435_456),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_int().unwrap(), expected, "{input:02X?}");
        }
    }

    #[test]
    fn type_def_or_ref() {
        let mut parser = Parser::new(&[0x49, 0x0D, 0x0A]);

        let first = parser.read_type_def_or_ref().unwrap();
        assert_eq!(first.tag, TableId::TypeRef);
        assert_eq!(first.row, 0x12);

        let second = parser.read_type_def_or_ref().unwrap();
        assert_eq!(second.tag, TableId::TypeRef);
        assert_eq!(second.row, 3);

        let third = parser.read_type_def_or_ref().unwrap();
        assert_eq!(third.tag, TableId::TypeSpec);
        assert_eq!(third.row, 2);

        let mut parser = Parser::new(&[0x07]);
        assert!(parser.read_type_def_or_ref().is_err());
    }

    #[test]
    fn ser_string() {
        let data = [0x03, b'a', b'b', b'c', 0xFF, 0x00];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_ser_string().unwrap(), Some("abc"));
        assert_eq!(parser.read_ser_string().unwrap(), None);
        assert_eq!(parser.read_ser_string().unwrap(), Some(""));
        assert!(parser.read_ser_string().is_err());
    }

    #[test]
    fn bounds() {
        let data = [0x01, 0x02];
        let mut parser = Parser::new(&data);
        assert!(parser.read_bytes(3).is_err());
        assert_eq!(parser.read_bytes(1).unwrap(), &[0x01]);
        assert_eq!(parser.peek_byte().unwrap(), 0x02);
        parser.advance().unwrap();
        assert!(parser.peek_byte().is_err());
        assert!(parser.advance().is_err());
        assert_eq!(parser.remaining(), 0);
    }
}
