//! The `#Blob` heap: length-prefixed binary data such as signatures and attribute values.

use crate::{file::parser::Parser, Result};

/// View over the `#Blob` heap.
///
/// Each entry is prefixed with an ECMA-335 compressed length. Index 0 is the empty blob.
#[derive(Clone, Copy)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` view over heap data
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the empty blob.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob stored at heap offset `index`
    ///
    /// # Errors
    /// Returns an error if `index` or the encoded length points outside the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        parser.read_bytes(len)
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap only holds the empty blob
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        let mut data = vec![0x00, 0x03, 0xAA, 0xBB, 0xCC, 0x80, 0x81];
        data.extend(std::iter::repeat(0x11).take(0x81));
        data.extend([0x00]);

        let blob = Blob::from(&data).unwrap();

        assert_eq!(blob.get(0).unwrap(), &[] as &[u8]);
        assert_eq!(blob.get(1).unwrap(), &[0xAA, 0xBB, 0xCC]);
        assert_eq!(blob.get(5).unwrap().len(), 0x81);
        assert_eq!(blob.get(data.len() - 1).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn invalid() {
        assert!(Blob::from(&[]).is_err());
        assert!(Blob::from(&[0x01]).is_err());

        let blob = Blob::from(&[0x00, 0x05, 0x01]).unwrap();
        assert!(blob.get(1).is_err());
        assert!(blob.get(3).is_err());
    }
}
