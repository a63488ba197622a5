//! The `#GUID` heap: a 1-based array of 16-byte GUIDs.

use crate::Result;

/// View over the `#GUID` heap.
#[derive(Clone, Copy)]
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Create a `Guid` view over heap data
    ///
    /// # Errors
    /// Returns an error if the heap size is not a multiple of 16.
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!(
                "#GUID heap size {} is not a multiple of 16",
                data.len()
            ));
        }

        Ok(Guid { data })
    }

    /// Get the GUID at 1-based `index`; index 0 is the null GUID
    ///
    /// # Errors
    /// Returns an error if `index` is past the last entry.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Ok(uguid::Guid::ZERO);
        }

        let offset_start = (index - 1) * 16;
        let Some(bytes) = self.data.get(offset_start..offset_start + 16) else {
            return Err(out_of_bounds_error!());
        };

        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(bytes);
        Ok(uguid::Guid::from_bytes(buffer))
    }

    /// Number of GUIDs in the heap
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / 16
    }
}
