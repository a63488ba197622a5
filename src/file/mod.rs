//! Loading of metadata images and low-level byte access.
//!
//! A `.winmd` file is a regular PE image whose CLR runtime header points at the ECMA-335
//! metadata directory. [`crate::file::File`] owns the bytes (memory mapped or in memory),
//! locates that directory once at load time and afterwards hands out the metadata slice.
//! Images that are nothing but a bare metadata blob (starting with `BSJB`) are accepted
//! through [`crate::file::File::from_metadata`].
//!
//! # Key Components
//!
//! - [`crate::file::Backend`] - Source of raw bytes
//! - [`crate::file::File`] - An image plus the location of its metadata
//! - [`crate::file::parser::Parser`] - Cursor over blob data
//! - [`crate::file::io`] - Bounds-checked little-endian reads

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::{ops::Range, path::Path};

use goblin::pe::{section_table::SectionTable, PE};
use memory::Memory;
use physical::Physical;

use crate::{metadata::cor20header::Cor20Header, Error::Empty, Result};

/// A source of raw image bytes.
pub trait Backend: Send + Sync {
    /// Borrow `len` bytes starting at `offset`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range leaves the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// The complete data
    fn data(&self) -> &[u8];

    /// Length of the data in bytes
    fn len(&self) -> usize;
}

/// A loaded image together with the byte range of its metadata directory.
pub struct File {
    data: Box<dyn Backend>,
    metadata: Range<usize>,
}

impl File {
    /// Memory-map and load a PE image from disk
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped, is not a PE image or carries no CLR
    /// metadata.
    pub fn from_file(path: &Path) -> Result<File> {
        let data = Physical::new(path)?;
        Self::load(Box::new(data))
    }

    /// Load a PE image from a buffer
    ///
    /// # Errors
    /// Returns an error if the buffer is not a PE image or carries no CLR metadata.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        Self::load(Box::new(Memory::new(data)))
    }

    /// Wrap a buffer that already is a metadata blob (`BSJB` root at offset 0)
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer.
    pub fn from_metadata(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(Empty);
        }

        let metadata = 0..data.len();
        Ok(File {
            data: Box::new(Memory::new(data)),
            metadata,
        })
    }

    fn load(data: Box<dyn Backend>) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let metadata = locate_metadata(data.data())?;
        log::debug!(
            "metadata directory at {:#x}, {} bytes",
            metadata.start,
            metadata.len()
        );

        Ok(File { data, metadata })
    }

    /// The complete image
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// The metadata directory, starting with the `BSJB` root
    #[must_use]
    pub fn metadata(&self) -> &[u8] {
        &self.data.data()[self.metadata.clone()]
    }

    /// Size of the image in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image has no data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }
}

fn locate_metadata(data: &[u8]) -> Result<Range<usize>> {
    let pe = PE::parse(data)?;

    let Some(optional_header) = pe.header.optional_header else {
        return Err(malformed_error!("File does not have an OptionalHeader"));
    };

    let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() else {
        return Err(crate::Error::NotSupported);
    };

    let clr_offset = rva_to_offset(&pe.sections, clr_dir.virtual_address)?;
    let clr_header = data
        .get(clr_offset..clr_offset.saturating_add(clr_dir.size as usize))
        .ok_or(out_of_bounds_error!())?;
    let cor20 = Cor20Header::read(clr_header)?;

    let start = rva_to_offset(&pe.sections, cor20.meta_data_rva)?;
    let end = start
        .checked_add(cor20.meta_data_size as usize)
        .ok_or(out_of_bounds_error!())?;
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    Ok(start..end)
}

/// Translate a relative virtual address into a file offset using the section table.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if no section contains `rva`.
pub fn rva_to_offset(sections: &[SectionTable], rva: u32) -> Result<usize> {
    for section in sections {
        let Some(section_max) = section.virtual_address.checked_add(section.virtual_size) else {
            return Err(malformed_error!(
                "Section malformed, causing integer overflow - {} + {}",
                section.virtual_address,
                section.virtual_size
            ));
        };

        if section.virtual_address <= rva && rva < section_max {
            return Ok((rva - section.virtual_address) as usize + section.pointer_to_raw_data as usize);
        }
    }

    Err(malformed_error!(
        "RVA could not be converted to offset - {}",
        rva
    ))
}
