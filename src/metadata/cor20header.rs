//! The CLI header (ECMA-335 II.25.3.3) that links a PE image to its metadata.

use crate::{file::parser::Parser, Result};

/// Size of the CLI header in bytes
pub const COR20_HEADER_SIZE: u32 = 72;

/// The leading fields of the CLI header that the reader needs.
///
/// Resource, strong name and vtable-fixup directories follow in the real structure; metadata
/// readers never touch them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum major runtime version required
    pub major_runtime_version: u16,
    /// Minor runtime version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata directory
    pub meta_data_size: u32,
    /// Runtime image flags
    pub flags: u32,
    /// Entry point token or RVA
    pub entry_point_token: u32,
}

impl Cor20Header {
    /// Parse the header from the start of `data`
    ///
    /// # Errors
    /// Returns an error if `data` is shorter than 72 bytes, declares a different size or
    /// carries an empty metadata directory.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE as usize {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(data);
        let cb = parser.read_le::<u32>()?;
        if cb != COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_rva == 0 || meta_data_size == 0 {
            return Err(malformed_error!("Metadata directory is empty"));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags: parser.read_le::<u32>()?,
            entry_point_token: parser.read_le::<u32>()?,
        })
    }
}
