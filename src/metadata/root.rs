//! The metadata root and its stream directory (ECMA-335 II.24.2.1).
//!
//! # Example
//!
//! ```rust
//! use winmdscope::metadata::root::Root;
//!
//! let root = Root::read(&[
//!     0x42, 0x53, 0x4A, 0x42, // signature
//!     0x01, 0x00, 0x01, 0x00, // major, minor
//!     0x00, 0x00, 0x00, 0x00, // reserved
//!     0x04, 0x00, 0x00, 0x00, // version length
//!     b'v', b'1', 0x00, 0x00, // version
//!     0x00, 0x00, // flags
//!     0x01, 0x00, // streams
//!     0x20, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, b'#', b'~', 0x00, 0x00,
//!     0x00, 0x00, 0x00, 0x00,
//! ])?;
//! assert_eq!(root.version, "v1");
//! assert_eq!(root.stream_headers[0].name, "#~");
//! # Ok::<(), winmdscope::Error>(())
//! ```

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::{StreamHeader, STREAM_NAMES},
    Result,
};

/// The `BSJB` signature every metadata root starts with
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Metadata root header.
pub struct Root {
    /// Always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1 for all current producers
    pub major_version: u16,
    /// Minor version
    pub minor_version: u16,
    /// Padded length of the version string
    pub length: u32,
    /// Runtime version string, e.g. `WindowsRuntime 1.4`
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// The stream directory
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Read the metadata root at the start of `data`
    ///
    /// # Errors
    /// Returns an error if the signature does not match, the header is truncated, a stream lies
    /// outside `data`, or a stream name appears twice.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(out_of_bounds_error!());
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "Metadata signature does not match - {:#x}",
                signature
            ));
        }

        let length = read_le::<u32>(&data[12..])?;
        let Some(version_end) = 16usize.checked_add(length as usize) else {
            return Err(out_of_bounds_error!());
        };
        let Some(version_bytes) = data.get(16..version_end) else {
            return Err(out_of_bounds_error!());
        };
        let version: String = version_bytes
            .iter()
            .take_while(|byte| **byte != 0)
            .map(|byte| char::from(*byte))
            .collect();

        let mut offset = version_end;
        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_count = read_le_at::<u16>(data, &mut offset)?;
        if stream_count == 0 || stream_count as usize > STREAM_NAMES.len() {
            return Err(malformed_error!("Invalid stream count - {}", stream_count));
        }

        let mut stream_headers: Vec<StreamHeader> = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            let Some(header_data) = data.get(offset..) else {
                return Err(out_of_bounds_error!());
            };

            let header = StreamHeader::from(header_data)?;
            match header.offset.checked_add(header.size) {
                Some(end) if end as usize <= data.len() => {}
                _ => return Err(out_of_bounds_error!()),
            }

            if stream_headers.iter().any(|known| known.name == header.name) {
                return Err(malformed_error!("Duplicate stream - {}", header.name));
            }

            offset += header.encoded_len();
            stream_headers.push(header);
        }

        log::debug!(
            "metadata root '{}' with {} streams",
            version,
            stream_headers.len()
        );

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            length,
            version,
            flags,
            stream_headers,
        })
    }

    /// The header of the stream called `name`
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|header| header.name == name)
    }
}
