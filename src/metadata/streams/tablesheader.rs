//! The `#~` tables stream (ECMA-335 II.24.2.6).
//!
//! The stream starts with a fixed header, followed by one row count per present table and the
//! tables themselves, stored back to back in table-number order.

use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::{
    file::io::read_le,
    metadata::tables::{MetadataTable, TableId, TableInfo, TableInfoRef, TABLE_COUNT},
    Result,
};

/// Heap-size flag: the stream carries 4 extra bytes after the row counts
const EXTRA_DATA: u8 = 0x40;

/// Bits of the `valid` vector that name tables the reader understands
const KNOWN_TABLES: u64 = (1u64 << 0x2D) - 1;

/// The parsed tables stream.
///
/// # Examples
///
/// ```rust,no_run
/// use winmdscope::{metadata::tables::TableId, Database};
///
/// let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
/// let tables = db.tables();
/// println!("TypeDef rows: {}", tables.table(TableId::TypeDef).row_count());
/// # Ok::<(), winmdscope::Error>(())
/// ```
pub struct TablesHeader<'a> {
    /// Major version of the table schema, 2 for current metadata
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Raw heap-size flags
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of tables the producer declares as sorted
    pub sorted: u64,
    /// Row counts and index widths
    pub info: TableInfoRef,
    tables: Vec<MetadataTable<'a>>,
}

impl<'a> TablesHeader<'a> {
    /// Parse the tables stream
    ///
    /// # Errors
    /// Returns an error if the stream is truncated, declares tables the reader does not know,
    /// or a table does not fit into the stream.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(out_of_bounds_error!());
        }

        let valid = read_le::<u64>(&data[8..])?;
        if valid & !KNOWN_TABLES != 0 {
            log::debug!("unsupported tables present - valid = {:#x}", valid);
            return Err(crate::Error::NotSupported);
        }

        let heap_sizes = read_le::<u8>(&data[6..])?;
        let info = Arc::new(TableInfo::new(data, valid, heap_sizes)?);

        let mut offset = 24 + valid.count_ones() as usize * 4;
        if heap_sizes & EXTRA_DATA != 0 {
            offset += 4;
        }

        let mut tables = Vec::with_capacity(TABLE_COUNT);
        for table_id in TableId::iter() {
            let rows = info.rows(table_id);
            if valid & table_id.mask() == 0 || rows == 0 {
                tables.push(MetadataTable::empty(table_id, &info));
                continue;
            }

            let Some(table_data) = data.get(offset..) else {
                return Err(out_of_bounds_error!());
            };

            let table = MetadataTable::new(table_id, table_data, rows, &info)?;
            offset += table.size();
            tables.push(table);
        }

        Ok(TablesHeader {
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            heap_sizes,
            valid,
            sorted: read_le::<u64>(&data[16..])?,
            info,
            tables,
        })
    }

    /// The table with id `table_id`; absent tables are empty
    #[must_use]
    pub fn table(&self, table_id: TableId) -> &MetadataTable<'a> {
        &self.tables[table_id as usize]
    }

    /// Number of present tables
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Returns true if `table_id` is present in the stream
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.valid & table_id.mask() != 0
    }

    /// Returns true if the producer declares `table_id` as sorted
    #[must_use]
    pub fn is_sorted(&self, table_id: TableId) -> bool {
        self.sorted & table_id.mask() != 0
    }
}
