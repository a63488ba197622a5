//! Row counts and index widths of a tables stream.
//!
//! Every variable-width column (heap index, simple table index, coded index) takes 2 or 4
//! bytes depending on the sizes recorded in the tables stream header. [`TableInfo`] computes
//! all of them once so column layouts can be derived without re-reading the header.

use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::read_le_at,
    metadata::tables::types::{CodedIndexType, TableId, TABLE_COUNT},
    Result,
};

/// Row count of one table and the number of bits needed to address its rows.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Bits required to store the largest row number
    pub bits: u8,
    /// True if simple indexes into this table need 4 bytes
    pub is_large: bool,
}

impl TableRowInfo {
    /// Derive the index information for a table with `rows` rows
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Row counts, heap widths and coded index widths of one metadata image.
#[derive(Clone, Debug)]
pub struct TableInfo {
    rows: [TableRowInfo; TABLE_COUNT],
    coded_indexes: [u8; CodedIndexType::COUNT],
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Shared reference to a [`TableInfo`]
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Read row counts from a tables stream header
    ///
    /// `data` is the tables stream; row counts start at offset 24, one `u32` for every bit set
    /// in `valid_bitvec`.
    ///
    /// # Errors
    /// Returns an error if the row counts are truncated.
    pub fn new(data: &[u8], valid_bitvec: u64, heap_sizes: u8) -> Result<Self> {
        let mut rows = [TableRowInfo::default(); TABLE_COUNT];
        let mut next_row_offset = 24;

        for table_id in TableId::iter() {
            if valid_bitvec & table_id.mask() == 0 {
                continue;
            }

            let row_count = read_le_at::<u32>(data, &mut next_row_offset)?;
            rows[table_id as usize] = TableRowInfo::new(row_count);
        }

        Ok(Self::with_rows(
            rows,
            heap_sizes & 0x01 != 0,
            heap_sizes & 0x02 != 0,
            heap_sizes & 0x04 != 0,
        ))
    }

    /// Build a `TableInfo` directly from row counts
    #[must_use]
    pub fn from_counts(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_guid: bool,
        large_blob: bool,
    ) -> Self {
        let mut rows = [TableRowInfo::default(); TABLE_COUNT];
        for (table_id, count) in valid_tables {
            rows[*table_id as usize] = TableRowInfo::new(*count);
        }

        Self::with_rows(rows, large_str, large_guid, large_blob)
    }

    fn with_rows(
        rows: [TableRowInfo; TABLE_COUNT],
        large_str: bool,
        large_guid: bool,
        large_blob: bool,
    ) -> Self {
        let mut table_info = TableInfo {
            rows,
            coded_indexes: [0; CodedIndexType::COUNT],
            is_large_index_str: large_str,
            is_large_index_guid: large_guid,
            is_large_index_blob: large_blob,
        };

        for coded_index in CodedIndexType::iter() {
            table_info.coded_indexes[coded_index as usize] =
                table_info.calculate_coded_index_size(coded_index);
        }

        table_info
    }

    /// Row information of `table`
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Number of rows of `table`
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Width in bytes of a `#Strings` index
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Width in bytes of a `#GUID` index
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Width in bytes of a `#Blob` index
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Width in bytes of a simple index into `table_id`
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Total bits needed by a coded index of this kind: largest row bits plus tag bits
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Width in bytes of a coded index of this kind
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    fn calculate_coded_index_size(&self, coded_index_type: CodedIndexType) -> u8 {
        let max_bits = coded_index_type
            .tables()
            .map(|table| self.rows[table as usize].bits)
            .max()
            .unwrap_or(1);

        max_bits + coded_index_type.tag_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_image() {
        let info = TableInfo::from_counts(
            &[(TableId::TypeDef, 100), (TableId::TypeRef, 50)],
            false,
            false,
            false,
        );

        assert_eq!(info.rows(TableId::TypeDef), 100);
        assert_eq!(info.rows(TableId::Field), 0);
        assert_eq!(info.str_bytes(), 2);
        assert_eq!(info.table_index_bytes(TableId::TypeDef), 2);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 2);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 2);
    }

    #[test]
    fn coded_index_width_threshold() {
        // 2 tag bits leave 14 bits for rows: 0x3FFF still fits, 0x4000 does not.
        let info = TableInfo::from_counts(&[(TableId::TypeRef, 0x3FFF)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 2);
        assert_eq!(info.coded_index_bytes(CodedIndexType::ResolutionScope), 2);

        let info = TableInfo::from_counts(&[(TableId::TypeRef, 0x4000)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 4);
        assert_eq!(info.coded_index_bytes(CodedIndexType::ResolutionScope), 4);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasSemantics), 2);

        // 5 tag bits leave 11 bits for rows.
        let info = TableInfo::from_counts(&[(TableId::Param, 0x7FF)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 2);
        let info = TableInfo::from_counts(&[(TableId::Param, 0x800)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 4);
    }

    #[test]
    fn large_image() {
        let info = TableInfo::from_counts(&[(TableId::Field, 0x1_0000)], true, true, true);

        assert_eq!(info.str_bytes(), 4);
        assert_eq!(info.guid_bytes(), 4);
        assert_eq!(info.blob_bytes(), 4);
        assert!(info.get(TableId::Field).is_large);
        assert_eq!(info.table_index_bytes(TableId::Field), 4);
        assert_eq!(info.table_index_bytes(TableId::MethodDef), 2);
    }

    #[test]
    fn from_header() {
        let mut data = vec![0u8; 24];
        data.extend(7u32.to_le_bytes());
        data.extend(3u32.to_le_bytes());
        let valid = TableId::Module.mask() | TableId::TypeDef.mask();

        let info = TableInfo::new(&data, valid, 0x05).unwrap();
        assert_eq!(info.rows(TableId::Module), 7);
        assert_eq!(info.rows(TableId::TypeRef), 0);
        assert_eq!(info.rows(TableId::TypeDef), 3);
        assert_eq!(info.str_bytes(), 4);
        assert_eq!(info.guid_bytes(), 2);
        assert_eq!(info.blob_bytes(), 4);

        assert!(TableInfo::new(&data[..30], valid, 0).is_err());
    }
}
