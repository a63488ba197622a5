//! Untyped access to the rows of one metadata table.

use crate::{
    file::io::read_le_at,
    metadata::tables::types::{ColumnType, TableId, TableInfo},
    Result,
};

/// Position and width of a column inside a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Byte offset from the start of the row
    pub offset: u8,
    /// Width in bytes: 1, 2 or 4
    pub width: u8,
    /// Storage class of the column
    pub kind: ColumnType,
}

/// The raw rows of one table, addressed by 1-based row number and column position.
///
/// Reading never interprets heap or table references; it only returns the stored integer.
#[derive(Clone, Debug)]
pub struct MetadataTable<'a> {
    id: TableId,
    data: &'a [u8],
    rows: u32,
    row_size: u32,
    columns: Vec<ColumnLayout>,
}

impl<'a> MetadataTable<'a> {
    /// Create a table over `data`, which must hold exactly `rows` rows
    ///
    /// # Errors
    /// Returns an error if `data` is shorter than `rows` rows of this table.
    pub fn new(id: TableId, data: &'a [u8], rows: u32, info: &TableInfo) -> Result<Self> {
        let (columns, row_size) = Self::layout(id, info);
        let Some(size) = (rows as usize).checked_mul(row_size as usize) else {
            return Err(out_of_bounds_error!());
        };
        if size > data.len() {
            return Err(malformed_error!(
                "Table {:?} needs {} bytes, only {} available",
                id,
                size,
                data.len()
            ));
        }

        Ok(MetadataTable {
            id,
            data: &data[..size],
            rows,
            row_size,
            columns,
        })
    }

    /// An empty table
    #[must_use]
    pub fn empty(id: TableId, info: &TableInfo) -> Self {
        let (columns, row_size) = Self::layout(id, info);
        MetadataTable {
            id,
            data: &[],
            rows: 0,
            row_size,
            columns,
        }
    }

    fn layout(id: TableId, info: &TableInfo) -> (Vec<ColumnLayout>, u32) {
        let mut columns = Vec::with_capacity(id.columns().len());
        let mut offset = 0u8;
        for kind in id.columns() {
            let width = kind.width(info);
            columns.push(ColumnLayout {
                offset,
                width,
                kind: *kind,
            });
            offset += width;
        }

        (columns, u32::from(offset))
    }

    /// The table identifier
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Total size of the table in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Column layouts in storage order
    #[must_use]
    pub fn columns(&self) -> &[ColumnLayout] {
        &self.columns
    }

    /// Raw bytes of row `rid`
    ///
    /// # Errors
    /// Returns an error if `rid` is 0 or larger than the row count.
    pub fn row_data(&self, rid: u32) -> Result<&'a [u8]> {
        if rid == 0 || rid > self.rows {
            return Err(malformed_error!(
                "Row {} out of range for table {:?} with {} rows",
                rid,
                self.id,
                self.rows
            ));
        }

        let start = (rid - 1) as usize * self.row_size as usize;
        Ok(&self.data[start..start + self.row_size as usize])
    }

    /// The stored value of `column` in row `rid`, widened to `u32`
    ///
    /// # Errors
    /// Returns an error if `rid` or `column` are out of range.
    pub fn value(&self, rid: u32, column: usize) -> Result<u32> {
        let Some(layout) = self.columns.get(column) else {
            return Err(malformed_error!(
                "Column {} out of range for table {:?}",
                column,
                self.id
            ));
        };

        let row = self.row_data(rid)?;
        let mut offset = layout.offset as usize;
        match layout.width {
            1 => Ok(u32::from(read_le_at::<u8>(row, &mut offset)?)),
            2 => Ok(u32::from(read_le_at::<u16>(row, &mut offset)?)),
            _ => read_le_at::<u32>(row, &mut offset),
        }
    }
}
