//! Typed row handles.
//!
//! A row handle is a `(database, row number)` pair. It is `Copy`, borrows the database it came
//! from and reads its columns on demand, so handles never outlive their image and never copy
//! heap data. Two handles are equal if they address the same row of the same database.

use std::{iter::FusedIterator, marker::PhantomData, ops::Range};

use crate::{
    metadata::{
        association::upper_bound,
        database::Database,
        tables::types::{CodedIndex, CodedIndexType, MetadataTable, TableId},
        token::Token,
    },
    Result,
};

/// A typed handle to one row of one metadata table.
///
/// Implementors only provide construction and the two fields; every column reader is a
/// provided method working on the column positions of [`TableId::columns`].
pub trait TableRow<'a>: Sized + Copy {
    /// The table this row type reads from
    const TABLE: TableId;

    /// Create a handle for row `rid`. The row number is not validated.
    fn from_row(db: &'a Database, rid: u32) -> Self;

    /// The database this row belongs to
    fn database(&self) -> &'a Database;

    /// The 1-based row number
    fn rid(&self) -> u32;

    /// The metadata token of this row
    fn token(&self) -> Token {
        Token::from_parts(Self::TABLE, self.rid())
    }

    /// The raw table this row lives in
    fn table(&self) -> &'a MetadataTable<'a> {
        self.database().tables().table(Self::TABLE)
    }

    /// Raw value of `column`
    ///
    /// # Errors
    /// Returns an error if the row or column is out of range.
    fn value(&self, column: usize) -> Result<u32> {
        self.table().value(self.rid(), column)
    }

    /// The `#Strings` entry referenced by `column`
    ///
    /// # Errors
    /// Returns an error if the column cannot be read or the heap index is invalid.
    fn string(&self, column: usize) -> Result<&'a str> {
        self.database()
            .strings()
            .get(self.value(column)? as usize)
    }

    /// The `#Blob` entry referenced by `column`
    ///
    /// # Errors
    /// Returns an error if the column cannot be read or the heap index is invalid.
    fn blob(&self, column: usize) -> Result<&'a [u8]> {
        self.database().blobs().get(self.value(column)? as usize)
    }

    /// The `#GUID` entry referenced by `column`
    ///
    /// # Errors
    /// Returns an error if the column cannot be read or the heap index is invalid.
    fn guid(&self, column: usize) -> Result<uguid::Guid> {
        self.database().guids().get(self.value(column)? as usize)
    }

    /// Decode `column` as a coded index of `kind`
    ///
    /// # Errors
    /// Returns an error if the column cannot be read or carries an invalid tag.
    fn coded_index(&self, column: usize, kind: CodedIndexType) -> Result<CodedIndex> {
        kind.decode(self.value(column)?)
    }

    /// The run of rows of `T` owned by this row through the list column `column`.
    ///
    /// The run ends where the next row's list starts, or at the end of the target table for
    /// the last row.
    ///
    /// # Errors
    /// Returns an error if the list start lies outside the target table or behind its end.
    fn list<T: TableRow<'a>>(&self, column: usize) -> Result<RowRange<'a, T>> {
        let db = self.database();
        let target_rows = db.tables().table(T::TABLE).row_count();
        let start = self.value(column)?;

        let end = if self.rid() < self.table().row_count() {
            self.table().value(self.rid() + 1, column)?
        } else {
            target_rows + 1
        };

        if start == 0 || start > end || end > target_rows + 1 {
            return Err(malformed_error!(
                "Invalid {:?} list {}..{} in {:?} row {}",
                T::TABLE,
                start,
                end,
                Self::TABLE,
                self.rid()
            ));
        }

        Ok(RowRange::new(db, start..end))
    }
}

/// The row of `O` whose list column `column` owns row `rid` of the listed table.
///
/// List columns are non-decreasing, so the owner is the last row whose list starts at or before
/// `rid`. Rows with empty lists are skipped naturally.
pub(crate) fn list_owner<'a, O: TableRow<'a>>(
    db: &'a Database,
    column: usize,
    rid: u32,
) -> Result<Option<O>> {
    let owners = db.tables().table(O::TABLE);
    let next = upper_bound(owners.row_count(), rid, |owner| owners.value(owner, column))?;
    if next <= 1 {
        return Ok(None);
    }

    Ok(Some(O::from_row(db, next - 1)))
}

/// A contiguous run of rows of one table, yielded as typed handles.
pub struct RowRange<'a, T> {
    db: &'a Database,
    rows: Range<u32>,
    marker: PhantomData<T>,
}

impl<'a, T: TableRow<'a>> RowRange<'a, T> {
    /// A range over rows `rows` of `T::TABLE`
    #[must_use]
    pub fn new(db: &'a Database, rows: Range<u32>) -> Self {
        RowRange {
            db,
            rows,
            marker: PhantomData,
        }
    }

    /// Every row of `T::TABLE`
    #[must_use]
    pub fn all(db: &'a Database) -> Self {
        let rows = db.tables().table(T::TABLE).row_count();
        Self::new(db, 1..rows + 1)
    }

    /// The row numbers still to be yielded
    #[must_use]
    pub fn rids(&self) -> Range<u32> {
        self.rows.clone()
    }
}

impl<T> Clone for RowRange<'_, T> {
    fn clone(&self) -> Self {
        RowRange {
            db: self.db,
            rows: self.rows.clone(),
            marker: PhantomData,
        }
    }
}

impl<'a, T: TableRow<'a>> Iterator for RowRange<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.rows.next().map(|rid| T::from_row(self.db, rid))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<T> {
        self.rows.nth(n).map(|rid| T::from_row(self.db, rid))
    }
}

impl<'a, T: TableRow<'a>> DoubleEndedIterator for RowRange<'a, T> {
    fn next_back(&mut self) -> Option<T> {
        self.rows.next_back().map(|rid| T::from_row(self.db, rid))
    }
}

impl<'a, T: TableRow<'a>> ExactSizeIterator for RowRange<'a, T> {}

impl<'a, T: TableRow<'a>> FusedIterator for RowRange<'a, T> {}

/// Declare a typed row handle for one table.
///
/// Generates the struct, its [`TableRow`] implementation, structural equality, ordering by row,
/// hashing and a `Debug` that prints the token.
macro_rules! table_row {
    ($(#[$attr:meta])* $name:ident => $table:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            db: &'a $crate::metadata::database::Database,
            rid: u32,
        }

        impl<'a> $crate::metadata::tables::TableRow<'a> for $name<'a> {
            const TABLE: $crate::metadata::tables::TableId =
                $crate::metadata::tables::TableId::$table;

            fn from_row(db: &'a $crate::metadata::database::Database, rid: u32) -> Self {
                $name { db, rid }
            }

            fn database(&self) -> &'a $crate::metadata::database::Database {
                self.db
            }

            fn rid(&self) -> u32 {
                self.rid
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.rid == other.rid && std::ptr::eq(self.db, other.db)
            }
        }

        impl Eq for $name<'_> {}

        impl PartialOrd for $name<'_> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name<'_> {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.rid.cmp(&other.rid)
            }
        }

        impl std::hash::Hash for $name<'_> {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.rid.hash(state);
                std::ptr::hash(self.db, state);
            }
        }

        impl std::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{}({})",
                    stringify!($name),
                    $crate::metadata::tables::TableRow::token(self)
                )
            }
        }
    };
}

pub(crate) use table_row;
