//! Core infrastructure for metadata tables.
//!
//! - [`TableId`] enumerates the 45 tables of ECMA-335 II.22
//! - [`CodedIndexType`] and [`CodedIndex`] describe tagged cross-table references
//! - [`TableInfo`] computes row counts and column widths of one image
//! - [`ColumnType`] and [`TableId::columns`] give the column schema of every table
//! - [`MetadataTable`] reads raw column values
//! - [`TableRow`] and [`RowRange`] provide typed, database-bound row handles
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Sections 22 and 24.2.6

mod codedindex;
mod row;
mod schema;
mod table;
mod tableid;
mod tableinfo;

pub use codedindex::{CodedIndex, CodedIndexType, CodedIndexTypeIter};
pub use row::{RowRange, TableRow};
pub(crate) use row::{list_owner, table_row};
pub use schema::ColumnType;
pub use table::{ColumnLayout, MetadataTable};
pub use tableid::{TableId, TableIdIter, TABLE_COUNT};
pub use tableinfo::{TableInfo, TableInfoRef, TableRowInfo};
