//! Column schema of every metadata table (ECMA-335 II.22).
//!
//! Columns are listed in storage order. Typed row accessors refer to columns by their
//! position in these lists.

use crate::metadata::tables::types::{CodedIndexType, TableId, TableInfo};

/// The storage class of a table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// A 1-byte constant
    U8,
    /// A 2-byte constant
    U16,
    /// A 4-byte constant
    U32,
    /// An index into the `#Strings` heap
    String,
    /// An index into the `#GUID` heap
    Guid,
    /// An index into the `#Blob` heap
    Blob,
    /// A simple index into another table
    Table(TableId),
    /// A coded index
    Coded(CodedIndexType),
}

impl ColumnType {
    /// Width of this column in bytes for the given image
    #[must_use]
    pub fn width(&self, info: &TableInfo) -> u8 {
        match self {
            ColumnType::U8 => 1,
            ColumnType::U16 => 2,
            ColumnType::U32 => 4,
            ColumnType::String => info.str_bytes(),
            ColumnType::Guid => info.guid_bytes(),
            ColumnType::Blob => info.blob_bytes(),
            ColumnType::Table(table) => info.table_index_bytes(*table),
            ColumnType::Coded(kind) => info.coded_index_bytes(*kind),
        }
    }
}

use ColumnType::{Blob, Coded, Guid, String, Table, U16, U32, U8};

impl TableId {
    /// Columns of this table in storage order
    #[must_use]
    pub fn columns(self) -> &'static [ColumnType] {
        match self {
            TableId::Module => &[U16, String, Guid, Guid, Guid],
            TableId::TypeRef => &[Coded(CodedIndexType::ResolutionScope), String, String],
            TableId::TypeDef => &[
                U32,
                String,
                String,
                Coded(CodedIndexType::TypeDefOrRef),
                Table(TableId::Field),
                Table(TableId::MethodDef),
            ],
            TableId::FieldPtr => &[Table(TableId::Field)],
            TableId::Field => &[U16, String, Blob],
            TableId::MethodPtr => &[Table(TableId::MethodDef)],
            TableId::MethodDef => &[U32, U16, U16, String, Blob, Table(TableId::Param)],
            TableId::ParamPtr => &[Table(TableId::Param)],
            TableId::Param => &[U16, U16, String],
            TableId::InterfaceImpl => &[Table(TableId::TypeDef), Coded(CodedIndexType::TypeDefOrRef)],
            TableId::MemberRef => &[Coded(CodedIndexType::MemberRefParent), String, Blob],
            TableId::Constant => &[U8, U8, Coded(CodedIndexType::HasConstant), Blob],
            TableId::CustomAttribute => &[
                Coded(CodedIndexType::HasCustomAttribute),
                Coded(CodedIndexType::CustomAttributeType),
                Blob,
            ],
            TableId::FieldMarshal => &[Coded(CodedIndexType::HasFieldMarshal), Blob],
            TableId::DeclSecurity => &[U16, Coded(CodedIndexType::HasDeclSecurity), Blob],
            TableId::ClassLayout => &[U16, U32, Table(TableId::TypeDef)],
            TableId::FieldLayout => &[U32, Table(TableId::Field)],
            TableId::StandAloneSig => &[Blob],
            TableId::EventMap => &[Table(TableId::TypeDef), Table(TableId::Event)],
            TableId::EventPtr => &[Table(TableId::Event)],
            TableId::Event => &[U16, String, Coded(CodedIndexType::TypeDefOrRef)],
            TableId::PropertyMap => &[Table(TableId::TypeDef), Table(TableId::Property)],
            TableId::PropertyPtr => &[Table(TableId::Property)],
            TableId::Property => &[U16, String, Blob],
            TableId::MethodSemantics => &[
                U16,
                Table(TableId::MethodDef),
                Coded(CodedIndexType::HasSemantics),
            ],
            TableId::MethodImpl => &[
                Table(TableId::TypeDef),
                Coded(CodedIndexType::MethodDefOrRef),
                Coded(CodedIndexType::MethodDefOrRef),
            ],
            TableId::ModuleRef => &[String],
            TableId::TypeSpec => &[Blob],
            TableId::ImplMap => &[
                U16,
                Coded(CodedIndexType::MemberForwarded),
                String,
                Table(TableId::ModuleRef),
            ],
            TableId::FieldRVA => &[U32, Table(TableId::Field)],
            TableId::EncLog => &[U32, U32],
            TableId::EncMap => &[U32],
            TableId::Assembly => &[U32, U16, U16, U16, U16, U32, Blob, String, String],
            TableId::AssemblyProcessor => &[U32],
            TableId::AssemblyOS => &[U32, U32, U32],
            TableId::AssemblyRef => &[U16, U16, U16, U16, U32, Blob, String, String, Blob],
            TableId::AssemblyRefProcessor => &[U32, Table(TableId::AssemblyRef)],
            TableId::AssemblyRefOS => &[U32, U32, U32, Table(TableId::AssemblyRef)],
            TableId::File => &[U32, String, Blob],
            TableId::ExportedType => &[
                U32,
                U32,
                String,
                String,
                Coded(CodedIndexType::Implementation),
            ],
            TableId::ManifestResource => &[U32, U32, String, Coded(CodedIndexType::Implementation)],
            TableId::NestedClass => &[Table(TableId::TypeDef), Table(TableId::TypeDef)],
            TableId::GenericParam => &[
                U16,
                U16,
                Coded(CodedIndexType::TypeOrMethodDef),
                String,
            ],
            TableId::MethodSpec => &[Coded(CodedIndexType::MethodDefOrRef), Blob],
            TableId::GenericParamConstraint => &[
                Table(TableId::GenericParam),
                Coded(CodedIndexType::TypeDefOrRef),
            ],
        }
    }

    /// Size of one row of this table in bytes
    #[must_use]
    pub fn row_size(self, info: &TableInfo) -> u32 {
        self.columns()
            .iter()
            .map(|column| u32::from(column.width(info)))
            .sum()
    }
}
