//! Coded indexes: tagged references into one of several candidate tables.
//!
//! A coded index stores `(row << tag_bits) | tag`, where `tag` selects an entry of the kind's
//! candidate list and `row` is a 1-based row number (0 is the null reference). The number of
//! tag bits only depends on the number of candidates; whether the value occupies 2 or 4 bytes
//! in a table row depends on the row counts of the candidate tables and is answered by
//! [`crate::metadata::tables::TableInfo`].
//!
//! # Reference
//! * ECMA-335 Partition II, Section 24.2.6

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::Token},
    Result,
};

/// The kinds of coded index defined by ECMA-335.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Any of the 22 tables that can carry custom attributes
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// `MethodDef` or `MemberRef`, at tags 2 and 3 of five slots
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// The candidate slots of this kind in tag order. Unused slots are `None`.
    #[must_use]
    pub fn slots(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                // Labelled 'Permission' in the standard, which is the DeclSecurity table
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => {
                &[Some(TableId::MethodDef), Some(TableId::MemberRef)]
            }
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => {
                &[Some(TableId::TypeDef), Some(TableId::MethodDef)]
            }
        }
    }

    /// The tables a value of this kind can reference
    pub fn tables(&self) -> impl Iterator<Item = TableId> {
        self.slots().iter().filter_map(|slot| *slot)
    }

    /// Returns true if `table` is one of the candidates of this kind
    #[must_use]
    pub fn contains(&self, table: TableId) -> bool {
        self.tables().any(|candidate| candidate == table)
    }

    /// Number of low bits holding the tag: `ceil(log2(slots))`
    #[must_use]
    pub fn tag_bits(&self) -> u8 {
        let slots = self.slots().len();
        if slots <= 1 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let bits = (usize::BITS - (slots - 1).leading_zeros()) as u8;
            bits
        }
    }

    /// Split a raw coded index into its target table and row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the tag selects no candidate of this kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use winmdscope::metadata::tables::{CodedIndexType, TableId};
    ///
    /// let index = CodedIndexType::ResolutionScope.decode(0x0E)?;
    /// assert_eq!(index.tag, TableId::AssemblyRef);
    /// assert_eq!(index.row, 3);
    /// # Ok::<(), winmdscope::Error>(())
    /// ```
    pub fn decode(self, value: u32) -> Result<CodedIndex> {
        let tag_bits = self.tag_bits();
        let tag_mask = (1u32 << tag_bits) - 1;
        let tag = (value & tag_mask) as usize;
        let row = value >> tag_bits;

        match self.slots().get(tag) {
            Some(Some(table)) => Ok(CodedIndex::new(self, *table, row)),
            _ => Err(malformed_error!(
                "Invalid tag {} for coded index {:?} - 0x{:X}",
                tag,
                self,
                value
            )),
        }
    }

    /// Encode a reference to `row` of `table` as a raw value of this kind
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `table` is not a candidate of this kind, or the
    /// row does not fit next to the tag.
    pub fn encode(self, table: TableId, row: u32) -> Result<u32> {
        let Some(tag) = self.slots().iter().position(|slot| *slot == Some(table)) else {
            return Err(malformed_error!(
                "Table {:?} is not valid for coded index {:?}",
                table,
                self
            ));
        };

        let tag_bits = self.tag_bits();
        if tag_bits > 0 && row >> (32 - u32::from(tag_bits)) != 0 {
            return Err(malformed_error!(
                "Row {} does not fit into coded index {:?}",
                row,
                self
            ));
        }

        #[allow(clippy::cast_possible_truncation)]
        Ok((row << tag_bits) | tag as u32)
    }
}

/// A decoded coded index.
///
/// Equality is structural over kind, table and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodedIndex {
    /// The coded index kind this value was decoded as
    pub kind: CodedIndexType,
    /// The table the value references
    pub tag: TableId,
    /// The 1-based row, 0 for a null reference
    pub row: u32,
    /// Token equivalent of `tag` and `row`
    pub token: Token,
}

impl CodedIndex {
    /// Create a coded index referencing `row` of `tag`
    #[must_use]
    pub fn new(kind: CodedIndexType, tag: TableId, row: u32) -> CodedIndex {
        CodedIndex {
            kind,
            tag,
            row,
            token: Token::from_parts(tag, row),
        }
    }

    /// Returns true if the value does not reference any row
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }

    /// The raw value as stored in a table column or signature
    ///
    /// # Errors
    /// Returns an error if `tag` is not a candidate of `kind`.
    pub fn encode(&self) -> Result<u32> {
        self.kind.encode(self.tag, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_bits() {
        assert_eq!(CodedIndexType::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasConstant.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasCustomAttribute.tag_bits(), 5);
        assert_eq!(CodedIndexType::HasFieldMarshal.tag_bits(), 1);
        assert_eq!(CodedIndexType::HasDeclSecurity.tag_bits(), 2);
        assert_eq!(CodedIndexType::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexType::HasSemantics.tag_bits(), 1);
        assert_eq!(CodedIndexType::MethodDefOrRef.tag_bits(), 1);
        assert_eq!(CodedIndexType::MemberForwarded.tag_bits(), 1);
        assert_eq!(CodedIndexType::Implementation.tag_bits(), 2);
        assert_eq!(CodedIndexType::CustomAttributeType.tag_bits(), 3);
        assert_eq!(CodedIndexType::ResolutionScope.tag_bits(), 2);
        assert_eq!(CodedIndexType::TypeOrMethodDef.tag_bits(), 1);
    }

    #[test]
    fn decode() {
        let index = CodedIndexType::TypeDefOrRef.decode(0x0000_0019).unwrap();
        assert_eq!(index.tag, TableId::TypeRef);
        assert_eq!(index.row, 6);
        assert_eq!(index.token, Token::new(0x0100_0006));

        let index = CodedIndexType::HasCustomAttribute.decode(0x0000_0063).unwrap();
        assert_eq!(index.tag, TableId::TypeDef);
        assert_eq!(index.row, 3);

        let index = CodedIndexType::CustomAttributeType.decode(0x0000_002B).unwrap();
        assert_eq!(index.tag, TableId::MemberRef);
        assert_eq!(index.row, 5);
    }

    #[test]
    fn decode_null() {
        let index = CodedIndexType::ResolutionScope.decode(0).unwrap();
        assert!(index.is_null());
        assert_eq!(index.tag, TableId::Module);
        assert!(index.token.is_null());

        let index = CodedIndexType::TypeDefOrRef.decode(0x1).unwrap();
        assert!(index.is_null());
        assert_eq!(index.tag, TableId::TypeRef);
    }

    #[test]
    fn decode_invalid_tag() {
        assert!(CodedIndexType::TypeDefOrRef.decode(0x0000_0007).is_err());
        assert!(CodedIndexType::HasCustomAttribute.decode(0x0000_0016).is_err());
        assert!(CodedIndexType::HasCustomAttribute.decode(0x0000_001F).is_err());
        // Unused CustomAttributeType slots
        assert!(CodedIndexType::CustomAttributeType.decode(0x0000_0008).is_err());
        assert!(CodedIndexType::CustomAttributeType.decode(0x0000_0009).is_err());
        assert!(CodedIndexType::CustomAttributeType.decode(0x0000_000C).is_err());
        assert!(CodedIndexType::CustomAttributeType.decode(0x0000_000D).is_err());
    }

    #[test]
    fn encode_rejects_foreign_table() {
        assert!(CodedIndexType::TypeDefOrRef.encode(TableId::MethodDef, 1).is_err());
        assert!(CodedIndexType::ResolutionScope.encode(TableId::TypeDef, 1).is_err());
        assert!(CodedIndexType::TypeDefOrRef.encode(TableId::TypeDef, 0x4000_0000).is_err());
    }

    #[test]
    fn round_trip_every_kind() {
        for kind in CodedIndexType::iter() {
            let tag_bits = kind.tag_bits();
            for (tag, slot) in kind.slots().iter().enumerate() {
                for row in [0u32, 1, 2, 0x7F, 0x3FFF, 0x00FF_FFFF] {
                    let raw = (row << tag_bits) | tag as u32;
                    match slot {
                        Some(table) => {
                            let decoded = kind.decode(raw).unwrap();
                            assert_eq!(decoded.tag, *table);
                            assert_eq!(decoded.row, row);
                            assert_eq!(decoded.encode().unwrap(), raw, "{kind:?}");
                        }
                        None => assert!(kind.decode(raw).is_err()),
                    }
                }
            }
        }
    }
}
