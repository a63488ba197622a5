//! One-to-many lookups over tables sorted by a key column.
//!
//! ECMA-335 II.22 requires a number of tables to be sorted by the column that points at their
//! owner: all custom attributes of a type are a contiguous run of `CustomAttribute` rows, all
//! generic parameters of a method a contiguous run of `GenericParam` rows, and so on. A lookup is
//! two binary searches over the raw key column, producing the half-open run of matching rows.
//!
//! Keys are compared as raw column values. For coded-index columns that is the encoded value
//! `(row << tag_bits) | tag`, which is exactly the order the tables are sorted by.
//!
//! # Examples
//!
//! ```rust
//! use winmdscope::metadata::association::equal_range;
//!
//! let keys = [1u32, 3, 3, 3, 7, 9];
//! let range = equal_range(keys.len() as u32, 3, |rid| Ok(keys[rid as usize - 1]))?;
//! assert_eq!(range, 2..5);
//! # Ok::<(), winmdscope::Error>(())
//! ```

use std::ops::Range;

use strum::{EnumIter, IntoEnumIterator};

use crate::{
    metadata::{
        streams::TablesHeader,
        tables::{ColumnType, TableId},
        token::Token,
    },
    Result,
};

/// The sorted relations the reader answers lookups for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Association {
    /// `CustomAttribute.Parent` (`HasCustomAttribute`)
    CustomAttributeParent,
    /// `GenericParam.Owner` (`TypeOrMethodDef`)
    GenericParamOwner,
    /// `Constant.Parent` (`HasConstant`)
    ConstantParent,
    /// `MethodSemantics.Association` (`HasSemantics`)
    MethodSemanticsAssociation,
    /// `NestedClass.NestedClass` (`TypeDef`)
    NestedClassNested,
    /// `FieldMarshal.Parent` (`HasFieldMarshal`)
    FieldMarshalParent,
    /// `ClassLayout.Parent` (`TypeDef`)
    ClassLayoutParent,
    /// `InterfaceImpl.Class` (`TypeDef`)
    InterfaceImplClass,
    /// `MethodImpl.Class` (`TypeDef`)
    MethodImplClass,
    /// `ImplMap.MemberForwarded` (`MemberForwarded`)
    ImplMapMemberForwarded,
    /// `DeclSecurity.Parent` (`HasDeclSecurity`)
    DeclSecurityParent,
    /// `EventMap.Parent` (`TypeDef`)
    EventMapParent,
    /// `PropertyMap.Parent` (`TypeDef`)
    PropertyMapParent,
    /// `GenericParamConstraint.Owner` (`GenericParam`)
    GenericParamConstraintOwner,
}

impl Association {
    /// The table holding the sorted rows
    #[must_use]
    pub fn table(self) -> TableId {
        match self {
            Association::CustomAttributeParent => TableId::CustomAttribute,
            Association::GenericParamOwner => TableId::GenericParam,
            Association::ConstantParent => TableId::Constant,
            Association::MethodSemanticsAssociation => TableId::MethodSemantics,
            Association::NestedClassNested => TableId::NestedClass,
            Association::FieldMarshalParent => TableId::FieldMarshal,
            Association::ClassLayoutParent => TableId::ClassLayout,
            Association::InterfaceImplClass => TableId::InterfaceImpl,
            Association::MethodImplClass => TableId::MethodImpl,
            Association::ImplMapMemberForwarded => TableId::ImplMap,
            Association::DeclSecurityParent => TableId::DeclSecurity,
            Association::EventMapParent => TableId::EventMap,
            Association::PropertyMapParent => TableId::PropertyMap,
            Association::GenericParamConstraintOwner => TableId::GenericParamConstraint,
        }
    }

    /// Position of the key column in [`Association::table`]
    #[must_use]
    pub fn column(self) -> usize {
        match self {
            Association::CustomAttributeParent
            | Association::NestedClassNested
            | Association::FieldMarshalParent
            | Association::InterfaceImplClass
            | Association::MethodImplClass
            | Association::EventMapParent
            | Association::PropertyMapParent
            | Association::GenericParamConstraintOwner => 0,
            Association::ImplMapMemberForwarded | Association::DeclSecurityParent => 1,
            Association::GenericParamOwner
            | Association::ConstantParent
            | Association::MethodSemanticsAssociation
            | Association::ClassLayoutParent => 2,
        }
    }

    /// Storage class of the key column
    #[must_use]
    pub fn key_type(self) -> ColumnType {
        self.table().columns()[self.column()]
    }

    /// Encode `target` the way the key column stores it
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `target` lies in a table the key cannot reference.
    pub fn key(self, target: Token) -> Result<u32> {
        let Some(table) = TableId::from_u8(target.table()) else {
            return Err(malformed_error!("Invalid token - {}", target));
        };

        match self.key_type() {
            ColumnType::Coded(kind) => kind.encode(table, target.row()),
            ColumnType::Table(expected) if expected == table => Ok(target.row()),
            _ => Err(malformed_error!(
                "Token {} cannot be a key of {:?}",
                target,
                self
            )),
        }
    }

    /// The rows of [`Association::table`] whose key equals `target`
    ///
    /// # Errors
    /// Returns an error if `target` cannot be a key of this association or a row cannot be read.
    pub fn lookup(self, tables: &TablesHeader, target: Token) -> Result<Range<u32>> {
        let key = self.key(target)?;
        let table = tables.table(self.table());
        let column = self.column();

        equal_range(table.row_count(), key, |rid| table.value(rid, column))
    }

    /// Check that the key column never decreases
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsortedTable`] naming the table on the first decrease.
    pub fn verify_sorted(self, tables: &TablesHeader) -> Result<()> {
        let table = tables.table(self.table());
        let column = self.column();

        let mut previous = 0;
        for rid in 1..=table.row_count() {
            let key = table.value(rid, column)?;
            if key < previous {
                log::debug!(
                    "{:?} row {} key {:#x} follows {:#x}",
                    self.table(),
                    rid,
                    key,
                    previous
                );
                return Err(crate::Error::UnsortedTable(self.table()));
            }
            previous = key;
        }

        Ok(())
    }
}

/// Check every association table
///
/// # Errors
/// Returns [`crate::Error::UnsortedTable`] for the first table found out of order.
pub fn verify_sorted_tables(tables: &TablesHeader) -> Result<()> {
    for association in Association::iter() {
        association.verify_sorted(tables)?;
    }

    Ok(())
}

/// First row in `1..=len` whose key is not less than `key`, or `len + 1`
///
/// # Errors
/// Propagates errors of `key_at`.
pub fn lower_bound<F>(len: u32, key: u32, mut key_at: F) -> Result<u32>
where
    F: FnMut(u32) -> Result<u32>,
{
    let mut first = 1u32;
    let mut count = len;
    while count > 0 {
        let step = count / 2;
        let middle = first + step;
        if key_at(middle)? < key {
            first = middle + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }

    Ok(first)
}

/// First row in `1..=len` whose key is greater than `key`, or `len + 1`
///
/// # Errors
/// Propagates errors of `key_at`.
pub fn upper_bound<F>(len: u32, key: u32, mut key_at: F) -> Result<u32>
where
    F: FnMut(u32) -> Result<u32>,
{
    let mut first = 1u32;
    let mut count = len;
    while count > 0 {
        let step = count / 2;
        let middle = first + step;
        if key_at(middle)? <= key {
            first = middle + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }

    Ok(first)
}

/// The half-open run of 1-based rows in `1..=len` whose key equals `key`.
///
/// `key_at` reads the key of a row; the keys must be sorted non-decreasing. The result is empty,
/// positioned at the insertion point, when no row matches.
///
/// # Errors
/// Propagates errors of `key_at`.
pub fn equal_range<F>(len: u32, key: u32, mut key_at: F) -> Result<Range<u32>>
where
    F: FnMut(u32) -> Result<u32>,
{
    let start = lower_bound(len, key, &mut key_at)?;
    let end = upper_bound(len, key, &mut key_at)?;
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::CodedIndexType;

    fn keys(keys: &[u32]) -> impl FnMut(u32) -> Result<u32> + '_ {
        move |rid| Ok(keys[rid as usize - 1])
    }

    #[test]
    fn interleaved() {
        let data = [2, 2, 5, 5, 5, 8, 11, 11];

        assert_eq!(equal_range(8, 2, keys(&data)).unwrap(), 1..3);
        assert_eq!(equal_range(8, 5, keys(&data)).unwrap(), 3..6);
        assert_eq!(equal_range(8, 8, keys(&data)).unwrap(), 6..7);
        assert_eq!(equal_range(8, 11, keys(&data)).unwrap(), 7..9);
    }

    #[test]
    fn no_match() {
        let data = [2, 2, 5, 8];

        assert!(equal_range(4, 1, keys(&data)).unwrap().is_empty());
        assert!(equal_range(4, 3, keys(&data)).unwrap().is_empty());
        assert!(equal_range(4, 9, keys(&data)).unwrap().is_empty());
        assert_eq!(equal_range(4, 3, keys(&data)).unwrap(), 3..3);
        assert!(equal_range(0, 3, keys(&[])).unwrap().is_empty());
    }

    #[test]
    fn bounds() {
        let data = [1, 3, 3, 7];

        assert_eq!(lower_bound(4, 3, keys(&data)).unwrap(), 2);
        assert_eq!(upper_bound(4, 3, keys(&data)).unwrap(), 4);
        assert_eq!(lower_bound(4, 0, keys(&data)).unwrap(), 1);
        assert_eq!(upper_bound(4, 7, keys(&data)).unwrap(), 5);
    }

    #[test]
    fn errors_propagate() {
        let result = equal_range(4, 1, |_| Err(malformed_error!("broken row")));
        assert!(result.is_err());
    }

    #[test]
    fn key_columns_match_schema() {
        for association in Association::iter() {
            assert!(
                matches!(
                    association.key_type(),
                    ColumnType::Coded(_) | ColumnType::Table(_)
                ),
                "{association:?}"
            );
        }

        assert_eq!(
            Association::CustomAttributeParent.key_type(),
            ColumnType::Coded(CodedIndexType::HasCustomAttribute)
        );
        assert_eq!(
            Association::NestedClassNested.key_type(),
            ColumnType::Table(TableId::TypeDef)
        );
    }

    #[test]
    fn keys_encode_targets() {
        let typedef = Token::from_parts(TableId::TypeDef, 3);

        assert_eq!(Association::CustomAttributeParent.key(typedef).unwrap(), 0x63);
        assert_eq!(Association::GenericParamOwner.key(typedef).unwrap(), 0x6);
        assert_eq!(Association::NestedClassNested.key(typedef).unwrap(), 3);
        assert!(Association::NestedClassNested
            .key(Token::from_parts(TableId::TypeRef, 3))
            .is_err());
        assert!(Association::ConstantParent.key(typedef).is_err());
    }
}
