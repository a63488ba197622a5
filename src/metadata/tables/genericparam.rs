//! `GenericParam` (0x2A) and `GenericParamConstraint` (0x2C).
//!
//! Win32 metadata itself has no generics; WinRT metadata does, for `IVector<T>` and friends.

use crate::{
    metadata::{
        association::Association,
        tables::{table_row, CodedIndex, CodedIndexType, RowRange, TableRow},
    },
    Result,
};

#[allow(non_snake_case)]
/// `GenericParam.Flags` constants (ECMA-335 II.23.1.7)
pub mod GenericParamAttributes {
    /// Variance mask
    pub const VARIANCE_MASK: u16 = 0x0003;
    /// Covariant (`out T`)
    pub const COVARIANT: u16 = 0x0001;
    /// Contravariant (`in T`)
    pub const CONTRAVARIANT: u16 = 0x0002;
    /// Special constraint mask
    pub const SPECIAL_CONSTRAINT_MASK: u16 = 0x001C;
    /// `class` constraint
    pub const REFERENCE_TYPE_CONSTRAINT: u16 = 0x0004;
    /// `struct` constraint
    pub const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT: u16 = 0x0008;
    /// `new()` constraint
    pub const DEFAULT_CONSTRUCTOR_CONSTRAINT: u16 = 0x0010;
}

table_row! {
    /// A generic parameter of a type or method
    GenericParam => GenericParam
}

impl<'a> GenericParam<'a> {
    /// 0-based position in the owner's parameter list
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn number(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// `GenericParamAttributes` of the parameter
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(1)? as u16)
    }

    /// The declaring type or method, `TypeOrMethodDef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn owner(&self) -> Result<CodedIndex> {
        self.coded_index(2, CodedIndexType::TypeOrMethodDef)
    }

    /// Parameter name, e.g. `T`
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(3)
    }

    /// Type constraints on the parameter
    ///
    /// # Errors
    /// Returns an error if the `GenericParamConstraint` table cannot be searched.
    pub fn constraints(&self) -> Result<RowRange<'a, GenericParamConstraint<'a>>> {
        self.database()
            .associated(Association::GenericParamConstraintOwner, self.token())
    }
}

table_row! {
    /// A type constraint on a generic parameter
    GenericParamConstraint => GenericParamConstraint
}

impl<'a> GenericParamConstraint<'a> {
    /// The constrained parameter
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `GenericParam`.
    pub fn owner(&self) -> Result<GenericParam<'a>> {
        self.database().row(self.value(0)?)
    }

    /// The constraint type, `TypeDefOrRef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn constraint(&self) -> Result<CodedIndex> {
        self.coded_index(1, CodedIndexType::TypeDefOrRef)
    }
}
