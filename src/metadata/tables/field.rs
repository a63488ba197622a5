//! `Field` (0x04) and `FieldMarshal` (0x0D).

use crate::{
    metadata::{
        association::Association,
        signatures::{parse_field_signature, SignatureField},
        tables::{list_owner, table_row, CodedIndex, CodedIndexType, Constant, TableRow, TypeDef},
    },
    Result,
};

#[allow(non_snake_case)]
/// `Field.Flags` constants (ECMA-335 II.23.1.5)
pub mod FieldAttributes {
    /// Accessibility mask
    pub const FIELD_ACCESS_MASK: u16 = 0x0007;
    /// Not referenceable
    pub const COMPILER_CONTROLLED: u16 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u16 = 0x0001;
    /// Accessible by subtypes in this assembly
    pub const FAM_AND_ASSEM: u16 = 0x0002;
    /// Accessible in this assembly
    pub const ASSEMBLY: u16 = 0x0003;
    /// Accessible by subtypes
    pub const FAMILY: u16 = 0x0004;
    /// Accessible by subtypes and in this assembly
    pub const FAM_OR_ASSEM: u16 = 0x0005;
    /// Accessible everywhere
    pub const PUBLIC: u16 = 0x0006;
    /// Belongs to the type, not to instances
    pub const STATIC: u16 = 0x0010;
    /// Only initialised, never written afterwards
    pub const INIT_ONLY: u16 = 0x0020;
    /// Compile-time constant
    pub const LITERAL: u16 = 0x0040;
    /// Not serialised
    pub const NOT_SERIALIZED: u16 = 0x0080;
    /// Has an RVA
    pub const HAS_FIELD_RVA: u16 = 0x0100;
    /// Name is special
    pub const SPECIAL_NAME: u16 = 0x0200;
    /// Name is special to the runtime
    pub const RT_SPECIAL_NAME: u16 = 0x0400;
    /// Has marshalling information
    pub const HAS_FIELD_MARSHAL: u16 = 0x1000;
    /// Platform invoke implementation
    pub const PINVOKE_IMPL: u16 = 0x2000;
    /// Has a default value
    pub const HAS_DEFAULT: u16 = 0x8000;
}

table_row! {
    /// A field of a type
    Field => Field
}

impl<'a> Field<'a> {
    /// `FieldAttributes` of the field
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// Field name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// Decoded `FieldSig`
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or is not a field signature.
    pub fn signature(&self) -> Result<SignatureField> {
        parse_field_signature(self.blob(2)?)
    }

    /// Returns true for static fields
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn is_static(&self) -> Result<bool> {
        Ok(self.flags()? & FieldAttributes::STATIC != 0)
    }

    /// Returns true for compile-time constants
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn is_literal(&self) -> Result<bool> {
        Ok(self.flags()? & FieldAttributes::LITERAL != 0)
    }

    /// The type declaring this field
    ///
    /// # Errors
    /// Returns an error if the `TypeDef` field lists cannot be read.
    pub fn parent(&self) -> Result<Option<TypeDef<'a>>> {
        list_owner(self.database(), 4, self.rid())
    }

    /// The constant value of a literal field
    ///
    /// # Errors
    /// Returns an error if the `Constant` table cannot be searched.
    pub fn constant(&self) -> Result<Option<Constant<'a>>> {
        Ok(self
            .database()
            .associated(Association::ConstantParent, self.token())?
            .next())
    }

    /// Marshalling information of the field
    ///
    /// # Errors
    /// Returns an error if the `FieldMarshal` table cannot be searched.
    pub fn marshal(&self) -> Result<Option<FieldMarshal<'a>>> {
        Ok(self
            .database()
            .associated(Association::FieldMarshalParent, self.token())?
            .next())
    }
}

table_row! {
    /// Native marshalling information of a field or parameter
    FieldMarshal => FieldMarshal
}

impl<'a> FieldMarshal<'a> {
    /// The field or parameter, `HasFieldMarshal`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn parent(&self) -> Result<CodedIndex> {
        self.coded_index(0, CodedIndexType::HasFieldMarshal)
    }

    /// The undecoded `MarshalSpec` blob
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn native_type(&self) -> Result<&'a [u8]> {
        self.blob(1)
    }
}
