//! `MethodDef` (0x06), `Param` (0x08), `MemberRef` (0x0A) and `MethodImpl` (0x19).

use crate::{
    metadata::{
        association::Association,
        signatures::{parse_method_signature, SignatureMethod},
        tables::{
            list_owner, table_row, CodedIndex, CodedIndexType, Constant, FieldMarshal,
            GenericParam, RowRange, TableRow, TypeDef,
        },
    },
    Result,
};

#[allow(non_snake_case)]
/// `MethodDef.Flags` constants (ECMA-335 II.23.1.10)
pub mod MethodAttributes {
    /// Accessibility mask
    pub const MEMBER_ACCESS_MASK: u16 = 0x0007;
    /// Accessible everywhere
    pub const PUBLIC: u16 = 0x0006;
    /// Belongs to the type, not to instances
    pub const STATIC: u16 = 0x0010;
    /// Cannot be overridden
    pub const FINAL: u16 = 0x0020;
    /// Virtual dispatch
    pub const VIRTUAL: u16 = 0x0040;
    /// Hidden by name and signature
    pub const HIDE_BY_SIG: u16 = 0x0080;
    /// Gets a new vtable slot
    pub const NEW_SLOT: u16 = 0x0100;
    /// No implementation
    pub const ABSTRACT: u16 = 0x0400;
    /// Name is special, e.g. property accessors
    pub const SPECIAL_NAME: u16 = 0x0800;
    /// Name is special to the runtime
    pub const RT_SPECIAL_NAME: u16 = 0x1000;
    /// Implemented through platform invoke
    pub const PINVOKE_IMPL: u16 = 0x2000;
    /// Has security information
    pub const HAS_SECURITY: u16 = 0x4000;
}

#[allow(non_snake_case)]
/// `Param.Flags` constants (ECMA-335 II.23.1.13)
pub mod ParamAttributes {
    /// Input parameter
    pub const IN: u16 = 0x0001;
    /// Output parameter
    pub const OUT: u16 = 0x0002;
    /// Optional parameter
    pub const OPTIONAL: u16 = 0x0010;
    /// Has a default value
    pub const HAS_DEFAULT: u16 = 0x1000;
    /// Has marshalling information
    pub const HAS_FIELD_MARSHAL: u16 = 0x2000;
}

table_row! {
    /// A method of a type
    MethodDef => MethodDef
}

impl<'a> MethodDef<'a> {
    /// RVA of the method body, 0 for abstract methods and imports
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn rva(&self) -> Result<u32> {
        self.value(0)
    }

    /// `MethodImplAttributes` of the method
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn impl_flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(1)? as u16)
    }

    /// `MethodAttributes` of the method
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(2)? as u16)
    }

    /// Method name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(3)
    }

    /// Decoded `MethodDefSig`
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or is malformed.
    pub fn signature(&self) -> Result<SignatureMethod> {
        parse_method_signature(self.blob(4)?)
    }

    /// Parameter rows; sequence 0, if present, describes the return value
    ///
    /// # Errors
    /// Returns an error if the parameter list is malformed.
    pub fn params(&self) -> Result<RowRange<'a, Param<'a>>> {
        self.list(5)
    }

    /// Returns true if the method has a special name, e.g. a property accessor
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn special_name(&self) -> Result<bool> {
        Ok(self.flags()? & MethodAttributes::SPECIAL_NAME != 0)
    }

    /// Returns true for static methods
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn is_static(&self) -> Result<bool> {
        Ok(self.flags()? & MethodAttributes::STATIC != 0)
    }

    /// The type declaring this method
    ///
    /// # Errors
    /// Returns an error if the `TypeDef` method lists cannot be read.
    pub fn parent(&self) -> Result<Option<TypeDef<'a>>> {
        list_owner(self.database(), 5, self.rid())
    }

    /// Generic parameters of the method, in number order
    ///
    /// # Errors
    /// Returns an error if the `GenericParam` table cannot be searched.
    pub fn generic_params(&self) -> Result<RowRange<'a, GenericParam<'a>>> {
        self.database()
            .associated(Association::GenericParamOwner, self.token())
    }
}

table_row! {
    /// A parameter of a method
    Param => Param
}

impl<'a> Param<'a> {
    /// `ParamAttributes` of the parameter
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// Position in the signature, 1-based; 0 is the return value
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn sequence(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(1)? as u16)
    }

    /// Parameter name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(2)
    }

    /// Default value of an optional parameter
    ///
    /// # Errors
    /// Returns an error if the `Constant` table cannot be searched.
    pub fn constant(&self) -> Result<Option<Constant<'a>>> {
        Ok(self
            .database()
            .associated(Association::ConstantParent, self.token())?
            .next())
    }

    /// Marshalling information of the parameter
    ///
    /// # Errors
    /// Returns an error if the `FieldMarshal` table cannot be searched.
    pub fn marshal(&self) -> Result<Option<FieldMarshal<'a>>> {
        Ok(self
            .database()
            .associated(Association::FieldMarshalParent, self.token())?
            .next())
    }

    /// The method declaring this parameter
    ///
    /// # Errors
    /// Returns an error if the `MethodDef` parameter lists cannot be read.
    pub fn method(&self) -> Result<Option<MethodDef<'a>>> {
        list_owner(self.database(), 5, self.rid())
    }
}

table_row! {
    /// A reference to a method or field of another type
    MemberRef => MemberRef
}

impl<'a> MemberRef<'a> {
    /// The type or module declaring the member, `MemberRefParent`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn class(&self) -> Result<CodedIndex> {
        self.coded_index(0, CodedIndexType::MemberRefParent)
    }

    /// Member name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// The undecoded signature blob
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn signature_blob(&self) -> Result<&'a [u8]> {
        self.blob(2)
    }

    /// The signature decoded as a `MethodRefSig`
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or is not a method signature.
    pub fn method_signature(&self) -> Result<SignatureMethod> {
        parse_method_signature(self.signature_blob()?)
    }
}

table_row! {
    /// An explicit interface method implementation
    MethodImpl => MethodImpl
}

impl<'a> MethodImpl<'a> {
    /// The implementing type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn class(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(0)?)
    }

    /// The implementing method, `MethodDefOrRef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn body(&self) -> Result<CodedIndex> {
        self.coded_index(1, CodedIndexType::MethodDefOrRef)
    }

    /// The implemented interface method, `MethodDefOrRef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn declaration(&self) -> Result<CodedIndex> {
        self.coded_index(2, CodedIndexType::MethodDefOrRef)
    }
}

impl<'a> TypeDef<'a> {
    /// Explicit method implementations of the type
    ///
    /// # Errors
    /// Returns an error if the `MethodImpl` table cannot be searched.
    pub fn method_impls(&self) -> Result<RowRange<'a, MethodImpl<'a>>> {
        self.database()
            .associated(Association::MethodImplClass, self.token())
    }
}
