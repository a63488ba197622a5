//! `TypeDef` (0x02) and the tables hanging off it: `InterfaceImpl` (0x09), `ClassLayout` (0x0F)
//! and `NestedClass` (0x29).
//!
//! A type owns the contiguous runs of `Field` and `MethodDef` rows starting at its list columns
//! and ending where the next type's lists start. Properties and events are reached through the
//! `PropertyMap` and `EventMap` tables.

use std::sync::Arc;

use crate::{
    metadata::{
        architecture::{display_name, supported_architectures, Architecture},
        association::Association,
        signatures::TypeSignature,
        tables::{
            table_row, CodedIndex, CodedIndexType, Event, EventMap, Field, GenericParam,
            MethodDef, Property, PropertyMap, RowRange, TableId, TableRow,
        },
    },
    Result,
};

#[allow(non_snake_case)]
/// `TypeDef.Flags` constants (ECMA-335 II.23.1.15)
pub mod TypeAttributes {
    /// Visibility mask
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Not visible outside the assembly
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Visible outside the assembly
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested, public
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested, private
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested, family
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested, assembly
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested, family and assembly
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested, family or assembly
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Layout mask
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Fields laid out by the runtime
    pub const AUTO_LAYOUT: u32 = 0x0000_0000;
    /// Fields laid out in declaration order
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    /// Fields laid out at explicit offsets, used for unions
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;
    /// Class semantics mask
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// A class or value type
    pub const CLASS: u32 = 0x0000_0000;
    /// An interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Cannot be instantiated
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Cannot be derived from
    pub const SEALED: u32 = 0x0000_0100;
    /// Name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Imported from a type library
    pub const IMPORT: u32 = 0x0000_1000;
    /// A Windows Runtime type
    pub const WINDOWS_RUNTIME: u32 = 0x0000_4000;
    /// String formatting mask
    pub const STRING_FORMAT_MASK: u32 = 0x0003_0000;
    /// Strings are ANSI
    pub const ANSI_CLASS: u32 = 0x0000_0000;
    /// Strings are UTF-16
    pub const UNICODE_CLASS: u32 = 0x0001_0000;
    /// Strings follow the platform
    pub const AUTO_CLASS: u32 = 0x0002_0000;
    /// Static constructor runs before first static field access only
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
    /// Name is special to the runtime
    pub const RT_SPECIAL_NAME: u32 = 0x0000_0800;
}

table_row! {
    /// A type definition
    TypeDef => TypeDef
}

impl<'a> TypeDef<'a> {
    /// `TypeAttributes` of the type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u32> {
        self.value(0)
    }

    /// Base type name, without architecture suffix
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// Namespace, empty for nested types and `<Module>`
    ///
    /// # Errors
    /// Returns an error if the row or the namespace cannot be read.
    pub fn namespace(&self) -> Result<&'a str> {
        self.string(2)
    }

    /// The base type, `TypeDefOrRef`; null for interfaces and `<Module>`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn extends(&self) -> Result<CodedIndex> {
        self.coded_index(3, CodedIndexType::TypeDefOrRef)
    }

    /// Fields of the type
    ///
    /// # Errors
    /// Returns an error if the field list is malformed.
    pub fn fields(&self) -> Result<RowRange<'a, Field<'a>>> {
        self.list(4)
    }

    /// Methods of the type
    ///
    /// # Errors
    /// Returns an error if the method list is malformed.
    pub fn methods(&self) -> Result<RowRange<'a, MethodDef<'a>>> {
        self.list(5)
    }

    /// Properties of the type, empty if it has no `PropertyMap` row
    ///
    /// # Errors
    /// Returns an error if the map or the property list is malformed.
    pub fn properties(&self) -> Result<RowRange<'a, Property<'a>>> {
        let db = self.database();
        match db
            .associated::<PropertyMap>(Association::PropertyMapParent, self.token())?
            .next()
        {
            Some(map) => map.properties(),
            None => Ok(RowRange::new(db, 0..0)),
        }
    }

    /// Events of the type, empty if it has no `EventMap` row
    ///
    /// # Errors
    /// Returns an error if the map or the event list is malformed.
    pub fn events(&self) -> Result<RowRange<'a, Event<'a>>> {
        let db = self.database();
        match db
            .associated::<EventMap>(Association::EventMapParent, self.token())?
            .next()
        {
            Some(map) => map.events(),
            None => Ok(RowRange::new(db, 0..0)),
        }
    }

    /// Interfaces the type implements
    ///
    /// # Errors
    /// Returns an error if the `InterfaceImpl` table cannot be searched.
    pub fn interface_impls(&self) -> Result<RowRange<'a, InterfaceImpl<'a>>> {
        self.database()
            .associated(Association::InterfaceImplClass, self.token())
    }

    /// Generic parameters of the type, in number order
    ///
    /// # Errors
    /// Returns an error if the `GenericParam` table cannot be searched.
    pub fn generic_params(&self) -> Result<RowRange<'a, GenericParam<'a>>> {
        self.database()
            .associated(Association::GenericParamOwner, self.token())
    }

    /// Explicit packing and size of the type
    ///
    /// # Errors
    /// Returns an error if the `ClassLayout` table cannot be searched.
    pub fn class_layout(&self) -> Result<Option<ClassLayout<'a>>> {
        Ok(self
            .database()
            .associated(Association::ClassLayoutParent, self.token())?
            .next())
    }

    /// The type this type is nested in
    ///
    /// # Errors
    /// Returns an error if the `NestedClass` table cannot be searched or is malformed.
    pub fn enclosing_type(&self) -> Result<Option<TypeDef<'a>>> {
        match self
            .database()
            .associated::<NestedClass>(Association::NestedClassNested, self.token())?
            .next()
        {
            Some(nested) => nested.enclosing_type().map(Some),
            None => Ok(None),
        }
    }

    /// Returns true if this type is nested in another type
    ///
    /// # Errors
    /// See [`TypeDef::enclosing_type`].
    pub fn is_nested(&self) -> Result<bool> {
        Ok(self.enclosing_type()?.is_some())
    }

    /// Types nested directly in this type, in `NestedClass` order
    pub fn nested_types(&self) -> impl Iterator<Item = TypeDef<'a>> + 'a {
        let db = self.database();
        db.types()
            .nested_types(self.rid())
            .into_iter()
            .map(move |rid| TypeDef::from_row(db, rid))
    }

    /// Returns true if the type derives from `System.Enum`
    ///
    /// # Errors
    /// Returns an error if the base type cannot be read.
    pub fn is_enum(&self) -> Result<bool> {
        let extends = self.extends()?;
        if extends.is_null() || extends.tag == TableId::TypeSpec {
            return Ok(false);
        }

        Ok(self.database().type_name(extends)? == ("System", "Enum"))
    }

    /// The underlying integral type of an enum: the type of its first instance field.
    ///
    /// Returns `None` for types that are not enums.
    ///
    /// # Errors
    /// Returns an error if the fields or their signatures cannot be read.
    pub fn enum_underlying_type(&self) -> Result<Option<TypeSignature>> {
        if !self.is_enum()? {
            return Ok(None);
        }

        for field in self.fields()? {
            if !field.is_static()? {
                return Ok(Some(field.signature()?.base));
            }
        }

        Err(malformed_error!(
            "Enum {} has no instance field",
            self.token()
        ))
    }

    /// Architectures this definition is declared for; empty if undeclared
    ///
    /// # Errors
    /// Returns an error if the `SupportedArchitectureAttribute` cannot be decoded.
    pub fn supported_architectures(&self) -> Result<Architecture> {
        supported_architectures(self)
    }

    /// Name with the architecture suffix, e.g. `CONTEXT@X64|Arm64`
    ///
    /// # Errors
    /// Returns an error if the name or the architecture attribute cannot be read.
    pub fn display_name(&self) -> Result<Arc<str>> {
        self.database().display_name_with(self.token(), || {
            Ok(display_name(self.name()?, self.supported_architectures()?))
        })
    }
}

table_row! {
    /// An interface implemented by a type
    InterfaceImpl => InterfaceImpl
}

impl<'a> InterfaceImpl<'a> {
    /// The implementing type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn class(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(0)?)
    }

    /// The implemented interface, `TypeDefOrRef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn interface(&self) -> Result<CodedIndex> {
        self.coded_index(1, CodedIndexType::TypeDefOrRef)
    }
}

table_row! {
    /// Explicit layout of a type
    ClassLayout => ClassLayout
}

impl<'a> ClassLayout<'a> {
    /// Field alignment in bytes, 0 for the default
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn packing_size(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// Total size in bytes, 0 if not given
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn class_size(&self) -> Result<u32> {
        self.value(1)
    }

    /// The type the layout applies to
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn parent(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(2)?)
    }
}

table_row! {
    /// Links a nested type to its enclosing type
    NestedClass => NestedClass
}

impl<'a> NestedClass<'a> {
    /// The nested type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn nested_type(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(0)?)
    }

    /// The enclosing type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn enclosing_type(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(1)?)
    }
}
