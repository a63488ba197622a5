//! `PropertyMap` (0x15), `Property` (0x17), `EventMap` (0x12), `Event` (0x14) and
//! `MethodSemantics` (0x18).
//!
//! Properties and events are grouped per type by the map tables and tied to their accessor
//! methods through `MethodSemantics`.

use crate::{
    metadata::{
        association::Association,
        signatures::{parse_property_signature, SignatureProperty},
        tables::{
            list_owner, table_row, CodedIndex, CodedIndexType, Constant, MethodDef, RowRange,
            TableRow, TypeDef,
        },
    },
    Result,
};

#[allow(non_snake_case)]
/// `MethodSemantics.Semantics` constants (ECMA-335 II.23.1.12)
pub mod MethodSemanticsAttributes {
    /// Property setter
    pub const SETTER: u16 = 0x0001;
    /// Property getter
    pub const GETTER: u16 = 0x0002;
    /// Any other accessor
    pub const OTHER: u16 = 0x0004;
    /// Event `add` accessor
    pub const ADD_ON: u16 = 0x0008;
    /// Event `remove` accessor
    pub const REMOVE_ON: u16 = 0x0010;
    /// Event `raise` accessor
    pub const FIRE: u16 = 0x0020;
}

#[allow(non_snake_case)]
/// `Property.Flags` constants (ECMA-335 II.23.1.14)
pub mod PropertyAttributes {
    /// Name is special
    pub const SPECIAL_NAME: u16 = 0x0200;
    /// Name is special to the runtime
    pub const RT_SPECIAL_NAME: u16 = 0x0400;
    /// Has a default value
    pub const HAS_DEFAULT: u16 = 0x1000;
}

table_row! {
    /// Links a type to its run of properties
    PropertyMap => PropertyMap
}

impl<'a> PropertyMap<'a> {
    /// The owning type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn parent(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(0)?)
    }

    /// The properties of the owning type
    ///
    /// # Errors
    /// Returns an error if the property list is malformed.
    pub fn properties(&self) -> Result<RowRange<'a, Property<'a>>> {
        self.list(1)
    }
}

table_row! {
    /// A property of a type
    Property => Property
}

impl<'a> Property<'a> {
    /// `PropertyAttributes` of the property
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// Property name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// Decoded `PropertySig`
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or is not a property signature.
    pub fn signature(&self) -> Result<SignatureProperty> {
        parse_property_signature(self.blob(2)?)
    }

    /// The type declaring this property
    ///
    /// # Errors
    /// Returns an error if the `PropertyMap` lists cannot be read.
    pub fn parent(&self) -> Result<Option<TypeDef<'a>>> {
        match list_owner::<PropertyMap>(self.database(), 1, self.rid())? {
            Some(map) => map.parent().map(Some),
            None => Ok(None),
        }
    }

    /// Accessor methods of the property
    ///
    /// # Errors
    /// Returns an error if the `MethodSemantics` table cannot be searched.
    pub fn semantics(&self) -> Result<RowRange<'a, MethodSemantics<'a>>> {
        self.database()
            .associated(Association::MethodSemanticsAssociation, self.token())
    }

    /// The getter, if any
    ///
    /// # Errors
    /// Returns an error if the accessors cannot be read.
    pub fn getter(&self) -> Result<Option<MethodDef<'a>>> {
        accessor(self.semantics()?, MethodSemanticsAttributes::GETTER)
    }

    /// The setter, if any
    ///
    /// # Errors
    /// Returns an error if the accessors cannot be read.
    pub fn setter(&self) -> Result<Option<MethodDef<'a>>> {
        accessor(self.semantics()?, MethodSemanticsAttributes::SETTER)
    }

    /// Default value of the property
    ///
    /// # Errors
    /// Returns an error if the `Constant` table cannot be searched.
    pub fn constant(&self) -> Result<Option<Constant<'a>>> {
        Ok(self
            .database()
            .associated(Association::ConstantParent, self.token())?
            .next())
    }
}

fn accessor<'a>(
    semantics: RowRange<'a, MethodSemantics<'a>>,
    kind: u16,
) -> Result<Option<MethodDef<'a>>> {
    for entry in semantics {
        if entry.semantics()? & kind != 0 {
            return entry.method().map(Some);
        }
    }

    Ok(None)
}

table_row! {
    /// Links a type to its run of events
    EventMap => EventMap
}

impl<'a> EventMap<'a> {
    /// The owning type
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `TypeDef`.
    pub fn parent(&self) -> Result<TypeDef<'a>> {
        self.database().row(self.value(0)?)
    }

    /// The events of the owning type
    ///
    /// # Errors
    /// Returns an error if the event list is malformed.
    pub fn events(&self) -> Result<RowRange<'a, Event<'a>>> {
        self.list(1)
    }
}

table_row! {
    /// An event of a type
    Event => Event
}

impl<'a> Event<'a> {
    /// `EventAttributes` of the event
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// Event name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// The delegate type, `TypeDefOrRef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn event_type(&self) -> Result<CodedIndex> {
        self.coded_index(2, CodedIndexType::TypeDefOrRef)
    }

    /// Accessor methods of the event
    ///
    /// # Errors
    /// Returns an error if the `MethodSemantics` table cannot be searched.
    pub fn semantics(&self) -> Result<RowRange<'a, MethodSemantics<'a>>> {
        self.database()
            .associated(Association::MethodSemanticsAssociation, self.token())
    }

    /// The `add` accessor, if any
    ///
    /// # Errors
    /// Returns an error if the accessors cannot be read.
    pub fn add_method(&self) -> Result<Option<MethodDef<'a>>> {
        accessor(self.semantics()?, MethodSemanticsAttributes::ADD_ON)
    }

    /// The `remove` accessor, if any
    ///
    /// # Errors
    /// Returns an error if the accessors cannot be read.
    pub fn remove_method(&self) -> Result<Option<MethodDef<'a>>> {
        accessor(self.semantics()?, MethodSemanticsAttributes::REMOVE_ON)
    }
}

table_row! {
    /// Ties an accessor method to a property or event
    MethodSemantics => MethodSemantics
}

impl<'a> MethodSemantics<'a> {
    /// `MethodSemanticsAttributes` of the accessor
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn semantics(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// The accessor method
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `MethodDef`.
    pub fn method(&self) -> Result<MethodDef<'a>> {
        self.database().row(self.value(1)?)
    }

    /// The property or event, `HasSemantics`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn association(&self) -> Result<CodedIndex> {
        self.coded_index(2, CodedIndexType::HasSemantics)
    }
}
