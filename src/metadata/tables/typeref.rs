//! `TypeRef` (0x01): references to types by name.
//!
//! A reference's resolution scope says where to look for the name: the current module, another
//! module or assembly, or, for nested types, the `TypeRef` of the enclosing type. Resolving a
//! reference to its definition is implemented in [`crate::metadata::resolver`].

use std::sync::Arc;

use crate::{
    metadata::{
        architecture::{display_name, supported_architectures, Architecture},
        tables::{table_row, CodedIndex, CodedIndexType, TableId, TableRow},
    },
    Result,
};

table_row! {
    /// A reference to a type by scope, namespace and name
    TypeRef => TypeRef
}

impl<'a> TypeRef<'a> {
    /// Where the name is to be looked up, `ResolutionScope`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn resolution_scope(&self) -> Result<CodedIndex> {
        self.coded_index(0, CodedIndexType::ResolutionScope)
    }

    /// Base type name
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// Namespace, empty for nested types
    ///
    /// # Errors
    /// Returns an error if the row or the namespace cannot be read.
    pub fn namespace(&self) -> Result<&'a str> {
        self.string(2)
    }

    /// The reference to the enclosing type if this reference names a nested type
    ///
    /// # Errors
    /// Returns an error if the scope cannot be read or references a missing `TypeRef`.
    pub fn enclosing_type(&self) -> Result<Option<TypeRef<'a>>> {
        let scope = self.resolution_scope()?;
        if scope.tag != TableId::TypeRef || scope.is_null() {
            return Ok(None);
        }

        self.database().row(scope.row).map(Some)
    }

    /// Architectures declared on the reference itself
    ///
    /// # Errors
    /// Returns an error if the `SupportedArchitectureAttribute` cannot be decoded.
    pub fn supported_architectures(&self) -> Result<Architecture> {
        supported_architectures(self)
    }

    /// Name with the architecture suffix, e.g. `_Anonymous_e__Union@X64|Arm64`
    ///
    /// # Errors
    /// Returns an error if the name or the architecture attribute cannot be read.
    pub fn display_name(&self) -> Result<Arc<str>> {
        self.database().display_name_with(self.token(), || {
            Ok(display_name(self.name()?, self.supported_architectures()?))
        })
    }
}
