//! Resolution of type references to type definitions.
//!
//! A top-level `TypeRef` is looked up by namespace and name in the module-wide
//! [`TypeCache`](crate::metadata::typecache::TypeCache). A nested `TypeRef` is resolved by first
//! resolving its enclosing reference, then searching the enclosing definition's nested types.
//!
//! Win32 metadata may define an enclosing type once per architecture subset, each variant with
//! its own nested types. [`TypeRef::resolve`] therefore picks the first variant whose declared
//! architectures intersect the requested set, falling back to the group head when none does.
//! Nested types are matched on their display names, which carry the architecture suffix, so
//! `_Anonymous_e__Union@X64` never matches `_Anonymous_e__Union@X86`.
//!
//! [`TypeRef::resolve_required`] performs no architecture selection and reports a missing type
//! as [`crate::Error::TypeNotFound`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmdscope::{
//!     metadata::tables::{TableRow, TypeRef},
//!     Architecture, Database,
//! };
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! for type_ref in db.rows::<TypeRef>() {
//!     if let Some(definition) = type_ref.resolve(Architecture::X64)? {
//!         println!("{} -> {}", type_ref.display_name()?, definition.token());
//!     }
//! }
//! # Ok::<(), winmdscope::Error>(())
//! ```

use crate::{
    metadata::{
        architecture::Architecture,
        database::Database,
        tables::{CodedIndex, TableId, TableRow, TypeDef, TypeRef},
    },
    Error, Result,
};

impl Database {
    /// Namespace and base name of the `TypeDef` or `TypeRef` that `index` references
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` references neither table or a missing row.
    pub fn type_name(&self, index: CodedIndex) -> Result<(&str, &str)> {
        match index.tag {
            TableId::TypeDef => {
                let definition = self.row::<TypeDef>(index.row)?;
                Ok((definition.namespace()?, definition.name()?))
            }
            TableId::TypeRef => {
                let reference = self.row::<TypeRef>(index.row)?;
                Ok((reference.namespace()?, reference.name()?))
            }
            _ => Err(malformed_error!(
                "Expected a TypeDef or TypeRef, found {}",
                index.token
            )),
        }
    }

    /// Resolve a `TypeDefOrRef` index for `arch`. Definitions are returned as they are.
    ///
    /// # Errors
    /// Returns an error if a row cannot be read, see [`TypeRef::resolve`].
    ///
    /// # Panics
    /// Panics if `index` references a table other than `TypeDef` or `TypeRef`.
    pub fn resolve_type(&self, index: CodedIndex, arch: Architecture) -> Result<Option<TypeDef<'_>>> {
        match index.tag {
            TableId::TypeDef => self.row(index.row).map(Some),
            TableId::TypeRef => self.row::<TypeRef>(index.row)?.resolve(arch),
            other => panic!("{} cannot be resolved to a TypeDef, it references {:?}", index.token, other),
        }
    }

    /// Resolve a `TypeDefOrRef` index without architecture selection
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the referenced type does not exist, or an error
    /// if a row cannot be read.
    ///
    /// # Panics
    /// Panics if `index` references a table other than `TypeDef` or `TypeRef`.
    pub fn resolve_type_required(&self, index: CodedIndex) -> Result<TypeDef<'_>> {
        match index.tag {
            TableId::TypeDef => self.row(index.row),
            TableId::TypeRef => self.row::<TypeRef>(index.row)?.resolve_required(),
            other => panic!("{} cannot be resolved to a TypeDef, it references {:?}", index.token, other),
        }
    }

    /// Resolve a `TypeDefOrRef` index on namespaces and base names alone.
    ///
    /// No variant is selected and no custom attribute is decoded, so this is safe to call while
    /// an attribute value is being decoded. Nested types match on their base name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` references neither table,
    /// [`crate::Error::RecursionLimit`] for a scope chain that is too deep, or an error if a row
    /// cannot be read.
    pub fn resolve_type_by_name(&self, index: CodedIndex) -> Result<Option<TypeDef<'_>>> {
        match index.tag {
            TableId::TypeDef => self.row(index.row).map(Some),
            TableId::TypeRef => self.row::<TypeRef>(index.row)?.resolve_by_name_at(0),
            _ => Err(malformed_error!(
                "Expected a TypeDef or TypeRef, found {}",
                index.token
            )),
        }
    }
}

impl<'a> TypeRef<'a> {
    /// Resolve this reference to its definition, selecting enclosing variants for `arch`.
    ///
    /// [`Architecture::NONE`] is treated as [`Architecture::ALL`]. Top-level references resolve
    /// to the head of their type group regardless of `arch`. Returns `None` if the type, or one
    /// of its enclosing types, is not defined in this module.
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] if the scope chain is deeper than
    /// [`crate::ReaderConfig::max_resolution_depth`], or an error if a row or an architecture
    /// attribute cannot be read.
    pub fn resolve(&self, arch: Architecture) -> Result<Option<TypeDef<'a>>> {
        self.resolve_at(arch.normalise(), 0)
    }

    /// Resolve this reference without architecture selection.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] naming the missing type, [`crate::Error::RecursionLimit`]
    /// for a scope chain that is too deep, or an error if a row cannot be read.
    pub fn resolve_required(&self) -> Result<TypeDef<'a>> {
        self.resolve_required_at(0)
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let limit = self.database().config().max_resolution_depth;
        if depth >= limit {
            log::debug!("resolution of {} exceeded depth {}", self.token(), limit);
            return Err(Error::RecursionLimit(limit));
        }

        Ok(())
    }

    fn resolve_at(&self, arch: Architecture, depth: usize) -> Result<Option<TypeDef<'a>>> {
        self.check_depth(depth)?;
        let db = self.database();

        let Some(enclosing_ref) = self.enclosing_type()? else {
            let found = db.find(self.namespace()?, self.name()?);
            log::trace!("top-level {} resolved to {:?}", self.token(), found);
            return Ok(found);
        };

        let Some(enclosing) = enclosing_ref.resolve_at(arch, depth + 1)? else {
            log::trace!("enclosing type of {} is not defined here", self.token());
            return Ok(None);
        };

        let effective = db.select_variant(enclosing, arch)?;
        self.find_nested(effective)
    }

    fn resolve_required_at(&self, depth: usize) -> Result<TypeDef<'a>> {
        self.check_depth(depth)?;
        let db = self.database();

        let Some(enclosing_ref) = self.enclosing_type()? else {
            return db.find_required(self.namespace()?, self.name()?);
        };

        let enclosing = enclosing_ref.resolve_required_at(depth + 1)?;
        match self.find_nested(enclosing)? {
            Some(nested) => Ok(nested),
            None => Err(Error::TypeNotFound(format!(
                "Type '{}.{}' could not be found",
                enclosing.display_name()?,
                self.display_name()?
            ))),
        }
    }

    fn resolve_by_name_at(&self, depth: usize) -> Result<Option<TypeDef<'a>>> {
        self.check_depth(depth)?;

        let Some(enclosing_ref) = self.enclosing_type()? else {
            return Ok(self.database().find(self.namespace()?, self.name()?));
        };
        let Some(enclosing) = enclosing_ref.resolve_by_name_at(depth + 1)? else {
            return Ok(None);
        };

        let name = self.name()?;
        for nested in enclosing.nested_types() {
            if nested.name()? == name {
                return Ok(Some(nested));
            }
        }

        Ok(None)
    }

    /// The nested type of `enclosing` whose display name equals this reference's
    fn find_nested(&self, enclosing: TypeDef<'a>) -> Result<Option<TypeDef<'a>>> {
        let wanted = self.display_name()?;
        for nested in enclosing.nested_types() {
            if nested.display_name()? == wanted {
                log::trace!(
                    "{} resolved to {} inside {}",
                    wanted,
                    nested.token(),
                    enclosing.token()
                );
                return Ok(Some(nested));
            }
        }

        log::trace!("{} not found inside {}", wanted, enclosing.token());
        Ok(None)
    }
}
