//! Custom attributes and their values.
//!
//! Every row of a `HasCustomAttribute` table can carry attributes. The `CustomAttribute` table is
//! sorted by parent, so the attributes of one row are a contiguous run found with two binary
//! searches (see [`crate::metadata::association`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmdscope::{metadata::customattributes::HasCustomAttributes, Database};
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! let handle = db.find_required("Windows.Win32.Foundation", "HANDLE")?;
//! for attribute in handle.custom_attributes()? {
//!     let (namespace, name) = attribute.type_namespace_and_name()?;
//!     println!("[{namespace}.{name}] {:?}", attribute.value()?);
//! }
//! # Ok::<(), winmdscope::Error>(())
//! ```

mod parser;
mod types;

pub use parser::{
    parse_custom_attribute_blob, parse_custom_attribute_data, CustomAttributeParser,
    MAX_NESTING_DEPTH,
};
pub use types::*;

use crate::{
    metadata::{
        association::Association,
        tables::{CustomAttribute, RowRange, TableRow},
    },
    Result,
};

/// Rows that can be the parent of a custom attribute.
pub trait HasCustomAttributes<'a>: TableRow<'a> {
    /// The attributes attached to this row, in table order
    ///
    /// # Errors
    /// Returns an error if the `CustomAttribute` table cannot be searched.
    fn custom_attributes(&self) -> Result<RowRange<'a, CustomAttribute<'a>>> {
        self.database()
            .associated(Association::CustomAttributeParent, self.token())
    }

    /// The first attribute whose type is `namespace.name`
    ///
    /// # Errors
    /// Returns an error if an attribute or its constructor cannot be read.
    fn get_attribute(&self, namespace: &str, name: &str) -> Result<Option<CustomAttribute<'a>>> {
        for attribute in self.custom_attributes()? {
            if attribute.type_namespace_and_name()? == (namespace, name) {
                return Ok(Some(attribute));
            }
        }

        Ok(None)
    }

    /// Returns true if an attribute of type `namespace.name` is attached
    ///
    /// # Errors
    /// See [`HasCustomAttributes::get_attribute`].
    fn has_attribute(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self.get_attribute(namespace, name)?.is_some())
    }
}

macro_rules! has_custom_attributes {
    ($($row:ident),* $(,)?) => {
        $(impl<'a> HasCustomAttributes<'a> for crate::metadata::tables::$row<'a> {})*
    };
}

has_custom_attributes!(
    MethodDef,
    Field,
    TypeRef,
    TypeDef,
    Param,
    InterfaceImpl,
    MemberRef,
    Module,
    DeclSecurity,
    Property,
    Event,
    ModuleRef,
    TypeSpec,
    Assembly,
    AssemblyRef,
    GenericParam,
    GenericParamConstraint,
);
