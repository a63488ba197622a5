//! Metadata tables (ECMA-335 II.22).
//!
//! [`types`] holds the raw layer: table identifiers, coded indexes, the column schema and
//! byte-level row access. The other modules declare typed, `Copy` row handles over that layer,
//! one per table the reader interprets. Each handle borrows its [`crate::Database`] and decodes
//! columns only when asked.
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmdscope::{metadata::tables::MethodDef, Database};
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! for method in db.rows::<MethodDef>() {
//!     if let Some(import) = method.impl_map()? {
//!         println!("{} -> {}", method.name()?, import.import_scope()?.name()?);
//!     }
//! }
//! # Ok::<(), winmdscope::Error>(())
//! ```

mod assembly;
mod constant;
mod customattribute;
mod field;
mod genericparam;
mod methoddef;
mod module;
mod property;
mod typedef;
mod typeref;
mod typespec;
pub mod types;

pub use assembly::{AssemblyFlags, Assembly, AssemblyRef, AssemblyVersion, DeclSecurity};
pub use constant::{Constant, ConstantValue};
pub use customattribute::CustomAttribute;
pub use field::{Field, FieldAttributes, FieldMarshal};
pub use genericparam::{GenericParam, GenericParamAttributes, GenericParamConstraint};
pub use methoddef::{MemberRef, MethodAttributes, MethodDef, MethodImpl, Param, ParamAttributes};
pub use module::{ImplMap, Module, ModuleRef, PInvokeAttributes};
pub use property::{
    Event, EventMap, MethodSemantics, MethodSemanticsAttributes, Property, PropertyAttributes,
    PropertyMap,
};
pub use typedef::{ClassLayout, InterfaceImpl, NestedClass, TypeAttributes, TypeDef};
pub use typeref::TypeRef;
pub use typespec::TypeSpec;
pub use types::*;
pub(crate) use types::{list_owner, table_row};
