//! Signature blob decoding (ECMA-335 II.23.2).
//!
//! Signatures describe the types of fields, method parameters and return values, properties and
//! `TypeSpec` rows in a compact prefix encoding. Type references inside a signature are kept as
//! `TypeDefOrRef` coded indexes so that callers decide when, and for which architecture, to
//! resolve them.
//!
//! # Examples
//!
//! ```rust
//! use winmdscope::metadata::signatures::{parse_field_signature, TypeSignature};
//!
//! // FIELD uint8*
//! let field = parse_field_signature(&[0x06, 0x0F, 0x05])?;
//! let TypeSignature::Ptr(pointer) = field.base else { unreachable!() };
//! assert_eq!(*pointer.base, TypeSignature::U1);
//! # Ok::<(), winmdscope::Error>(())
//! ```

mod parser;
mod types;

pub use parser::*;
pub use types::*;

use crate::{metadata::database::Database, Result};

/// Namespace of the `IsConst` modifier
pub const IS_CONST_NAMESPACE: &str = "System.Runtime.CompilerServices";
/// Name of the `IsConst` modifier
pub const IS_CONST_NAME: &str = "IsConst";

/// Parse a `MethodDefSig` or `MethodRefSig`
///
/// # Errors
/// Returns an error if the signature data is malformed.
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    SignatureParser::new(data).parse_method_signature()
}

/// Parse a `FieldSig`
///
/// # Errors
/// Returns an error if the signature data is malformed.
pub fn parse_field_signature(data: &[u8]) -> Result<SignatureField> {
    SignatureParser::new(data).parse_field_signature()
}

/// Parse a `PropertySig`
///
/// # Errors
/// Returns an error if the signature data is malformed.
pub fn parse_property_signature(data: &[u8]) -> Result<SignatureProperty> {
    SignatureParser::new(data).parse_property_signature()
}

/// Parse a `TypeSpec` blob
///
/// # Errors
/// Returns an error if the signature data is malformed.
pub fn parse_type_spec_signature(data: &[u8]) -> Result<SignatureTypeSpec> {
    SignatureParser::new(data).parse_type_spec_signature()
}

/// Returns true if `param` carries a `System.Runtime.CompilerServices.IsConst` modifier.
///
/// Modifiers pointing at a `TypeSpec` never match.
///
/// # Errors
/// Returns an error if a modifier's type row cannot be read.
pub fn is_const(param: &SignatureParameter, db: &Database) -> Result<bool> {
    for modifier in &param.modifiers {
        if !modifier.is_def_or_ref() {
            continue;
        }

        let (namespace, name) = db.type_name(modifier.modifier_type)?;
        if namespace == IS_CONST_NAMESPACE && name == IS_CONST_NAME {
            return Ok(true);
        }
    }

    Ok(false)
}
