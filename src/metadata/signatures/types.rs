//! Decoded signature blobs (ECMA-335 II.23.2).
//!
//! Type references inside signatures stay as undecoded-to-row `TypeDefOrRef` coded indexes; use
//! [`crate::Database::resolve_type`] to turn them into definitions.

use crate::metadata::tables::{CodedIndex, TableId};

/// `ELEMENT_TYPE_*` constants (ECMA-335 II.23.1.16)
#[allow(non_snake_case, missing_docs)]
pub mod ELEMENT_TYPE {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    pub const PTR: u8 = 0x0f;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1b;
    pub const OBJECT: u8 = 0x1c;
    pub const SZARRAY: u8 = 0x1d;
    pub const MVAR: u8 = 0x1e;
    pub const CMOD_REQD: u8 = 0x1f;
    pub const CMOD_OPT: u8 = 0x20;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

/// Calling convention bits of a method or property signature head
#[allow(non_snake_case, missing_docs)]
pub mod CALLING_CONVENTION {
    pub const DEFAULT: u8 = 0x00;
    pub const C: u8 = 0x01;
    pub const STDCALL: u8 = 0x02;
    pub const THISCALL: u8 = 0x03;
    pub const FASTCALL: u8 = 0x04;
    pub const VARARG: u8 = 0x05;
    pub const FIELD: u8 = 0x06;
    pub const PROPERTY: u8 = 0x08;
    pub const GENERIC: u8 = 0x10;
    pub const HAS_THIS: u8 = 0x20;
    pub const EXPLICIT_THIS: u8 = 0x40;
    /// Mask of the calling convention kind in the low nibble
    pub const KIND_MASK: u8 = 0x0f;
}

/// A type as it appears in a signature.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSignature {
    /// `void`, only valid as a return type or pointer target
    Void,
    /// `bool`
    Boolean,
    /// UTF-16 code unit
    Char,
    /// `i8`
    I1,
    /// `u8`
    U1,
    /// `i16`
    I2,
    /// `u16`
    U2,
    /// `i32`
    I4,
    /// `u32`
    U4,
    /// `i64`
    I8,
    /// `u64`
    U8,
    /// `f32`
    R4,
    /// `f64`
    R8,
    /// `System.String`
    String,
    /// `System.Object`
    Object,
    /// Native-sized signed integer
    I,
    /// Native-sized unsigned integer
    U,
    /// `System.TypedReference`
    TypedByRef,
    /// Unmanaged pointer
    Ptr(SignaturePointer),
    /// Managed reference
    ByRef(Box<TypeSignature>),
    /// A value type, `TypeDefOrRef`
    ValueType(CodedIndex),
    /// A reference type, `TypeDefOrRef`
    Class(CodedIndex),
    /// Generic parameter of the enclosing type, by number
    GenericParamType(u32),
    /// Generic parameter of the enclosing method, by number
    GenericParamMethod(u32),
    /// General array
    Array(SignatureArray),
    /// Single-dimension, zero-based array
    SzArray(SignatureSzArray),
    /// Instantiated generic type
    GenericInst(GenericInstance),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// Pinned local
    Pinned(Box<TypeSignature>),
}

impl TypeSignature {
    /// The `TypeDefOrRef` this signature names directly, for `ValueType` and `Class`
    #[must_use]
    pub fn type_reference(&self) -> Option<CodedIndex> {
        match self {
            TypeSignature::ValueType(index) | TypeSignature::Class(index) => Some(*index),
            _ => None,
        }
    }
}

/// A custom modifier (`modreq` / `modopt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomModifier {
    /// `modreq` if true, `modopt` otherwise
    pub is_required: bool,
    /// The modifier type, `TypeDefOrRef`
    pub modifier_type: CodedIndex,
}

impl CustomModifier {
    /// Returns true if the modifier type lives in `TypeDef` or `TypeRef`
    #[must_use]
    pub fn is_def_or_ref(&self) -> bool {
        matches!(self.modifier_type.tag, TableId::TypeDef | TableId::TypeRef)
    }
}

/// Dimensions of a general array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArrayDimensions {
    /// Size, if declared
    pub size: Option<u32>,
    /// Lower bound, if declared
    pub lower_bound: Option<i32>,
}

/// A general array type.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureArray {
    /// Element type
    pub base: Box<TypeSignature>,
    /// Number of dimensions
    pub rank: u32,
    /// Declared sizes and lower bounds, at most `rank` entries
    pub dimensions: Vec<ArrayDimensions>,
}

/// A single-dimension array type.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSzArray {
    /// Custom modifiers of the element type
    pub modifiers: Vec<CustomModifier>,
    /// Element type
    pub base: Box<TypeSignature>,
}

/// An unmanaged pointer type.
#[derive(Debug, Clone, PartialEq)]
pub struct SignaturePointer {
    /// Custom modifiers of the pointee
    pub modifiers: Vec<CustomModifier>,
    /// Pointee type
    pub base: Box<TypeSignature>,
}

/// An instantiated generic type.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericInstance {
    /// True for `VALUETYPE`, false for `CLASS`
    pub is_value_type: bool,
    /// The generic type definition, `TypeDefOrRef`
    pub generic_type: CodedIndex,
    /// Type arguments in declaration order
    pub args: Vec<TypeSignature>,
}

/// A parameter or return type (`Param` / `RetType`).
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParameter {
    /// Custom modifiers in signature order
    pub modifiers: Vec<CustomModifier>,
    /// Passed by reference
    pub by_ref: bool,
    /// The parameter type
    pub base: TypeSignature,
}

/// A method signature (`MethodDefSig`, `MethodRefSig`, `StandAloneMethodSig`).
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SignatureMethod {
    /// Instance method
    pub has_this: bool,
    /// `this` is passed explicitly as the first parameter
    pub explicit_this: bool,
    /// Calling convention kind, see [`CALLING_CONVENTION`]
    pub calling_convention: u8,
    /// Number of generic parameters, 0 for non-generic methods
    pub generic_param_count: u32,
    /// Return type
    pub return_type: SignatureParameter,
    /// Fixed parameters
    pub params: Vec<SignatureParameter>,
    /// Parameters after the vararg sentinel
    pub varargs: Vec<SignatureParameter>,
}

impl SignatureMethod {
    /// Returns true for the vararg calling convention
    #[must_use]
    pub fn is_vararg(&self) -> bool {
        self.calling_convention == CALLING_CONVENTION::VARARG
    }
}

/// A field signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureField {
    /// Custom modifiers of the field type
    pub modifiers: Vec<CustomModifier>,
    /// The field type
    pub base: TypeSignature,
}

/// A property signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureProperty {
    /// Instance property
    pub has_this: bool,
    /// Custom modifiers of the property type
    pub modifiers: Vec<CustomModifier>,
    /// The property type
    pub base: TypeSignature,
    /// Indexer parameters
    pub params: Vec<SignatureParameter>,
}

/// A `TypeSpec` signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureTypeSpec {
    /// The specified type
    pub base: TypeSignature,
}
