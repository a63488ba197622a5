//! # winmdscope Prelude
//!
//! The most commonly used types and traits of the library, for glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all winmdscope operations
pub use crate::Error;

/// The result type used throughout winmdscope
pub use crate::Result;

/// Reader options
pub use crate::ReaderConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// A loaded metadata image
pub use crate::Database;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Metadata System - Core Types
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Metadata root constants
pub use crate::metadata::root::CIL_HEADER_MAGIC;

/// Architecture sets and their rendering
pub use crate::metadata::architecture::{display_name, Architecture};

/// Sorted relations between tables
pub use crate::metadata::association::Association;

// ================================================================================================
// Tables
// ================================================================================================

/// Table identifiers and coded indexes
pub use crate::metadata::tables::{CodedIndex, CodedIndexType, RowRange, TableId, TableRow};

/// Typed row handles
pub use crate::metadata::tables::{
    Assembly, AssemblyRef, Constant, ConstantValue, CustomAttribute, Event, Field, GenericParam,
    ImplMap, MemberRef, MethodDef, Module, ModuleRef, NestedClass, Param, Property, TypeDef,
    TypeRef, TypeSpec,
};

// ================================================================================================
// Signatures and Custom Attributes
// ================================================================================================

/// Decoded signatures
pub use crate::metadata::signatures::{
    SignatureField, SignatureMethod, SignatureParameter, SignatureProperty, SignatureTypeSpec,
    TypeSignature,
};

/// Custom attribute access and values
pub use crate::metadata::customattributes::{
    CustomAttributeArgument, CustomAttributeValue, HasCustomAttributes,
};
