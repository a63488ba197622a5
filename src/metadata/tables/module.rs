//! `Module` (0x00), `ModuleRef` (0x1A) and `ImplMap` (0x1C).
//!
//! Win32 metadata declares every exported function as a static method of an `Apis` class; the
//! DLL it lives in is an `ImplMap` row pointing at a `ModuleRef`.

use crate::{
    metadata::{
        association::Association,
        tables::{table_row, CodedIndex, CodedIndexType, MethodDef, TableRow},
    },
    Result,
};

table_row! {
    /// The single row describing the current module
    Module => Module
}

impl<'a> Module<'a> {
    /// Module file name, e.g. `Windows.Win32.winmd`
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(1)
    }

    /// Module version identifier
    ///
    /// # Errors
    /// Returns an error if the row or the GUID cannot be read.
    pub fn mvid(&self) -> Result<uguid::Guid> {
        self.guid(2)
    }
}

table_row! {
    /// A reference to another module, the target DLL of platform invokes
    ModuleRef => ModuleRef
}

impl<'a> ModuleRef<'a> {
    /// Module name, e.g. `KERNEL32.dll`
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(0)
    }
}

#[allow(non_snake_case)]
/// `ImplMap.MappingFlags` constants (ECMA-335 II.23.1.8)
pub mod PInvokeAttributes {
    /// Use the member name as specified
    pub const NO_MANGLE: u16 = 0x0001;
    /// Character set mask
    pub const CHAR_SET_MASK: u16 = 0x0006;
    /// No character set given
    pub const CHAR_SET_NOT_SPEC: u16 = 0x0000;
    /// Marshal strings as ANSI
    pub const CHAR_SET_ANSI: u16 = 0x0002;
    /// Marshal strings as UTF-16
    pub const CHAR_SET_UNICODE: u16 = 0x0004;
    /// Pick the character set of the platform
    pub const CHAR_SET_AUTO: u16 = 0x0006;
    /// The callee may set the last Win32 error
    pub const SUPPORTS_LAST_ERROR: u16 = 0x0040;
    /// Calling convention mask
    pub const CALL_CONV_MASK: u16 = 0x0700;
    /// Platform default calling convention
    pub const CALL_CONV_PLATFORMAPI: u16 = 0x0100;
    /// `__cdecl`
    pub const CALL_CONV_CDECL: u16 = 0x0200;
    /// `__stdcall`
    pub const CALL_CONV_STDCALL: u16 = 0x0300;
    /// `__thiscall`
    pub const CALL_CONV_THISCALL: u16 = 0x0400;
    /// `__fastcall`
    pub const CALL_CONV_FASTCALL: u16 = 0x0500;
}

table_row! {
    /// Platform invoke information of a method or field
    ImplMap => ImplMap
}

impl<'a> ImplMap<'a> {
    /// `PInvokeAttributes` of the import
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// The imported member, `MemberForwarded`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn member_forwarded(&self) -> Result<CodedIndex> {
        self.coded_index(1, CodedIndexType::MemberForwarded)
    }

    /// Entry point name in the target module
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn import_name(&self) -> Result<&'a str> {
        self.string(2)
    }

    /// The module the member is imported from
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or references a missing `ModuleRef`.
    pub fn import_scope(&self) -> Result<ModuleRef<'a>> {
        self.database().row(self.value(3)?)
    }
}

impl<'a> MethodDef<'a> {
    /// Platform invoke information of this method, if it is an import
    ///
    /// # Errors
    /// Returns an error if the `ImplMap` table cannot be searched.
    pub fn impl_map(&self) -> Result<Option<ImplMap<'a>>> {
        Ok(self
            .database()
            .associated(Association::ImplMapMemberForwarded, self.token())?
            .next())
    }
}
