//! `Assembly` (0x20), `AssemblyRef` (0x23) and `DeclSecurity` (0x0E).

use std::fmt;

use crate::{
    metadata::tables::{table_row, CodedIndex, CodedIndexType, TableRow},
    Result,
};

#[allow(non_snake_case)]
/// `Assembly.Flags` and `AssemblyRef.Flags` constants (ECMA-335 II.23.1.2)
pub mod AssemblyFlags {
    /// The public key column holds the full key, not its token
    pub const PUBLIC_KEY: u32 = 0x0001;
    /// The reference may bind to a different assembly at runtime
    pub const RETARGETABLE: u32 = 0x0100;
    /// The assembly is a Windows Runtime component
    pub const WINDOWS_RUNTIME: u32 = 0x0200;
    /// Do not optimise when JIT compiling
    pub const DISABLE_JIT_COMPILE_OPTIMIZER: u32 = 0x4000;
    /// Track JIT compilation
    pub const ENABLE_JIT_COMPILE_TRACKING: u32 = 0x8000;
}

/// A four part assembly version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Read four consecutive `u16` version columns starting at `first`
fn version<'a, T: TableRow<'a>>(row: &T, first: usize) -> Result<AssemblyVersion> {
    #[allow(clippy::cast_possible_truncation)]
    Ok(AssemblyVersion {
        major: row.value(first)? as u16,
        minor: row.value(first + 1)? as u16,
        build: row.value(first + 2)? as u16,
        revision: row.value(first + 3)? as u16,
    })
}

table_row! {
    /// The identity of the current assembly
    Assembly => Assembly
}

impl<'a> Assembly<'a> {
    /// `AssemblyHashAlgorithm` used for file hashes
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn hash_alg_id(&self) -> Result<u32> {
        self.value(0)
    }

    /// Assembly version
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn version(&self) -> Result<AssemblyVersion> {
        version(self, 1)
    }

    /// `AssemblyFlags` of the assembly
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u32> {
        self.value(5)
    }

    /// Public key, empty for unsigned assemblies
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn public_key(&self) -> Result<&'a [u8]> {
        self.blob(6)
    }

    /// Assembly name, e.g. `Windows.Win32`
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(7)
    }

    /// Culture, empty for neutral assemblies
    ///
    /// # Errors
    /// Returns an error if the row or the culture cannot be read.
    pub fn culture(&self) -> Result<&'a str> {
        self.string(8)
    }
}

table_row! {
    /// A reference to another assembly
    AssemblyRef => AssemblyRef
}

impl<'a> AssemblyRef<'a> {
    /// Referenced version
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn version(&self) -> Result<AssemblyVersion> {
        version(self, 0)
    }

    /// `AssemblyFlags` of the reference
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn flags(&self) -> Result<u32> {
        self.value(4)
    }

    /// Public key or its 8 byte token, as told by [`AssemblyFlags::PUBLIC_KEY`]
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn public_key_or_token(&self) -> Result<&'a [u8]> {
        self.blob(5)
    }

    /// Referenced assembly name, e.g. `mscorlib`
    ///
    /// # Errors
    /// Returns an error if the row or the name cannot be read.
    pub fn name(&self) -> Result<&'a str> {
        self.string(6)
    }

    /// Referenced culture
    ///
    /// # Errors
    /// Returns an error if the row or the culture cannot be read.
    pub fn culture(&self) -> Result<&'a str> {
        self.string(7)
    }

    /// Hash of the referenced assembly, usually empty
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn hash_value(&self) -> Result<&'a [u8]> {
        self.blob(8)
    }
}

table_row! {
    /// A declarative security permission set
    DeclSecurity => DeclSecurity
}

impl<'a> DeclSecurity<'a> {
    /// `SecurityAction` of the permission set
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn action(&self) -> Result<u16> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.value(0)? as u16)
    }

    /// The type, method or assembly the permissions apply to, `HasDeclSecurity`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn parent(&self) -> Result<CodedIndex> {
        self.coded_index(1, CodedIndexType::HasDeclSecurity)
    }

    /// The undecoded permission set
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn permission_set(&self) -> Result<&'a [u8]> {
        self.blob(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::MetadataBuilder, Database};

    #[test]
    fn version_display() {
        let version = AssemblyVersion {
            major: 255,
            minor: 255,
            build: 255,
            revision: 255,
        };
        assert_eq!(version.to_string(), "255.255.255.255");
        assert!(AssemblyVersion::default() < version);
    }

    #[test]
    fn references() {
        let db = Database::from_metadata(MetadataBuilder::new().build()).unwrap();

        let mscorlib = db.rows::<AssemblyRef>().next().unwrap();
        assert_eq!(mscorlib.name().unwrap(), "mscorlib");
        assert_eq!(mscorlib.version().unwrap().to_string(), "4.0.0.0");
        assert_eq!(mscorlib.public_key_or_token().unwrap().len(), 8);
        assert!(mscorlib.culture().unwrap().is_empty());
    }
}
