//! CPU architecture declarations of the Win32 metadata dialect.
//!
//! The Win32 metadata emits one `TypeDef` per architecture subset when a type's layout differs
//! between platforms. All variants share namespace and name and carry a
//! `Windows.Win32.Foundation.Metadata.SupportedArchitectureAttribute` whose single fixed
//! argument is an `Architecture` enum value. Types without the attribute apply to every
//! architecture.
//!
//! Rendered names list the flags in the fixed order `X86`, `X64`, `Arm64`, joined by `|`.
//! Display names append that rendering to the base name after an `@`, so `CONTEXT` declared for
//! `X64` and `Arm64` displays as `CONTEXT@X64|Arm64`.
//!
//! # Examples
//!
//! ```rust
//! use winmdscope::Architecture;
//!
//! let arch = Architecture::X86 | Architecture::ARM64;
//! assert_eq!(arch.render_name(), "X86|Arm64");
//! assert_eq!(Architecture::parse_name("X86|Arm64")?, arch);
//! assert_eq!(Architecture::NONE.normalise(), Architecture::ALL);
//! # Ok::<(), winmdscope::Error>(())
//! ```

use std::{fmt, str::FromStr};

use bitflags::bitflags;

use crate::{
    metadata::customattributes::{CustomAttributeArgument, HasCustomAttributes},
    Result,
};

/// Namespace of the attribute that declares architecture support
pub const SUPPORTED_ARCHITECTURE_NAMESPACE: &str = "Windows.Win32.Foundation.Metadata";

/// Name of the attribute that declares architecture support
pub const SUPPORTED_ARCHITECTURE_NAME: &str = "SupportedArchitectureAttribute";

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// A set of CPU architectures. The empty set means "not declared".
    pub struct Architecture: u32 {
        /// 32-bit x86
        const X86 = 0x0001;
        /// x86-64
        const X64 = 0x0002;
        /// 64-bit ARM
        const ARM64 = 0x0004;
    }
}

/// Symbolic names in rendering order
const NAMES: [(Architecture, &str); 3] = [
    (Architecture::X86, "X86"),
    (Architecture::X64, "X64"),
    (Architecture::ARM64, "Arm64"),
];

impl Architecture {
    /// No architecture declared. Matches like [`Architecture::ALL`].
    pub const NONE: Architecture = Architecture::empty();

    /// Every known architecture
    pub const ALL: Architecture = Architecture::all();

    /// Render as `X86|X64|Arm64`, omitting absent flags. The empty set renders as `""`.
    #[must_use]
    pub fn render_name(self) -> String {
        let mut name = String::new();
        for (flag, flag_name) in NAMES {
            if self.contains(flag) {
                if !name.is_empty() {
                    name.push('|');
                }
                name.push_str(flag_name);
            }
        }

        name
    }

    /// Parse the rendering produced by [`Architecture::render_name`]
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unknown architecture name.
    pub fn parse_name(name: &str) -> Result<Architecture> {
        let mut arch = Architecture::NONE;
        if name.is_empty() {
            return Ok(arch);
        }

        for token in name.split('|') {
            match NAMES.iter().find(|(_, flag_name)| *flag_name == token) {
                Some((flag, _)) => arch |= *flag,
                None => return Err(malformed_error!("Unknown architecture - '{}'", token)),
            }
        }

        Ok(arch)
    }

    /// Treat an undeclared set as [`Architecture::ALL`]
    #[must_use]
    pub fn normalise(self) -> Architecture {
        if self.is_empty() {
            Architecture::ALL
        } else {
            self
        }
    }

    /// Returns true if both sets share an architecture once undeclared sets count as all
    #[must_use]
    pub fn matches(self, requested: Architecture) -> bool {
        self.normalise().intersects(requested.normalise())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_name())
    }
}

impl fmt::Debug for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Architecture({})", self.render_name())
    }
}

impl FromStr for Architecture {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Architecture::parse_name(s)
    }
}

/// The display name of a type: `base` when no architecture is declared, `base@<arch>` otherwise
#[must_use]
pub fn display_name(base: &str, arch: Architecture) -> String {
    if arch.is_empty() {
        base.to_string()
    } else {
        format!("{}@{}", base, arch.render_name())
    }
}

/// Read the architectures `item` declares through `SupportedArchitectureAttribute`.
///
/// Returns [`Architecture::NONE`] if the attribute is absent.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the attribute value cannot be decoded or its first
/// fixed argument is not an enum backed by a 32-bit signed integer.
pub fn supported_architectures<'a, T: HasCustomAttributes<'a>>(item: &T) -> Result<Architecture> {
    let Some(attribute) =
        item.get_attribute(SUPPORTED_ARCHITECTURE_NAMESPACE, SUPPORTED_ARCHITECTURE_NAME)?
    else {
        return Ok(Architecture::NONE);
    };

    let value = attribute.value()?;
    match value.fixed_args.first() {
        Some(CustomAttributeArgument::Enum(_, underlying)) => match underlying.as_ref() {
            #[allow(clippy::cast_sign_loss)]
            CustomAttributeArgument::I4(flags) => Ok(Architecture::from_bits_retain(*flags as u32)),
            other => Err(malformed_error!(
                "SupportedArchitectureAttribute on {} carries a non-I4 enum - {:?}",
                attribute.parent_token()?,
                other
            )),
        },
        other => Err(malformed_error!(
            "SupportedArchitectureAttribute on {} has an unexpected argument - {:?}",
            attribute.parent_token()?,
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_every_combination() {
        let expected = [
            "",
            "X86",
            "X64",
            "X86|X64",
            "Arm64",
            "X86|Arm64",
            "X64|Arm64",
            "X86|X64|Arm64",
        ];

        for (bits, name) in expected.iter().enumerate() {
            let arch = Architecture::from_bits_retain(bits as u32);
            assert_eq!(arch.render_name(), *name);
            assert_eq!(arch.to_string(), *name);
            assert_eq!(Architecture::parse_name(name).unwrap(), arch);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(Architecture::parse_name("X86|Mips").is_err());
        assert!(Architecture::parse_name("x86").is_err());
        assert!(Architecture::parse_name("|").is_err());
        assert_eq!("X64".parse::<Architecture>().unwrap(), Architecture::X64);
    }

    #[test]
    fn none_matches_like_all() {
        assert_eq!(Architecture::NONE.normalise(), Architecture::ALL);
        assert_eq!(Architecture::X64.normalise(), Architecture::X64);

        assert!(Architecture::NONE.matches(Architecture::X86));
        assert!(Architecture::X86.matches(Architecture::NONE));
        assert!(Architecture::ALL.matches(Architecture::ARM64));
        assert!(!Architecture::X64.matches(Architecture::X86));
        assert!((Architecture::X64 | Architecture::ARM64).matches(Architecture::ARM64));
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("CONTEXT", Architecture::NONE), "CONTEXT");
        assert_eq!(display_name("CONTEXT", Architecture::X86), "CONTEXT@X86");
        assert_eq!(
            display_name("CONTEXT", Architecture::X64 | Architecture::ARM64),
            "CONTEXT@X64|Arm64"
        );
    }

    mod attribute {
        use crate::{
            metadata::{
                architecture::{
                    Architecture, SUPPORTED_ARCHITECTURE_NAME, SUPPORTED_ARCHITECTURE_NAMESPACE,
                },
                signatures::ELEMENT_TYPE,
                tables::{TableId, TypeDef, TypeRef},
            },
            test::{compressed_uint, type_ref_token, MetadataBuilder},
            Database, Error,
        };

        const NAMESPACE: &str = "Windows.Win32.System.Diagnostics.Debug";
        const UNION: &str = "_Anonymous_e__Union";

        /// `CONTEXT` carrying the attribute returned by `attribute` as `(signature, value)`, with
        /// a nested union and a reference to that union
        fn context_with(
            attribute: impl FnOnce(&mut MetadataBuilder) -> (Vec<u8>, Vec<u8>),
        ) -> (Database, u32, u32) {
            let mut builder = MetadataBuilder::new();
            let (signature, value) = attribute(&mut builder);
            let context = builder.type_def(NAMESPACE, "CONTEXT");
            builder.custom_attribute(
                TableId::TypeDef,
                context,
                SUPPORTED_ARCHITECTURE_NAMESPACE,
                SUPPORTED_ARCHITECTURE_NAME,
                &signature,
                &value,
            );
            let union = builder.type_def("", UNION);
            builder.nested_class(union, context);
            let context_ref = builder.type_ref(NAMESPACE, "CONTEXT");
            let union_ref = builder.nested_type_ref(context_ref, UNION);
            (Database::from_metadata(builder.build()).unwrap(), context, union_ref)
        }

        fn assert_malformed((db, context, union_ref): (Database, u32, u32)) {
            let context = db.row::<TypeDef>(context).unwrap();
            assert!(matches!(
                context.supported_architectures(),
                Err(Error::Malformed { .. })
            ));

            let union_ref = db.row::<TypeRef>(union_ref).unwrap();
            assert!(matches!(
                union_ref.resolve(Architecture::X86),
                Err(Error::Malformed { .. })
            ));
        }

        /// `01 00`, the flags `X64|Arm64` as four bytes, no named arguments
        fn flags_value() -> Vec<u8> {
            vec![0x01, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00]
        }

        #[test]
        fn without_fixed_arguments() {
            assert_malformed(context_with(|_| {
                (vec![0x20, 0x00, ELEMENT_TYPE::VOID], vec![0x01, 0x00, 0x00, 0x00])
            }));
        }

        #[test]
        fn empty_value_blob() {
            assert_malformed(context_with(|builder| {
                let enum_type = builder.enum_type(
                    SUPPORTED_ARCHITECTURE_NAMESPACE,
                    "Architecture",
                    &[0x06, ELEMENT_TYPE::I4],
                );
                let mut signature = vec![0x20, 0x01, ELEMENT_TYPE::VOID, ELEMENT_TYPE::VALUETYPE];
                signature.extend(compressed_uint(enum_type << 2));
                (signature, Vec::new())
            }));
        }

        #[test]
        fn argument_is_not_an_enum() {
            assert_malformed(context_with(|_| {
                (
                    vec![0x20, 0x01, ELEMENT_TYPE::VOID, ELEMENT_TYPE::I4],
                    flags_value(),
                )
            }));
        }

        #[test]
        fn enum_with_unsigned_values() {
            assert_malformed(context_with(|builder| {
                let enum_type = builder.enum_type(
                    SUPPORTED_ARCHITECTURE_NAMESPACE,
                    "Architecture",
                    &[0x06, ELEMENT_TYPE::U4],
                );
                let mut signature = vec![0x20, 0x01, ELEMENT_TYPE::VOID, ELEMENT_TYPE::VALUETYPE];
                signature.extend(compressed_uint(enum_type << 2));
                (signature, flags_value())
            }));
        }

        #[test]
        fn undefined_enum_type() {
            assert_malformed(context_with(|builder| {
                let enum_ref = builder.type_ref(SUPPORTED_ARCHITECTURE_NAMESPACE, "Architecture");
                let mut signature = vec![0x20, 0x01, ELEMENT_TYPE::VOID, ELEMENT_TYPE::VALUETYPE];
                signature.extend(type_ref_token(enum_ref));
                (signature, flags_value())
            }));
        }

        #[test]
        fn well_formed_attribute() {
            let (db, context, union_ref) = context_with(|builder| {
                let enum_type = builder.enum_type(
                    SUPPORTED_ARCHITECTURE_NAMESPACE,
                    "Architecture",
                    &[0x06, ELEMENT_TYPE::I4],
                );
                let mut signature = vec![0x20, 0x01, ELEMENT_TYPE::VOID, ELEMENT_TYPE::VALUETYPE];
                signature.extend(compressed_uint(enum_type << 2));
                (signature, flags_value())
            });

            let context = db.row::<TypeDef>(context).unwrap();
            assert_eq!(
                context.supported_architectures().unwrap(),
                Architecture::X64 | Architecture::ARM64
            );
            let union_ref = db.row::<TypeRef>(union_ref).unwrap();
            let union = union_ref.resolve(Architecture::X86).unwrap().unwrap();
            assert_eq!(union.enclosing_type().unwrap(), Some(context));
        }
    }
}
