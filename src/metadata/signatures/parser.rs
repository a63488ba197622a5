//! Recursive-descent decoder for signature blobs.

use crate::{
    file::parser::Parser,
    metadata::signatures::{
        ArrayDimensions, CustomModifier, GenericInstance, SignatureArray, SignatureField,
        SignatureMethod, SignatureParameter, SignaturePointer, SignatureProperty,
        SignatureSzArray, SignatureTypeSpec, TypeSignature, CALLING_CONVENTION, ELEMENT_TYPE,
    },
    Error::RecursionLimit,
    Result,
};

/// Nesting depth used when no limit is configured
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Decoder over one signature blob.
///
/// # Examples
///
/// ```rust
/// use winmdscope::metadata::signatures::{SignatureParser, TypeSignature};
///
/// // static void (int32, uint8*)
/// let mut parser = SignatureParser::new(&[0x00, 0x02, 0x01, 0x08, 0x0F, 0x05]);
/// let method = parser.parse_method_signature()?;
/// assert_eq!(method.return_type.base, TypeSignature::Void);
/// assert_eq!(method.params.len(), 2);
/// # Ok::<(), winmdscope::Error>(())
/// ```
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Create a decoder over `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Create a decoder that fails with [`crate::Error::RecursionLimit`] once types nest deeper
    /// than `max_depth`
    #[must_use]
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
            max_depth,
        }
    }

    /// Decode one `Type` production
    ///
    /// # Errors
    /// Returns an error on truncated data, unknown element types, invalid coded indexes or
    /// excessive nesting.
    pub fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(RecursionLimit(self.max_depth));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::PTR => Ok(TypeSignature::Ptr(SignaturePointer {
                modifiers: self.parse_custom_mods()?,
                base: Box::new(self.parse_type()?),
            })),
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => Ok(TypeSignature::ValueType(
                self.parser.read_type_def_or_ref()?,
            )),
            ELEMENT_TYPE::CLASS => Ok(TypeSignature::Class(self.parser.read_type_def_or_ref()?)),
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let base = Box::new(self.parse_type()?);
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                if num_sizes > rank {
                    return Err(malformed_error!(
                        "Array declares {} sizes for rank {}",
                        num_sizes,
                        rank
                    ));
                }
                let mut dimensions = Vec::with_capacity(num_sizes as usize);
                for _ in 0..num_sizes {
                    dimensions.push(ArrayDimensions {
                        size: Some(self.parser.read_compressed_uint()?),
                        lower_bound: None,
                    });
                }

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                if num_lo_bounds > rank {
                    return Err(malformed_error!(
                        "Array declares {} lower bounds for rank {}",
                        num_lo_bounds,
                        rank
                    ));
                }
                for index in 0..num_lo_bounds as usize {
                    let lower_bound = self.parser.read_compressed_int()?;
                    match dimensions.get_mut(index) {
                        Some(dimension) => dimension.lower_bound = Some(lower_bound),
                        None => dimensions.push(ArrayDimensions {
                            size: None,
                            lower_bound: Some(lower_bound),
                        }),
                    }
                }

                Ok(TypeSignature::Array(SignatureArray {
                    base,
                    rank,
                    dimensions,
                }))
            }
            ELEMENT_TYPE::SZARRAY => Ok(TypeSignature::SzArray(SignatureSzArray {
                modifiers: self.parse_custom_mods()?,
                base: Box::new(self.parse_type()?),
            })),
            ELEMENT_TYPE::GENERICINST => {
                let is_value_type = match self.parser.read_le::<u8>()? {
                    ELEMENT_TYPE::VALUETYPE => true,
                    ELEMENT_TYPE::CLASS => false,
                    other => {
                        return Err(malformed_error!(
                            "GENERICINST - expected CLASS or VALUETYPE, found {:#x}",
                            other
                        ))
                    }
                };

                let generic_type = self.parser.read_type_def_or_ref()?;
                let arg_count = self.parser.read_compressed_uint()?;
                let mut args = Vec::with_capacity(arg_count.min(64) as usize);
                for _ in 0..arg_count {
                    args.push(self.parse_type()?);
                }

                Ok(TypeSignature::GenericInst(GenericInstance {
                    is_value_type,
                    generic_type,
                    args,
                }))
            }
            ELEMENT_TYPE::FNPTR => Ok(TypeSignature::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            _ => Err(malformed_error!(
                "Unsupported ELEMENT_TYPE - {:#x}",
                current_byte
            )),
        }
    }

    fn parse_custom_mods(&mut self) -> Result<Vec<CustomModifier>> {
        let mut mods = Vec::new();
        while self.parser.has_more_data() {
            let is_required = match self.parser.peek_byte()? {
                ELEMENT_TYPE::CMOD_REQD => true,
                ELEMENT_TYPE::CMOD_OPT => false,
                _ => break,
            };

            self.parser.advance()?;
            mods.push(CustomModifier {
                is_required,
                modifier_type: self.parser.read_type_def_or_ref()?,
            });
        }

        Ok(mods)
    }

    fn parse_param(&mut self) -> Result<SignatureParameter> {
        let modifiers = self.parse_custom_mods()?;

        let by_ref = self.parser.peek_byte()? == ELEMENT_TYPE::BYREF;
        if by_ref {
            self.parser.advance()?;
        }

        Ok(SignatureParameter {
            modifiers,
            by_ref,
            base: self.parse_type()?,
        })
    }

    /// Decode a method signature
    ///
    /// # Errors
    /// Returns an error if the blob is truncated or malformed.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let head = self.parser.read_le::<u8>()?;
        let calling_convention = head & CALLING_CONVENTION::KIND_MASK;
        if calling_convention > CALLING_CONVENTION::VARARG {
            return Err(malformed_error!(
                "SignatureMethod - invalid calling convention - {:#x}",
                head
            ));
        }

        let generic_param_count = if head & CALLING_CONVENTION::GENERIC != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };
        let param_count = self.parser.read_compressed_uint()?;
        let return_type = self.parse_param()?;

        let mut params = Vec::with_capacity(param_count.min(64) as usize);
        let mut varargs = Vec::new();
        for _ in 0..param_count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                self.parser.advance()?;
                // Everything after the sentinel belongs to the vararg list
                let remaining = param_count as usize - params.len();
                for _ in 0..remaining {
                    varargs.push(self.parse_param()?);
                }
                break;
            }
            params.push(self.parse_param()?);
        }

        Ok(SignatureMethod {
            has_this: head & CALLING_CONVENTION::HAS_THIS != 0,
            explicit_this: head & CALLING_CONVENTION::EXPLICIT_THIS != 0,
            calling_convention,
            generic_param_count,
            return_type,
            params,
            varargs,
        })
    }

    /// Decode a field signature
    ///
    /// # Errors
    /// Returns an error if the blob does not start with `FIELD` or is malformed.
    pub fn parse_field_signature(&mut self) -> Result<SignatureField> {
        let head = self.parser.read_le::<u8>()?;
        if head != CALLING_CONVENTION::FIELD {
            return Err(malformed_error!("SignatureField - invalid start - {:#x}", head));
        }

        Ok(SignatureField {
            modifiers: self.parse_custom_mods()?,
            base: self.parse_type()?,
        })
    }

    /// Decode a property signature
    ///
    /// # Errors
    /// Returns an error if the blob does not start with `PROPERTY` or is malformed.
    pub fn parse_property_signature(&mut self) -> Result<SignatureProperty> {
        let head = self.parser.read_le::<u8>()?;
        if head & CALLING_CONVENTION::PROPERTY == 0 {
            return Err(malformed_error!(
                "SignatureProperty - invalid start - {:#x}",
                head
            ));
        }

        let param_count = self.parser.read_compressed_uint()?;
        let modifiers = self.parse_custom_mods()?;
        let base = self.parse_type()?;

        let mut params = Vec::with_capacity(param_count.min(64) as usize);
        for _ in 0..param_count {
            params.push(self.parse_param()?);
        }

        Ok(SignatureProperty {
            has_this: head & CALLING_CONVENTION::HAS_THIS != 0,
            modifiers,
            base,
            params,
        })
    }

    /// Decode a `TypeSpec` signature
    ///
    /// # Errors
    /// Returns an error if the blob is truncated or malformed.
    pub fn parse_type_spec_signature(&mut self) -> Result<SignatureTypeSpec> {
        Ok(SignatureTypeSpec {
            base: self.parse_type()?,
        })
    }
}
