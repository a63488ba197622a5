//! Custom attribute blob decoder (ECMA-335 II.23.3).
//!
//! A blob starts with the prolog `0x0001`, followed by one value per constructor parameter and a
//! `u16` count of named arguments. Fixed arguments carry no type tags, so their layout comes
//! from the constructor's method signature; enum parameters additionally need the enum's
//! underlying type, which is looked up in the [`Database`] the attribute belongs to. Named
//! arguments are self-describing.

use crate::{
    file::parser::Parser,
    metadata::{
        customattributes::{
            CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
            SERIALIZATION_TYPE,
        },
        database::Database,
        signatures::{SignatureMethod, TypeSignature},
        tables::CodedIndex,
    },
    Error::RecursionLimit,
    Result,
};

/// Nesting depth of arrays and boxed values accepted by default
pub const MAX_NESTING_DEPTH: usize = 32;

/// The declared type of a named argument, `FieldOrPropType` in the standard
#[derive(Debug, Clone, PartialEq)]
enum FieldOrPropType {
    Primitive(u8),
    Type,
    Boxed,
    Enum(String),
    SzArray(Box<FieldOrPropType>),
}

impl FieldOrPropType {
    fn name(&self) -> String {
        match self {
            FieldOrPropType::Primitive(tag) => match *tag {
                SERIALIZATION_TYPE::BOOLEAN => "Boolean",
                SERIALIZATION_TYPE::CHAR => "Char",
                SERIALIZATION_TYPE::I1 => "I1",
                SERIALIZATION_TYPE::U1 => "U1",
                SERIALIZATION_TYPE::I2 => "I2",
                SERIALIZATION_TYPE::U2 => "U2",
                SERIALIZATION_TYPE::I4 => "I4",
                SERIALIZATION_TYPE::U4 => "U4",
                SERIALIZATION_TYPE::I8 => "I8",
                SERIALIZATION_TYPE::U8 => "U8",
                SERIALIZATION_TYPE::R4 => "R4",
                SERIALIZATION_TYPE::R8 => "R8",
                _ => "String",
            }
            .to_string(),
            FieldOrPropType::Type => "Type".to_string(),
            FieldOrPropType::Boxed => "TaggedObject".to_string(),
            FieldOrPropType::Enum(name) => name.clone(),
            FieldOrPropType::SzArray(element) => format!("{}[]", element.name()),
        }
    }
}

/// Decode a custom attribute blob whose constructor has the signature `constructor`.
///
/// Without a database, enum parameters cannot be decoded and produce an error.
///
/// # Errors
/// Returns an error if the blob is malformed or does not match `constructor`.
pub fn parse_custom_attribute_data(
    data: &[u8],
    constructor: &SignatureMethod,
) -> Result<CustomAttributeValue> {
    CustomAttributeParser::new(data).parse_custom_attribute(constructor)
}

/// Decode a custom attribute blob of `db`, resolving enum parameter types through it
///
/// # Errors
/// Returns an error if the blob is malformed or does not match `constructor`.
pub fn parse_custom_attribute_blob(
    db: &Database,
    data: &[u8],
    constructor: &SignatureMethod,
) -> Result<CustomAttributeValue> {
    CustomAttributeParser::with_database(data, db).parse_custom_attribute(constructor)
}

/// Decoder over one custom attribute blob.
pub struct CustomAttributeParser<'a> {
    parser: Parser<'a>,
    db: Option<&'a Database>,
    depth: usize,
}

impl<'a> CustomAttributeParser<'a> {
    /// A decoder that cannot resolve enum types
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        CustomAttributeParser {
            parser: Parser::new(data),
            db: None,
            depth: 0,
        }
    }

    /// A decoder that resolves enum types through `db`
    #[must_use]
    pub fn with_database(data: &'a [u8], db: &'a Database) -> Self {
        CustomAttributeParser {
            parser: Parser::new(data),
            db: Some(db),
            depth: 0,
        }
    }

    /// Decode the blob: prolog, fixed arguments and named arguments.
    ///
    /// An empty blob decodes to an empty value.
    ///
    /// # Errors
    /// Returns an error on a bad prolog, truncated data, unsupported parameter types or
    /// excessive nesting.
    pub fn parse_custom_attribute(
        &mut self,
        constructor: &SignatureMethod,
    ) -> Result<CustomAttributeValue> {
        if self.parser.is_empty() {
            return Ok(CustomAttributeValue::default());
        }

        let prolog = self.parser.read_le::<u16>()?;
        if prolog != 0x0001 {
            return Err(malformed_error!(
                "Invalid custom attribute prolog - expected 0x0001, found {:#06x}",
                prolog
            ));
        }

        let mut fixed_args = Vec::with_capacity(constructor.params.len());
        for param in &constructor.params {
            fixed_args.push(self.parse_fixed_argument(&param.base)?);
        }

        let mut named_args = Vec::new();
        if self.parser.remaining() >= 2 {
            let count = self.parser.read_le::<u16>()?;
            for _ in 0..count {
                named_args.push(self.parse_named_argument()?);
            }
        }

        Ok(CustomAttributeValue {
            fixed_args,
            named_args,
        })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(RecursionLimit(MAX_NESTING_DEPTH));
        }
        Ok(())
    }

    fn parse_fixed_argument(&mut self, signature: &TypeSignature) -> Result<CustomAttributeArgument> {
        self.enter()?;
        let result = self.parse_fixed_argument_inner(signature);
        self.depth -= 1;
        result
    }

    fn parse_fixed_argument_inner(
        &mut self,
        signature: &TypeSignature,
    ) -> Result<CustomAttributeArgument> {
        if let Some(primitive) = self.parse_primitive(signature)? {
            return Ok(primitive);
        }

        match signature {
            TypeSignature::Object => {
                let tag = self.parse_field_or_prop_type()?;
                self.parse_value(&tag)
            }
            TypeSignature::Class(index) => {
                let (namespace, name) = self.type_name(*index)?;
                match (namespace, name) {
                    ("System", "Type") => Ok(CustomAttributeArgument::Type(self.parse_string()?)),
                    ("System", "String") => {
                        Ok(CustomAttributeArgument::String(self.parse_string()?))
                    }
                    ("System", "Object") => {
                        let tag = self.parse_field_or_prop_type()?;
                        self.parse_value(&tag)
                    }
                    _ => self.parse_enum(*index),
                }
            }
            TypeSignature::ValueType(index) => self.parse_enum(*index),
            TypeSignature::SzArray(array) => {
                let length = self.parser.read_le::<i32>()?;
                if length == -1 {
                    return Ok(CustomAttributeArgument::Array(Vec::new()));
                }
                let length = usize::try_from(length)
                    .map_err(|_| malformed_error!("Invalid array length: {}", length))?;

                let mut elements = Vec::with_capacity(length.min(self.parser.remaining()));
                for _ in 0..length {
                    elements.push(self.parse_fixed_argument(&array.base)?);
                }
                Ok(CustomAttributeArgument::Array(elements))
            }
            other => Err(malformed_error!(
                "Unsupported custom attribute parameter type - {:?}",
                other
            )),
        }
    }

    fn parse_primitive(&mut self, signature: &TypeSignature) -> Result<Option<CustomAttributeArgument>> {
        let value = match signature {
            TypeSignature::Boolean => CustomAttributeArgument::Bool(self.parser.read_le::<u8>()? != 0),
            TypeSignature::Char => {
                let unit = self.parser.read_le::<u16>()?;
                CustomAttributeArgument::Char(char::from_u32(u32::from(unit)).unwrap_or('\u{FFFD}'))
            }
            TypeSignature::I1 => CustomAttributeArgument::I1(self.parser.read_le::<i8>()?),
            TypeSignature::U1 => CustomAttributeArgument::U1(self.parser.read_le::<u8>()?),
            TypeSignature::I2 => CustomAttributeArgument::I2(self.parser.read_le::<i16>()?),
            TypeSignature::U2 => CustomAttributeArgument::U2(self.parser.read_le::<u16>()?),
            TypeSignature::I4 => CustomAttributeArgument::I4(self.parser.read_le::<i32>()?),
            TypeSignature::U4 => CustomAttributeArgument::U4(self.parser.read_le::<u32>()?),
            TypeSignature::I8 => CustomAttributeArgument::I8(self.parser.read_le::<i64>()?),
            TypeSignature::U8 => CustomAttributeArgument::U8(self.parser.read_le::<u64>()?),
            TypeSignature::R4 => CustomAttributeArgument::R4(self.parser.read_le::<f32>()?),
            TypeSignature::R8 => CustomAttributeArgument::R8(self.parser.read_le::<f64>()?),
            #[allow(clippy::cast_possible_truncation)]
            TypeSignature::I => CustomAttributeArgument::I(self.parser.read_le::<i64>()? as isize),
            #[allow(clippy::cast_possible_truncation)]
            TypeSignature::U => CustomAttributeArgument::U(self.parser.read_le::<u64>()? as usize),
            TypeSignature::String => CustomAttributeArgument::String(self.parse_string()?),
            _ => return Ok(None),
        };

        Ok(Some(value))
    }

    fn type_name(&self, index: CodedIndex) -> Result<(&'a str, &'a str)> {
        let Some(db) = self.db else {
            return Err(malformed_error!(
                "Cannot decode argument of type {} without a database",
                index.token
            ));
        };
        db.type_name(index)
    }

    /// Full name and underlying type of the enum `index`
    fn enum_type(&self, index: CodedIndex) -> Result<(String, TypeSignature)> {
        let Some(db) = self.db else {
            return Err(malformed_error!(
                "Cannot decode enum argument of type {} without a database",
                index.token
            ));
        };

        let (namespace, name) = db.type_name(index)?;
        let full_name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };

        let Some(definition) = db.resolve_type_by_name(index)? else {
            return Err(malformed_error!(
                "Enum type '{}' of a custom attribute argument could not be resolved",
                full_name
            ));
        };

        match definition.enum_underlying_type()? {
            Some(underlying) => Ok((full_name, underlying)),
            None => Err(malformed_error!(
                "Custom attribute argument type '{}' is not an enum",
                full_name
            )),
        }
    }

    fn parse_enum(&mut self, index: CodedIndex) -> Result<CustomAttributeArgument> {
        let (name, underlying) = self.enum_type(index)?;
        self.parse_enum_value(name, &underlying)
    }

    fn parse_enum_value(
        &mut self,
        name: String,
        underlying: &TypeSignature,
    ) -> Result<CustomAttributeArgument> {
        match self.parse_primitive(underlying)? {
            Some(CustomAttributeArgument::String(_)) | None => Err(malformed_error!(
                "Enum '{}' has an invalid underlying type - {:?}",
                name,
                underlying
            )),
            Some(value) => Ok(CustomAttributeArgument::Enum(name, Box::new(value))),
        }
    }

    fn parse_named_argument(&mut self) -> Result<CustomAttributeNamedArgument> {
        let is_field = match self.parser.read_le::<u8>()? {
            SERIALIZATION_TYPE::FIELD => true,
            SERIALIZATION_TYPE::PROPERTY => false,
            other => {
                return Err(malformed_error!(
                    "Invalid field/property indicator: {:#04x}",
                    other
                ))
            }
        };

        let arg_type = self.parse_field_or_prop_type()?;
        let name = self.parse_string()?;
        let value = self.parse_value(&arg_type)?;

        Ok(CustomAttributeNamedArgument {
            is_field,
            name,
            arg_type: arg_type.name(),
            value,
        })
    }

    fn parse_field_or_prop_type(&mut self) -> Result<FieldOrPropType> {
        self.enter()?;
        let result = self.parse_field_or_prop_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_field_or_prop_type_inner(&mut self) -> Result<FieldOrPropType> {
        let tag = self.parser.read_le::<u8>()?;
        match tag {
            SERIALIZATION_TYPE::BOOLEAN..=SERIALIZATION_TYPE::STRING => {
                Ok(FieldOrPropType::Primitive(tag))
            }
            SERIALIZATION_TYPE::TYPE => Ok(FieldOrPropType::Type),
            SERIALIZATION_TYPE::TAGGED_OBJECT => Ok(FieldOrPropType::Boxed),
            SERIALIZATION_TYPE::ENUM => Ok(FieldOrPropType::Enum(self.parse_string()?)),
            SERIALIZATION_TYPE::SZARRAY => Ok(FieldOrPropType::SzArray(Box::new(
                self.parse_field_or_prop_type()?,
            ))),
            _ => Err(malformed_error!(
                "Unsupported serialization type tag: {:#04x}",
                tag
            )),
        }
    }

    fn parse_value(&mut self, arg_type: &FieldOrPropType) -> Result<CustomAttributeArgument> {
        self.enter()?;
        let result = self.parse_value_inner(arg_type);
        self.depth -= 1;
        result
    }

    fn parse_value_inner(&mut self, arg_type: &FieldOrPropType) -> Result<CustomAttributeArgument> {
        match arg_type {
            FieldOrPropType::Primitive(tag) => {
                let signature = match *tag {
                    SERIALIZATION_TYPE::BOOLEAN => TypeSignature::Boolean,
                    SERIALIZATION_TYPE::CHAR => TypeSignature::Char,
                    SERIALIZATION_TYPE::I1 => TypeSignature::I1,
                    SERIALIZATION_TYPE::U1 => TypeSignature::U1,
                    SERIALIZATION_TYPE::I2 => TypeSignature::I2,
                    SERIALIZATION_TYPE::U2 => TypeSignature::U2,
                    SERIALIZATION_TYPE::I4 => TypeSignature::I4,
                    SERIALIZATION_TYPE::U4 => TypeSignature::U4,
                    SERIALIZATION_TYPE::I8 => TypeSignature::I8,
                    SERIALIZATION_TYPE::U8 => TypeSignature::U8,
                    SERIALIZATION_TYPE::R4 => TypeSignature::R4,
                    SERIALIZATION_TYPE::R8 => TypeSignature::R8,
                    _ => TypeSignature::String,
                };
                self.parse_fixed_argument(&signature)
            }
            FieldOrPropType::Type => Ok(CustomAttributeArgument::Type(self.parse_string()?)),
            FieldOrPropType::Boxed => {
                let inner = self.parse_field_or_prop_type()?;
                self.parse_value(&inner)
            }
            FieldOrPropType::Enum(name) => {
                let underlying = self.enum_type_by_name(name)?;
                self.parse_enum_value(name.clone(), &underlying)
            }
            FieldOrPropType::SzArray(element) => {
                let length = self.parser.read_le::<i32>()?;
                if length == -1 {
                    return Ok(CustomAttributeArgument::Array(Vec::new()));
                }
                let length = usize::try_from(length)
                    .map_err(|_| malformed_error!("Invalid array length: {}", length))?;

                let mut elements = Vec::with_capacity(length.min(self.parser.remaining()));
                for _ in 0..length {
                    elements.push(self.parse_value(element)?);
                }
                Ok(CustomAttributeArgument::Array(elements))
            }
        }
    }

    /// Underlying type of an enum named in the blob
    fn enum_type_by_name(&self, name: &str) -> Result<TypeSignature> {
        let Some(db) = self.db else {
            return Err(malformed_error!(
                "Cannot decode enum argument of type '{}' without a database",
                name
            ));
        };

        let (namespace, type_name) = name.rsplit_once('.').unwrap_or(("", name));
        let Some(definition) = db.find(namespace, type_name) else {
            return Err(malformed_error!(
                "Enum type '{}' of a custom attribute argument could not be resolved",
                name
            ));
        };

        definition.enum_underlying_type()?.ok_or_else(|| {
            malformed_error!("Custom attribute argument type '{}' is not an enum", name)
        })
    }

    fn parse_string(&mut self) -> Result<String> {
        Ok(self
            .parser
            .read_ser_string()?
            .map(str::to_string)
            .unwrap_or_default())
    }
}
