//! Decoded custom attribute values (ECMA-335 II.23.3).

/// A decoded custom attribute blob
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomAttributeValue {
    /// Constructor arguments in declaration order
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Field and property assignments
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

impl CustomAttributeValue {
    /// The named argument called `name`
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&CustomAttributeArgument> {
        self.named_args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

/// A single argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// No value
    Void,
    /// Boolean value
    Bool(bool),
    /// UTF-16 code unit
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// Native signed integer
    I(isize),
    /// Native unsigned integer
    U(usize),
    /// UTF-8 string, empty for a null string
    String(String),
    /// `System.Type`, as its serialised name
    Type(String),
    /// Single-dimension array, empty for a null array
    Array(Vec<CustomAttributeArgument>),
    /// Enum value: full enum type name and the value in the underlying type
    Enum(String, Box<CustomAttributeArgument>),
}

impl CustomAttributeArgument {
    /// The value as an `i64` for integral arguments and enums
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CustomAttributeArgument::I1(value) => Some(i64::from(*value)),
            CustomAttributeArgument::U1(value) => Some(i64::from(*value)),
            CustomAttributeArgument::I2(value) => Some(i64::from(*value)),
            CustomAttributeArgument::U2(value) => Some(i64::from(*value)),
            CustomAttributeArgument::I4(value) => Some(i64::from(*value)),
            CustomAttributeArgument::U4(value) => Some(i64::from(*value)),
            CustomAttributeArgument::I8(value) => Some(*value),
            #[allow(clippy::cast_possible_wrap)]
            CustomAttributeArgument::U8(value) => Some(*value as i64),
            CustomAttributeArgument::Enum(_, value) => value.as_i64(),
            _ => None,
        }
    }

    /// The string payload of `String` and `Type` arguments
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CustomAttributeArgument::String(value) | CustomAttributeArgument::Type(value) => {
                Some(value)
            }
            _ => None,
        }
    }
}

/// A named argument (field or property) of a custom attribute
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeNamedArgument {
    /// True for a field, false for a property
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Serialisation type name, see [`SERIALIZATION_TYPE`]
    pub arg_type: String,
    /// The assigned value
    pub value: CustomAttributeArgument,
}

/// `CorSerializationType` constants
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}
