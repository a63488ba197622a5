//! `Constant` (0x0B): compile-time values of fields, parameters and properties.
//!
//! Win32 metadata stores every `#define` it models as a literal field of an `Apis` class, so this
//! table carries most of the numeric constants of the Windows SDK.

use std::fmt;

use crate::{
    file::io::read_le,
    metadata::{
        signatures::ELEMENT_TYPE,
        tables::{table_row, CodedIndex, CodedIndexType, TableRow},
    },
    Result,
};

/// A decoded constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// `bool`
    Bool(bool),
    /// UTF-16 code unit
    Char(u16),
    /// `int8`
    I1(i8),
    /// `uint8`
    U1(u8),
    /// `int16`
    I2(i16),
    /// `uint16`
    U2(u16),
    /// `int32`
    I4(i32),
    /// `uint32`
    U4(u32),
    /// `int64`
    I8(i64),
    /// `uint64`
    U8(u64),
    /// `float32`
    R4(f32),
    /// `float64`
    R8(f64),
    /// A string, decoded from UTF-16
    String(String),
    /// A null object reference
    Null,
}

impl ConstantValue {
    /// Decode `data` as a constant of element type `kind`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is too short, or
    /// [`crate::Error::Malformed`] for an element type constants cannot have or a string that is
    /// not valid UTF-16.
    pub fn decode(kind: u8, data: &[u8]) -> Result<ConstantValue> {
        Ok(match kind {
            ELEMENT_TYPE::BOOLEAN => ConstantValue::Bool(read_le::<u8>(data)? != 0),
            ELEMENT_TYPE::CHAR => ConstantValue::Char(read_le(data)?),
            ELEMENT_TYPE::I1 => ConstantValue::I1(read_le(data)?),
            ELEMENT_TYPE::U1 => ConstantValue::U1(read_le(data)?),
            ELEMENT_TYPE::I2 => ConstantValue::I2(read_le(data)?),
            ELEMENT_TYPE::U2 => ConstantValue::U2(read_le(data)?),
            ELEMENT_TYPE::I4 => ConstantValue::I4(read_le(data)?),
            ELEMENT_TYPE::U4 => ConstantValue::U4(read_le(data)?),
            ELEMENT_TYPE::I8 => ConstantValue::I8(read_le(data)?),
            ELEMENT_TYPE::U8 => ConstantValue::U8(read_le(data)?),
            ELEMENT_TYPE::R4 => ConstantValue::R4(read_le(data)?),
            ELEMENT_TYPE::R8 => ConstantValue::R8(read_le(data)?),
            ELEMENT_TYPE::STRING => {
                if data.len() % 2 != 0 {
                    return Err(malformed_error!(
                        "String constant has odd length {}",
                        data.len()
                    ));
                }

                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                match String::from_utf16(&units) {
                    Ok(value) => ConstantValue::String(value),
                    Err(_) => return Err(malformed_error!("String constant is not valid UTF-16")),
                }
            }
            ELEMENT_TYPE::CLASS => ConstantValue::Null,
            _ => {
                return Err(malformed_error!(
                    "Invalid constant element type - 0x{:02x}",
                    kind
                ))
            }
        })
    }

    /// The value as a signed integer, if it is integral
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConstantValue::Bool(value) => Some(i64::from(*value)),
            ConstantValue::Char(value) | ConstantValue::U2(value) => Some(i64::from(*value)),
            ConstantValue::I1(value) => Some(i64::from(*value)),
            ConstantValue::U1(value) => Some(i64::from(*value)),
            ConstantValue::I2(value) => Some(i64::from(*value)),
            ConstantValue::I4(value) => Some(i64::from(*value)),
            ConstantValue::U4(value) => Some(i64::from(*value)),
            ConstantValue::I8(value) => Some(*value),
            ConstantValue::U8(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Bool(value) => write!(f, "{value}"),
            ConstantValue::Char(value) | ConstantValue::U2(value) => write!(f, "{value}"),
            ConstantValue::I1(value) => write!(f, "{value}"),
            ConstantValue::U1(value) => write!(f, "{value}"),
            ConstantValue::I2(value) => write!(f, "{value}"),
            ConstantValue::I4(value) => write!(f, "{value}"),
            ConstantValue::U4(value) => write!(f, "{value}"),
            ConstantValue::I8(value) => write!(f, "{value}"),
            ConstantValue::U8(value) => write!(f, "{value}"),
            ConstantValue::R4(value) => write!(f, "{value}"),
            ConstantValue::R8(value) => write!(f, "{value}"),
            ConstantValue::String(value) => write!(f, "{value:?}"),
            ConstantValue::Null => f.write_str("null"),
        }
    }
}

table_row! {
    /// The value of a literal field, optional parameter or property
    Constant => Constant
}

impl<'a> Constant<'a> {
    /// `ELEMENT_TYPE_*` of the value
    ///
    /// # Errors
    /// Returns an error if the row cannot be read.
    pub fn kind(&self) -> Result<u8> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(TableRow::value(self, 0)? as u8)
    }

    /// The owning field, parameter or property, `HasConstant`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn parent(&self) -> Result<CodedIndex> {
        self.coded_index(2, CodedIndexType::HasConstant)
    }

    /// The decoded value
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read, or the value is malformed.
    pub fn value(&self) -> Result<ConstantValue> {
        ConstantValue::decode(self.kind()?, self.blob(3)?)
    }
}
