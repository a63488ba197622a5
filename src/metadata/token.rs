//! Metadata tokens: a table id in the high byte and a 1-based row in the low 24 bits.

use std::fmt;

use crate::metadata::tables::TableId;

/// A metadata token representing a reference to a metadata table entry.
///
/// # Examples
///
/// ```rust
/// use winmdscope::metadata::{tables::TableId, token::Token};
///
/// let token = Token::from_parts(TableId::TypeDef, 5);
/// assert_eq!(token.value(), 0x0200_0005);
/// assert_eq!(token.table(), 0x02);
/// assert_eq!(token.row(), 5);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a token for `row` of `table`
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token(((table as u32) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table id byte
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The 1-based row, 0 for a null reference
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if the token does not reference a row
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts() {
        let token = Token::from_parts(TableId::CustomAttribute, 0x1234);
        assert_eq!(token.value(), 0x0C00_1234);
        assert_eq!(token.table(), 0x0C);
        assert_eq!(token.row(), 0x1234);
        assert!(!token.is_null());

        assert!(Token::from_parts(TableId::TypeRef, 0).is_null());
        assert!(Token::new(0).is_null());
    }

    #[test]
    fn formatting() {
        let token = Token::new(0x0600_0001);
        assert_eq!(format!("{token}"), "0x06000001");
        assert_eq!(
            format!("{token:?}"),
            "Token(0x06000001, table: 0x06, row: 1)"
        );
    }

    #[test]
    fn ordering() {
        let mut tokens = vec![Token(0x0200_0003), Token(0x0100_0009), Token(0x0200_0001)];
        tokens.sort();
        assert_eq!(
            tokens,
            vec![Token(0x0100_0009), Token(0x0200_0001), Token(0x0200_0003)]
        );
    }
}
