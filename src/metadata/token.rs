//! Metadata tokens.
//!
//! A token is the 32-bit reference CIL operands use to point into the metadata tables: the high
//! byte names the table, the low 24 bits hold the 1-based row. Row 0 is the null reference.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::metadata::{tables::TableId, token::{decode_token, encode_token, Token}};
//!
//! let raw = encode_token(TableId::MethodDef, 1);
//! assert_eq!(raw, 0x0600_0001);
//! assert_eq!(decode_token(raw)?, (TableId::MethodDef, 1));
//!
//! let token = Token::new(raw);
//! assert_eq!(token.table(), 0x06);
//! assert_eq!(token.row(), 1);
//! # Ok::<(), dotcil::Error>(())
//! ```

use std::fmt;

use crate::{metadata::tables::TableId, Result};

/// Tag byte carried by `ldstr` operands, which reference the user-string heap rather than a table
pub const USER_STRING_TAG: u8 = 0x70;

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table and a row; the row is truncated to 24 bits
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token(encode_token(table, row))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if the token does not reference a row
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }

    /// The table this token points into.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidTableId`] if the high byte is not a known table.
    pub fn table_id(&self) -> Result<TableId> {
        TableId::from_token_type(self.table())
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

/// Build the canonical `(table << 24) | row` form.
///
/// Rows occupy 24 bits; higher bits of `row` are discarded.
#[must_use]
pub fn encode_token(table: TableId, row: u32) -> u32 {
    (u32::from(table.token_type()) << 24) | (row & 0x00FF_FFFF)
}

/// Split a raw token into its table and row.
///
/// # Errors
/// Returns [`crate::Error::InvalidTableId`] if the high byte does not map to a known table.
pub fn decode_token(raw: u32) -> Result<(TableId, u32)> {
    let token = Token(raw);
    Ok((token.table_id()?, token.row()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_token_parts() {
        let token = Token::new(0x0600_0001);
        assert_eq!(token.value(), 0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);

        let token = Token(0x06FF_FFFF);
        assert_eq!(token.row(), 0x00FF_FFFF);
    }

    #[test]
    fn test_token_is_null() {
        assert!(Token(0).is_null());
        assert!(Token(0x0200_0000).is_null());
        assert!(!Token(0x0600_0001).is_null());
    }

    #[test]
    fn test_token_conversion() {
        let token: Token = 0x0A00_0010u32.into();
        let back: u32 = token.into();
        assert_eq!(back, 0x0A00_0010);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(format!("{}", Token(0x0600_0001)), "0x06000001");

        let debug_str = format!("{:?}", Token(0x0600_0001));
        assert!(debug_str.contains("table: 0x06"));
        assert!(debug_str.contains("row: 1"));
    }

    #[test]
    fn encode_decode_token() {
        assert_eq!(encode_token(TableId::TypeRef, 0x12), 0x0100_0012);
        assert_eq!(encode_token(TableId::Module, 1), 0x0000_0001);
        assert_eq!(encode_token(TableId::CustomDebugInformation, 3), 0x3700_0003);
        assert_eq!(decode_token(0x0A00_0010).unwrap(), (TableId::MemberRef, 0x10));
        assert_eq!(
            Token::from_parts(TableId::StandAloneSig, 2),
            Token(0x1100_0002)
        );
    }

    #[test]
    fn decode_token_unknown_table() {
        assert!(matches!(
            decode_token(0x7000_0001),
            Err(Error::InvalidTableId(0x70))
        ));
        assert!(matches!(
            decode_token(0x2D00_0001),
            Err(Error::InvalidTableId(0x2D))
        ));
    }

    #[test]
    fn null_row_round_trips() {
        let raw = encode_token(TableId::TypeDef, 0);
        let (table, row) = decode_token(raw).unwrap();
        assert_eq!(table, TableId::TypeDef);
        assert_eq!(row, 0);
        assert!(Token(raw).is_null());
    }
}
