//! Literal arrays: constant buffers referenced by instructions (object and array templates,
//! class definitions, module records).

use std::fmt;

use crate::{
    file::{
        io::{push_le, write_compressed_uint},
        parser::Parser,
    },
    metadata::ids::{FunctionId, LiteralArrayId, StringId},
    Result,
};

/// One element of a literal array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Boolean
    Bool(bool),
    /// Unsigned 8-bit integer
    U8(u8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// Interned string
    String(StringId),
    /// Function
    Method(FunctionId),
    /// Affiliate data of the preceding method (its argument count)
    MethodAffiliate(u16),
    /// Nested literal array
    LiteralArray(LiteralArrayId),
    /// Null value
    Null,
}

impl Literal {
    fn tag(self) -> u8 {
        match self {
            Literal::Bool(_) => 0,
            Literal::U8(_) => 1,
            Literal::U16(_) => 2,
            Literal::U32(_) => 3,
            Literal::U64(_) => 4,
            Literal::F32(_) => 5,
            Literal::F64(_) => 6,
            Literal::String(_) => 7,
            Literal::Method(_) => 8,
            Literal::MethodAffiliate(_) => 9,
            Literal::LiteralArray(_) => 10,
            Literal::Null => 11,
        }
    }

    pub(crate) fn write(self, buffer: &mut Vec<u8>) -> Result<()> {
        buffer.push(self.tag());
        match self {
            Literal::Bool(value) => buffer.push(u8::from(value)),
            Literal::U8(value) => buffer.push(value),
            Literal::U16(value) | Literal::MethodAffiliate(value) => push_le(buffer, value),
            Literal::U32(value) => push_le(buffer, value),
            Literal::U64(value) => push_le(buffer, value),
            Literal::F32(value) => push_le(buffer, value),
            Literal::F64(value) => push_le(buffer, value),
            Literal::String(id) => write_compressed_uint(id.0, buffer)?,
            Literal::Method(id) => write_compressed_uint(id.0, buffer)?,
            Literal::LiteralArray(id) => write_compressed_uint(id.0, buffer)?,
            Literal::Null => {}
        }
        Ok(())
    }

    pub(crate) fn read(parser: &mut Parser<'_>) -> Result<Literal> {
        let tag = parser.read_le::<u8>()?;
        let literal = match tag {
            0 => Literal::Bool(parser.read_le::<u8>()? != 0),
            1 => Literal::U8(parser.read_le::<u8>()?),
            2 => Literal::U16(parser.read_le::<u16>()?),
            3 => Literal::U32(parser.read_le::<u32>()?),
            4 => Literal::U64(parser.read_le::<u64>()?),
            5 => Literal::F32(parser.read_le::<f32>()?),
            6 => Literal::F64(parser.read_le::<f64>()?),
            7 => Literal::String(StringId::new(parser.read_compressed_uint()?)),
            8 => Literal::Method(FunctionId::new(parser.read_compressed_uint()?)),
            9 => Literal::MethodAffiliate(parser.read_le::<u16>()?),
            10 => Literal::LiteralArray(LiteralArrayId::new(parser.read_compressed_uint()?)),
            11 => Literal::Null,
            _ => return Err(malformed_error!("Unknown literal tag {}", tag)),
        };
        Ok(literal)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::U8(value) => write!(f, "{value}u8"),
            Literal::U16(value) => write!(f, "{value}u16"),
            Literal::U32(value) => write!(f, "{value}u32"),
            Literal::U64(value) => write!(f, "{value}u64"),
            Literal::F32(value) => write!(f, "{value:?}f32"),
            Literal::F64(value) => write!(f, "{value:?}"),
            Literal::String(id) => write!(f, "{id}"),
            Literal::Method(id) => write!(f, "{id}"),
            Literal::MethodAffiliate(value) => write!(f, "affiliate({value})"),
            Literal::LiteralArray(id) => write!(f, "{id}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// An ordered, immutable list of literals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiteralArray {
    literals: Vec<Literal>,
}

impl LiteralArray {
    /// Creates an array holding `literals`.
    #[must_use]
    pub fn new(literals: Vec<Literal>) -> Self {
        LiteralArray { literals }
    }

    /// The literals in order.
    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns `true` for an empty array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_encoding() {
        let literals = [
            Literal::Bool(true),
            Literal::U16(0xBEEF),
            Literal::F64(1.5),
            Literal::String(StringId::new(300)),
            Literal::MethodAffiliate(2),
            Literal::Null,
        ];

        let mut buffer = Vec::new();
        for literal in literals {
            literal.write(&mut buffer).unwrap();
        }
        assert_eq!(&buffer[..2], &[0, 1]);

        let mut parser = Parser::new(&buffer);
        for literal in literals {
            assert_eq!(Literal::read(&mut parser).unwrap(), literal);
        }
        assert!(!parser.has_more_data());
    }

    #[test]
    fn unknown_tag() {
        let mut parser = Parser::new(&[42]);
        assert!(matches!(
            Literal::read(&mut parser),
            Err(crate::Error::Malformed { .. })
        ));
    }
}
