//! Value types of parameters, return values and instruction results.

use strum::{Display, EnumIter, FromRepr};

/// Type of a value in a signature or of an instruction result.
///
/// Static graphs carry precise types. Dynamic graphs type every value as [`TypeId::Any`] and
/// instructions without a result as [`TypeId::Void`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum TypeId {
    /// Unknown or erroneous type
    Invalid = 0,
    /// No value
    Void = 1,
    /// Boolean
    U1 = 2,
    /// Signed 8-bit integer
    I8 = 3,
    /// Unsigned 8-bit integer
    U8 = 4,
    /// Signed 16-bit integer
    I16 = 5,
    /// Unsigned 16-bit integer
    U16 = 6,
    /// Signed 32-bit integer
    I32 = 7,
    /// Unsigned 32-bit integer
    U32 = 8,
    /// Signed 64-bit integer
    I64 = 9,
    /// Unsigned 64-bit integer
    U64 = 10,
    /// 32-bit float
    F32 = 11,
    /// 64-bit float
    F64 = 12,
    /// String reference
    String = 13,
    /// Any other object reference
    Reference = 14,
    /// Dynamically typed value
    Any = 15,
}

impl TypeId {
    /// Returns `true` for the boolean and integer types.
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            TypeId::U1
                | TypeId::I8
                | TypeId::U8
                | TypeId::I16
                | TypeId::U16
                | TypeId::I32
                | TypeId::U32
                | TypeId::I64
                | TypeId::U64
        )
    }

    /// Returns `true` for the floating point types.
    #[must_use]
    pub fn is_floating(self) -> bool {
        matches!(self, TypeId::F32 | TypeId::F64)
    }

    /// Returns `true` for references (strings included).
    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(self, TypeId::String | TypeId::Reference)
    }

    /// Returns `true` if an instruction of this type produces a value.
    #[must_use]
    pub fn has_value(self) -> bool {
        self != TypeId::Void
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(TypeId::I32.is_integral());
        assert!(!TypeId::F64.is_integral());
        assert!(TypeId::F32.is_floating());
        assert!(TypeId::String.is_reference());
        assert!(!TypeId::Void.has_value());
        assert_eq!(TypeId::from_repr(14), Some(TypeId::Reference));
        assert_eq!(TypeId::U1.to_string(), "u1");
    }
}
