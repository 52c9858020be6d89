//! Primitive type kinds for Bento's built-in scalar types.

use std::fmt;

use crate::ValueKind;

/// Primitive type kinds.
///
/// These are the built-in scalar type names a [`Type`](crate::Type) can
/// carry. Several kinds share one runtime [`ValueKind`] (for instance
/// `short` and `int` values are both stored as `Int`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    String,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Void,
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::BigInteger,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::BigDecimal,
        PrimitiveKind::String,
    ];

    /// Get the source-level name of this primitive type.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::BigInteger => "biginteger",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::BigDecimal => "bigdecimal",
            PrimitiveKind::String => "string",
        }
    }

    /// Look up a primitive kind by its source-level name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Rank used to pick the result type of mixed numeric operands.
    ///
    /// Higher rank = wider type. Returns `None` for non-numeric kinds.
    pub const fn numeric_rank(self) -> Option<u8> {
        match self {
            PrimitiveKind::Byte => Some(1),
            PrimitiveKind::Short => Some(2),
            PrimitiveKind::Int => Some(3),
            PrimitiveKind::Long => Some(4),
            PrimitiveKind::BigInteger => Some(5),
            PrimitiveKind::Float => Some(6),
            PrimitiveKind::Double => Some(7),
            PrimitiveKind::BigDecimal => Some(8),
            _ => None,
        }
    }

    pub const fn is_numeric(self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Character-like kinds win over numeric kinds in result typing.
    pub const fn is_character(self) -> bool {
        matches!(self, PrimitiveKind::Char | PrimitiveKind::String)
    }

    /// The runtime value class used to store values of this kind.
    pub const fn value_kind(self) -> ValueKind {
        match self {
            PrimitiveKind::Void => ValueKind::Void,
            PrimitiveKind::Boolean => ValueKind::Bool,
            PrimitiveKind::Byte => ValueKind::Byte,
            PrimitiveKind::Char => ValueKind::Char,
            PrimitiveKind::Short | PrimitiveKind::Int => ValueKind::Int,
            PrimitiveKind::Long | PrimitiveKind::BigInteger => ValueKind::Long,
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::BigDecimal => {
                ValueKind::Double
            }
            PrimitiveKind::String => ValueKind::Str,
        }
    }

    /// The canonical primitive kind for a runtime value class.
    pub const fn from_value_kind(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Void => Some(PrimitiveKind::Void),
            ValueKind::Bool => Some(PrimitiveKind::Boolean),
            ValueKind::Byte => Some(PrimitiveKind::Byte),
            ValueKind::Char => Some(PrimitiveKind::Char),
            ValueKind::Int => Some(PrimitiveKind::Int),
            ValueKind::Long => Some(PrimitiveKind::Long),
            ValueKind::Double => Some(PrimitiveKind::Double),
            ValueKind::Str => Some(PrimitiveKind::String),
            ValueKind::Null | ValueKind::Seq | ValueKind::Map | ValueKind::Host => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
