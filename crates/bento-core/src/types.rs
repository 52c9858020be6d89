//! Type expressions.
//!
//! A [`Type`] names a definition or primitive, optionally wrapped in one or
//! more dimension markers (`int[]`, `name{}`), optionally bound directly to a
//! definition handle, and optionally carrying arguments that disambiguate
//! overloaded type aliases.
//!
//! # Example
//!
//! ```
//! use bento_core::{PrimitiveKind, Type};
//!
//! let ints = Type::primitive(PrimitiveKind::Int).sequence();
//! assert!(ints.is_array());
//! assert_eq!(ints.base_type(), Type::primitive(PrimitiveKind::Int));
//! ```

use std::fmt;

use crate::{
    Construction, DefId, Mapping, PrimitiveKind, Redirection, Sequence, SequenceKind, Value,
};

/// Shape of one dimension layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimKind {
    Sequence,
    Mapping,
}

/// One dimension marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Dim {
    pub kind: DimKind,
    /// Definite size expression; `None` means growable.
    pub size: Option<Box<Construction>>,
}

impl Dim {
    pub fn sequence() -> Self {
        Self {
            kind: DimKind::Sequence,
            size: None,
        }
    }

    pub fn fixed(size: usize) -> Self {
        Self {
            kind: DimKind::Sequence,
            size: Some(Box::new(Construction::Literal(Value::Long(size as i64)))),
        }
    }

    pub fn mapping() -> Self {
        Self {
            kind: DimKind::Mapping,
            size: None,
        }
    }

    pub fn is_growable(&self) -> bool {
        self.size.is_none()
    }
}

/// A type expression.
#[derive(Debug, Clone, Default)]
pub struct Type {
    /// Type name; empty for the default (untyped) type.
    pub name: String,
    /// Dimension layers, outermost first.
    pub dims: Vec<Dim>,
    /// Definition this type is bound to, when already known.
    pub definition: Option<DefId>,
    /// Definition in which the type expression appears; name lookup starts here.
    pub owner: Option<DefId>,
    /// Arguments used to pick among overloaded type aliases.
    pub args: Vec<Construction>,
}

impl Type {
    /// The default type of an untyped parameter.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::named(kind.name())
    }

    pub fn void() -> Self {
        Self::primitive(PrimitiveKind::Void)
    }

    /// A type naming `def`, looked up from `owner`.
    pub fn bound(name: impl Into<String>, def: DefId) -> Self {
        Self {
            name: name.into(),
            definition: Some(def),
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: DefId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_args(mut self, args: Vec<Construction>) -> Self {
        self.args = args;
        self
    }

    pub fn with_dim(mut self, dim: Dim) -> Self {
        self.dims.insert(0, dim);
        self
    }

    /// Wrap in a growable sequence layer.
    pub fn sequence(self) -> Self {
        self.with_dim(Dim::sequence())
    }

    /// Wrap in a mapping layer.
    pub fn mapping(self) -> Self {
        self.with_dim(Dim::mapping())
    }

    /// The type with its outermost dimension layer stripped.
    pub fn base_type(&self) -> Type {
        let mut base = self.clone();
        if !base.dims.is_empty() {
            base.dims.remove(0);
        }
        base
    }

    /// The type with every dimension layer stripped.
    pub fn element_root(&self) -> Type {
        Type {
            dims: Vec::new(),
            ..self.clone()
        }
    }

    pub fn is_untyped(&self) -> bool {
        self.name.is_empty() && self.dims.is_empty() && self.definition.is_none()
    }

    pub fn is_void(&self) -> bool {
        self.dims.is_empty() && self.name == PrimitiveKind::Void.name()
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        if self.dims.is_empty() {
            PrimitiveKind::from_name(&self.name)
        } else {
            None
        }
    }

    pub fn has_dims(&self) -> bool {
        !self.dims.is_empty()
    }

    /// Collection shape from explicit dimensions only.
    pub fn is_array(&self) -> bool {
        self.dims.first().is_some_and(|d| d.kind == DimKind::Sequence)
    }

    /// Collection shape from explicit dimensions only.
    pub fn is_table(&self) -> bool {
        self.dims.first().is_some_and(|d| d.kind == DimKind::Mapping)
    }

    /// Arguments that are named references and therefore must be matched.
    pub fn required_args(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter_map(|a| a.as_instantiation())
            .map(|inst| inst.name.first())
    }

    /// Structural identity: equal name, arguments and dimension shape.
    ///
    /// Bound definitions must agree when both sides carry one.
    pub fn is_identical(&self, other: &Type) -> bool {
        if self.name != other.name || self.args != other.args {
            return false;
        }
        if self.dims.len() != other.dims.len()
            || self.dims.iter().zip(&other.dims).any(|(a, b)| a.kind != b.kind)
        {
            return false;
        }
        match (self.definition, other.definition) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Convert `value` to this type.
    ///
    /// Collections convert element-wise through the dimension layers; untyped
    /// and non-primitive types accept the value unchanged. Integers outside
    /// the target's range fail to convert.
    pub fn convert(&self, value: Value) -> Result<Value, Redirection> {
        if let Some(dim) = self.dims.first() {
            let base = self.base_type();
            return match (dim.kind, value) {
                (DimKind::Sequence, Value::Seq(seq)) => {
                    let items = seq
                        .items
                        .into_iter()
                        .map(|v| base.convert(v))
                        .collect::<Result<Vec<_>, _>>()?;
                    let kind = if dim.is_growable() {
                        seq.kind
                    } else {
                        SequenceKind::Array
                    };
                    Ok(Value::Seq(Sequence { kind, items }))
                }
                (DimKind::Mapping, Value::Map(map)) => {
                    let converted = map
                        .into_iter()
                        .map(|(k, v)| base.convert(v).map(|v| (k, v)))
                        .collect::<Result<Mapping, _>>()?;
                    Ok(Value::Map(converted))
                }
                (_, v) if v.is_empty_value() => Ok(v),
                (_, v) => Err(self.conversion_error(&v)),
            };
        }

        let Some(kind) = self.primitive_kind() else {
            return Ok(value);
        };
        if value.is_empty_value() {
            return Ok(value);
        }
        let converted = match kind {
            PrimitiveKind::Void => Some(Value::Void),
            PrimitiveKind::Boolean => Some(Value::Bool(value.is_true())),
            PrimitiveKind::Byte => value
                .as_i64()
                .and_then(|i| u8::try_from(i).ok())
                .map(Value::Byte),
            PrimitiveKind::Char => match &value {
                Value::Char(c) => Some(Value::Char(*c)),
                Value::Str(s) if s.chars().count() == 1 => s.chars().next().map(Value::Char),
                other => other
                    .as_i64()
                    .and_then(|i| u32::try_from(i).ok())
                    .and_then(char::from_u32)
                    .map(Value::Char),
            },
            PrimitiveKind::Short => value
                .as_i64()
                .and_then(|i| i16::try_from(i).ok())
                .map(|i| Value::Int(i.into())),
            PrimitiveKind::Int => value
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Value::Int),
            PrimitiveKind::Long | PrimitiveKind::BigInteger => value.as_i64().map(Value::Long),
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::BigDecimal => {
                value.as_f64().map(Value::Double)
            }
            PrimitiveKind::String => Some(Value::Str(value.to_string())),
        };
        converted.ok_or_else(|| self.conversion_error(&value))
    }

    fn conversion_error(&self, value: &Value) -> Redirection {
        Redirection::new(
            Redirection::STATUS_SERVER_ERROR,
            self.to_string(),
            Some(format!("cannot convert {} value to {self}", value.kind())),
        )
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str("?")?;
        } else {
            f.write_str(&self.name)?;
        }
        for dim in &self.dims {
            match dim.kind {
                DimKind::Sequence => f.write_str("[]")?,
                DimKind::Mapping => f.write_str("{}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_requires_equal_dimensions() {
        let int = Type::primitive(PrimitiveKind::Int);
        assert_eq!(int, Type::primitive(PrimitiveKind::Int));
        assert_ne!(int, int.clone().sequence());
        assert_ne!(int.clone().sequence(), int.clone().mapping());
    }

    #[test]
    fn bound_definitions_must_agree() {
        let a = Type::bound("w", DefId::new(1));
        let b = Type::bound("w", DefId::new(2));
        assert_ne!(a, b);
        assert_eq!(a, Type::named("w"));
    }

    #[test]
    fn base_type_strips_outer_layer() {
        let t = Type::named("cell").sequence().mapping();
        assert!(t.is_table());
        assert!(t.base_type().is_array());
        assert!(!t.base_type().base_type().has_dims());
    }

    #[test]
    fn convert_numeric_scalars() {
        let double = Type::primitive(PrimitiveKind::Double);
        assert_eq!(double.convert(Value::Int(3)), Ok(Value::Double(3.0)));
        let int = Type::primitive(PrimitiveKind::Int);
        assert_eq!(int.convert(Value::str("42")), Ok(Value::Int(42)));
        assert!(int.convert(Value::str("forty")).is_err());
    }

    #[test]
    fn out_of_range_integers_fail_to_convert() {
        let byte = Type::primitive(PrimitiveKind::Byte);
        assert_eq!(byte.convert(Value::Int(255)), Ok(Value::Byte(255)));
        assert!(byte.convert(Value::Int(300)).is_err());
        assert!(byte.convert(Value::Int(-1)).is_err());
        let short = Type::primitive(PrimitiveKind::Short);
        assert!(short.convert(Value::Int(40_000)).is_err());
        let int = Type::primitive(PrimitiveKind::Int);
        assert_eq!(int.convert(Value::Long(7)), Ok(Value::Int(7)));
        assert!(int.convert(Value::Long(1 << 40)).is_err());
    }

    #[test]
    fn convert_sequences_element_wise() {
        let t = Type::primitive(PrimitiveKind::String).sequence();
        let v = t.convert(Value::list([Value::Int(1), Value::Bool(true)]));
        assert_eq!(v, Ok(Value::list([Value::str("1"), Value::str("true")])));
        assert!(t.convert(Value::Int(1)).is_err());
    }

    #[test]
    fn untyped_accepts_anything() {
        let t = Type::untyped();
        assert!(t.is_untyped());
        assert_eq!(t.convert(Value::Char('x')), Ok(Value::Char('x')));
    }

    #[test]
    fn display_with_dims() {
        assert_eq!(Type::named("row").sequence().to_string(), "row[]");
        assert_eq!(Type::untyped().to_string(), "?");
    }
}
