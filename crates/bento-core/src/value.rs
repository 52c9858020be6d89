//! Runtime values.
//!
//! A [`Value`] is either a tagged scalar or a materialized collection.
//! Lazily-resolved collections live in the resolver; once materialized they
//! become [`Sequence`] or [`Mapping`] values.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;
use xxhash_rust::xxh64::Xxh64;

/// Runtime value classes.
///
/// This closed enum replaces introspection of host classes: promotion and
/// assignability are driven by static tables keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Void,
    Null,
    Bool,
    Byte,
    Char,
    Int,
    Long,
    Double,
    Str,
    Seq,
    Map,
    Host,
}

impl ValueKind {
    /// Numeric promotion rank (ascending: boolean < byte < char < int < long < double).
    pub const fn promotion_rank(self) -> Option<u8> {
        match self {
            ValueKind::Bool => Some(0),
            ValueKind::Byte => Some(1),
            ValueKind::Char => Some(2),
            ValueKind::Int => Some(3),
            ValueKind::Long => Some(4),
            ValueKind::Double => Some(5),
            _ => None,
        }
    }

    /// Inverse of [`promotion_rank`](Self::promotion_rank).
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(ValueKind::Bool),
            1 => Some(ValueKind::Byte),
            2 => Some(ValueKind::Char),
            3 => Some(ValueKind::Int),
            4 => Some(ValueKind::Long),
            5 => Some(ValueKind::Double),
            _ => None,
        }
    }

    /// Whether a slot of this class accepts values of class `other`.
    pub fn is_assignable_from(self, other: ValueKind) -> bool {
        self == other || (self == ValueKind::Str && other == ValueKind::Char)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Void => "void",
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Byte => "byte",
            ValueKind::Char => "char",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Double => "double",
            ValueKind::Str => "string",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "mapping",
            ValueKind::Host => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage shape of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SequenceKind {
    /// Pre-sized raw array.
    Array,
    /// Growable list.
    #[default]
    List,
}

/// A materialized sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub kind: SequenceKind,
    pub items: Vec<Value>,
}

impl Sequence {
    pub fn list(items: Vec<Value>) -> Self {
        Self {
            kind: SequenceKind::List,
            items,
        }
    }

    pub fn array(items: Vec<Value>) -> Self {
        Self {
            kind: SequenceKind::Array,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A materialized mapping, ordered by key.
pub type Mapping = BTreeMap<String, Value>;

/// An opaque host object bound into the definition graph.
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    /// Host class name, used only for display and error messages.
    pub class_name: String,
    /// The host value as seen by Bento code.
    pub value: Box<Value>,
}

/// A Bento runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Void,
    Null,
    Bool(bool),
    Byte(u8),
    Char(char),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    Seq(Sequence),
    Map(Mapping),
    Host(HostObject),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Void => ValueKind::Void,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Byte(_) => ValueKind::Byte,
            Value::Char(_) => ValueKind::Char,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::Str(_) => ValueKind::Str,
            Value::Seq(_) => ValueKind::Seq,
            Value::Map(_) => ValueKind::Map,
            Value::Host(_) => ValueKind::Host,
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Seq(Sequence::list(items.into_iter().collect()))
    }

    pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Seq(Sequence::array(items.into_iter().collect()))
    }

    pub fn map<K: Into<String>, I: IntoIterator<Item = (K, Value)>>(entries: I) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Void or null: nothing was produced.
    pub fn is_empty_value(&self) -> bool {
        matches!(self, Value::Void | Value::Null)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Map(_))
    }

    /// Truthiness used by conditionals and generator filters.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Void | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Byte(b) => *b != 0,
            Value::Char(c) => *c != '\0',
            Value::Int(i) => *i != 0,
            Value::Long(l) => *l != 0,
            Value::Double(d) => *d != 0.0,
            Value::Str(s) => !s.is_empty() && s != "false",
            Value::Seq(s) => !s.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Host(h) => h.value.is_true(),
        }
    }

    /// Integral view of a scalar, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Byte(b) => Some(*b as i64),
            Value::Char(c) => Some(*c as i64),
            Value::Int(i) => Some(*i as i64),
            Value::Long(l) => Some(*l),
            Value::Double(d) => Some(*d as i64),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Host(h) => h.value.as_i64(),
            _ => None,
        }
    }

    /// Floating-point view of a scalar, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Host(h) => h.value.as_f64(),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Number of elements of a collection; scalars count as one, nothing as zero.
    pub fn count(&self) -> usize {
        match self {
            Value::Void | Value::Null => 0,
            Value::Seq(s) => s.len(),
            Value::Map(m) => m.len(),
            _ => 1,
        }
    }

    /// Key used when this value selects a mapping entry.
    pub fn as_key(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Stable 64-bit fingerprint, used to key caches by argument values.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Void | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Byte(b) => b.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Long(l) => l.hash(state),
            Value::Double(d) => OrderedFloat(*d).hash(state),
            Value::Str(s) => s.hash(state),
            Value::Seq(s) => {
                s.kind.hash(state);
                s.items.hash(state);
            }
            Value::Map(m) => {
                for (k, v) in m {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Host(h) => {
                h.class_name.hash(state);
                h.value.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void | Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Byte(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Str(s) => f.write_str(s),
            Value::Seq(s) => {
                f.write_str("[")?;
                for (i, item) in s.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Host(h) => write!(f, "{}", h.value),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_ranks_ascend() {
        let order = [
            ValueKind::Bool,
            ValueKind::Byte,
            ValueKind::Char,
            ValueKind::Int,
            ValueKind::Long,
            ValueKind::Double,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].promotion_rank() < pair[1].promotion_rank());
        }
        assert_eq!(ValueKind::Str.promotion_rank(), None);
        assert_eq!(ValueKind::from_rank(3), Some(ValueKind::Int));
    }

    #[test]
    fn display_of_collections() {
        let v = Value::list([Value::Int(1), Value::str("a")]);
        assert_eq!(v.to_string(), "[1, a]");
        let m = Value::map([("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert_eq!(m.to_string(), "{x: 1, y: 2}");
    }

    #[test]
    fn count_classifies_shapes() {
        assert_eq!(Value::Void.count(), 0);
        assert_eq!(Value::Int(4).count(), 1);
        assert_eq!(Value::list([Value::Int(1), Value::Int(2)]).count(), 2);
    }

    #[test]
    fn fingerprint_is_deterministic_and_discriminating() {
        assert_eq!(Value::Double(2.5).fingerprint(), Value::Double(2.5).fingerprint());
        assert_ne!(Value::Int(1).fingerprint(), Value::Long(1).fingerprint());
    }

    #[test]
    fn truthiness() {
        assert!(Value::Bool(true).is_true());
        assert!(!Value::str("false").is_true());
        assert!(!Value::Null.is_true());
        assert!(Value::Int(-1).is_true());
    }
}
