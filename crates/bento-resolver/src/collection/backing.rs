//! Backing stores of collection instances.

use std::collections::BTreeMap;

use bento_core::{DimKind, Redirection, Sequence, SequenceKind, Value};

use super::Element;
use super::subcollection::SubBacking;

/// Pre-sized, updated in place, never grows.
#[derive(Debug, Clone, Default)]
pub struct FixedBacking {
    items: Vec<Element>,
}

impl FixedBacking {
    /// `size` empty (null) slots.
    pub fn new(size: usize) -> Self {
        Self {
            items: vec![Element::Value(Value::Null); size],
        }
    }

    /// Replace slot `index`. Returns false, leaving the store untouched, when
    /// the index is out of range.
    pub fn set(&mut self, index: usize, element: Element) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.items.iter()
    }
}

/// Append-only.
#[derive(Debug, Clone, Default)]
pub struct GrowableBacking {
    items: Vec<Element>,
}

impl GrowableBacking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.items.push(element);
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.items.iter()
    }
}

/// Keyed store of a mapping, iterated in key order.
#[derive(Debug, Clone, Default)]
pub struct TableBacking {
    entries: BTreeMap<String, Element>,
}

impl TableBacking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, element: Element) {
        self.entries.insert(key.into(), element);
    }

    pub fn get(&self, key: &str) -> Option<&Element> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Element)> {
        self.entries.iter()
    }
}

/// Materialized output of a generator.
#[derive(Debug, Clone)]
pub struct GeneratedBacking {
    pub items: Vec<Value>,
    pub kind: SequenceKind,
}

#[derive(Debug, Clone)]
pub enum Backing {
    Fixed(FixedBacking),
    Growable(GrowableBacking),
    Table(TableBacking),
    /// Thin adapter over a host array.
    ExternalFixed(Sequence),
    /// Thin adapter over a host list.
    ExternalGrowable(Sequence),
    Generated(GeneratedBacking),
    Sub(Box<SubBacking>),
}

impl Backing {
    /// Adapt a host value of the expected shape.
    pub fn from_value(name: &str, kind: DimKind, value: Value) -> Result<Self, Redirection> {
        match (kind, value) {
            (DimKind::Sequence, Value::Seq(seq)) => Ok(match seq.kind {
                SequenceKind::Array => Backing::ExternalFixed(seq),
                SequenceKind::List => Backing::ExternalGrowable(seq),
            }),
            (DimKind::Mapping, Value::Map(map)) => {
                let mut table = TableBacking::new();
                for (key, value) in map {
                    table.insert(key, Element::Value(value));
                }
                Ok(Backing::Table(table))
            }
            (DimKind::Sequence, v) if v.is_empty_value() => Ok(Backing::Growable(GrowableBacking::new())),
            (DimKind::Mapping, v) if v.is_empty_value() => Ok(Backing::Table(TableBacking::new())),
            (kind, v) => Err(Redirection::unsupported_collection(
                name,
                format!("expected a {} but found a {} value", kind_name(kind), v.kind()),
            )),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Backing::Fixed(b) => b.len(),
            Backing::Growable(b) => b.len(),
            Backing::Table(b) => b.len(),
            Backing::ExternalFixed(s) | Backing::ExternalGrowable(s) => s.len(),
            Backing::Generated(g) => g.items.len(),
            Backing::Sub(sub) => sub.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn kind_name(kind: DimKind) -> &'static str {
    match kind {
        DimKind::Sequence => "sequence",
        DimKind::Mapping => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_sets_only_in_range() {
        let mut fixed = FixedBacking::new(2);
        assert!(fixed.set(1, Element::Value(Value::Int(5))));
        assert!(!fixed.set(2, Element::Value(Value::Int(6))));
        assert_eq!(fixed.len(), 2);
        assert!(matches!(fixed.get(0), Some(Element::Value(Value::Null))));
        assert!(matches!(fixed.get(1), Some(Element::Value(Value::Int(5)))));
    }

    #[test]
    fn growable_appends() {
        let mut growable = GrowableBacking::new();
        growable.push(Element::Value(Value::Int(1)));
        growable.push(Element::Value(Value::Int(2)));
        assert_eq!(growable.len(), 2);
        assert!(matches!(growable.get(1), Some(Element::Value(Value::Int(2)))));
    }

    #[test]
    fn host_values_pick_their_adapter() {
        let array = Backing::from_value("a", DimKind::Sequence, Value::array([Value::Int(1)])).unwrap();
        assert!(matches!(array, Backing::ExternalFixed(_)));
        let list = Backing::from_value("l", DimKind::Sequence, Value::list([Value::Int(1)])).unwrap();
        assert!(matches!(list, Backing::ExternalGrowable(_)));
        let table = Backing::from_value("t", DimKind::Mapping, Value::map([("k", Value::Int(1))])).unwrap();
        assert_eq!(table.len(), 1);
        let err = Backing::from_value("s", DimKind::Mapping, Value::Int(1)).unwrap_err();
        assert_eq!(err.status, 500);
    }
}
