//! Named references: instantiations, argument lists and indexes.

use std::fmt;

use crate::{Span, Value};

use super::Construction;

/// A possibly dotted name (`a.b.c`), stored as segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameRef {
    pub segments: Vec<String>,
}

impl NameRef {
    /// Split a dotted name into segments. Empty segments are dropped.
    pub fn parse(name: &str) -> Self {
        Self {
            segments: name
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn first(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    /// Everything after the first segment.
    pub fn rest(&self) -> &[String] {
        self.segments.get(1..).unwrap_or(&[])
    }
}

impl fmt::Display for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for NameRef {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// A supplied argument list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    pub items: Vec<Construction>,
    /// The arguments may be evaluated independently of one another.
    ///
    /// The resolver only carries this flag; scheduling is up to the runtime.
    pub concurrent: bool,
}

impl Arguments {
    pub fn new(items: Vec<Construction>) -> Self {
        Self {
            items,
            concurrent: false,
        }
    }

    pub fn concurrent(items: Vec<Construction>) -> Self {
        Self {
            items,
            concurrent: true,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Construction> {
        self.items.get(i)
    }
}

/// A single sequence-position or mapping-key selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    /// Already-resolved selector.
    Value(Value),
    /// Selector expression evaluated in the referencing scope.
    Deferred(Box<Construction>),
}

impl Index {
    pub fn position(i: i64) -> Self {
        Index::Value(Value::Long(i))
    }

    pub fn key(k: impl Into<String>) -> Self {
        Index::Value(Value::Str(k.into()))
    }
}

/// An unresolved reference: name, optional arguments and indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Instantiation {
    pub name: NameRef,
    pub args: Option<Arguments>,
    pub indexes: Vec<Index>,
    pub span: Span,
}

impl Instantiation {
    pub fn new(name: &str) -> Self {
        Self {
            name: NameRef::parse(name),
            args: None,
            indexes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_args(mut self, args: Vec<Construction>) -> Self {
        self.args = Some(Arguments::new(args));
        self
    }

    pub fn with_arguments(mut self, args: Arguments) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn arg_count(&self) -> usize {
        self.args.as_ref().map_or(0, Arguments::len)
    }
}

impl fmt::Display for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(args) = &self.args {
            write!(f, "({} args)", args.len())?;
        }
        for _ in &self.indexes {
            f.write_str("[..]")?;
        }
        Ok(())
    }
}
