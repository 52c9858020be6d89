//! Constructions: the expressions a definition body is made of.

use crate::Value;

use super::{BinaryOp, Index, Instantiation};

/// A comprehension-like generator producing collection elements.
///
/// `for var in source [where filter]: body`. A body that is itself a
/// generator is flattened into the enclosing one.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub var: String,
    pub source: Box<Construction>,
    pub filter: Option<Box<Construction>>,
    pub body: Box<Construction>,
}

impl Generator {
    pub fn new(var: impl Into<String>, source: Construction, body: Construction) -> Self {
        Self {
            var: var.into(),
            source: Box::new(source),
            filter: None,
            body: Box::new(body),
        }
    }

    pub fn with_filter(mut self, filter: Construction) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

/// A catch clause of a guarded block.
///
/// A `location` tag intercepts only redirections to that location; a
/// tag-less catch intercepts every fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    pub location: Option<String>,
    pub handler: Construction,
}

impl Catch {
    pub fn tagged(location: impl Into<String>, handler: Construction) -> Self {
        Self {
            location: Some(location.into()),
            handler,
        }
    }

    pub fn all(handler: Construction) -> Self {
        Self {
            location: None,
            handler,
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    /// A literal scalar or collection value.
    Literal(Value),
    /// The `null` literal.
    Null,
    /// A deliberately missing argument.
    Missing,
    /// A named reference.
    Instantiation(Instantiation),
    /// A binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Construction>,
        right: Box<Construction>,
    },
    /// `if condition then [else otherwise]`.
    Conditional {
        condition: Box<Construction>,
        then: Box<Construction>,
        otherwise: Option<Box<Construction>>,
    },
    /// A sequence literal whose elements are constructions.
    Seq(Vec<Construction>),
    /// A mapping literal whose values are constructions.
    Map(Vec<(String, Construction)>),
    /// A generator (comprehension) producing a sequence.
    Generator(Generator),
    /// A block: the outputs of its items are concatenated.
    Block(Vec<Construction>),
    /// A body with catch clauses.
    Guarded {
        body: Box<Construction>,
        catches: Vec<Catch>,
    },
    /// An explicit redirect.
    Redirect { location: String },
    /// Instantiate the supertype of the definition being constructed.
    Super,
}

impl Construction {
    pub fn int(i: i32) -> Self {
        Construction::Literal(Value::Int(i))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Construction::Literal(Value::Str(s.into()))
    }

    pub fn value(v: impl Into<Value>) -> Self {
        Construction::Literal(v.into())
    }

    /// A reference without arguments.
    pub fn reference(name: &str) -> Self {
        Construction::Instantiation(Instantiation::new(name))
    }

    /// A reference with arguments.
    pub fn call(name: &str, args: Vec<Construction>) -> Self {
        Construction::Instantiation(Instantiation::new(name).with_args(args))
    }

    /// A reference with one index.
    pub fn indexed(name: &str, index: Index) -> Self {
        Construction::Instantiation(Instantiation::new(name).with_index(index))
    }

    pub fn binary(op: BinaryOp, left: Construction, right: Construction) -> Self {
        Construction::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn as_instantiation(&self) -> Option<&Instantiation> {
        match self {
            Construction::Instantiation(inst) => Some(inst),
            _ => None,
        }
    }

    /// Null literal or deliberately-missing marker.
    pub fn is_null_or_missing(&self) -> bool {
        matches!(self, Construction::Null | Construction::Missing)
    }

    /// Names referenced anywhere inside this construction (first segments).
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    /// Whether `name` is referenced anywhere inside this construction.
    pub fn contains_name(&self, name: &str) -> bool {
        self.referenced_names().contains(&name)
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Construction::Instantiation(inst) => {
                out.push(inst.name.first());
                if let Some(args) = &inst.args {
                    for arg in &args.items {
                        arg.collect_names(out);
                    }
                }
                for index in &inst.indexes {
                    if let Index::Deferred(c) = index {
                        c.collect_names(out);
                    }
                }
            }
            Construction::Binary { left, right, .. } => {
                left.collect_names(out);
                right.collect_names(out);
            }
            Construction::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_names(out);
                then.collect_names(out);
                if let Some(o) = otherwise {
                    o.collect_names(out);
                }
            }
            Construction::Seq(items) | Construction::Block(items) => {
                for item in items {
                    item.collect_names(out);
                }
            }
            Construction::Map(entries) => {
                for (_, item) in entries {
                    item.collect_names(out);
                }
            }
            Construction::Generator(generator) => {
                generator.source.collect_names(out);
                if let Some(f) = &generator.filter {
                    f.collect_names(out);
                }
                generator.body.collect_names(out);
            }
            Construction::Guarded { body, catches } => {
                body.collect_names(out);
                for c in catches {
                    c.handler.collect_names(out);
                }
            }
            Construction::Literal(_)
            | Construction::Null
            | Construction::Missing
            | Construction::Redirect { .. }
            | Construction::Super => {}
        }
    }
}

impl From<Value> for Construction {
    fn from(v: Value) -> Self {
        Construction::Literal(v)
    }
}

impl From<Instantiation> for Construction {
    fn from(inst: Instantiation) -> Self {
        Construction::Instantiation(inst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_containment_searches_sub_expressions() {
        let c = Construction::binary(
            BinaryOp::Add,
            Construction::int(1),
            Construction::call("f", vec![Construction::reference("x.y")]),
        );
        assert!(c.contains_name("f"));
        assert!(c.contains_name("x"));
        assert!(!c.contains_name("y"));
    }

    #[test]
    fn literals_reference_nothing() {
        assert!(Construction::str("a").referenced_names().is_empty());
        assert!(Construction::Null.is_null_or_missing());
        assert!(Construction::Missing.is_null_or_missing());
    }
}
