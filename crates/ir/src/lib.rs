//! Logic-program IR shared by the fact extractor and the pattern compiler.
//!
//! A syntax tree is encoded as ground [`Fact`]s over a fixed set of
//! relations (module [`relations`]), and a compiled pattern becomes a
//! [`Rule`] whose body is a [`Literal`] tree. The IR's only job is a
//! deterministic, engine-loadable rendering: the same input always
//! produces the same text, and the tuple backend (module [`writer`])
//! produces the same fact set without round-tripping through text.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod schema;
pub mod writer;

pub use writer::{insert_fact, MemoryStore, RelationSink, SourceWriter, TupleValue, WriteError};

/// Relation names understood by the evaluation engine.
pub mod relations {
    /// `node_type(node, kind)` — one per node.
    pub const NODE_TYPE: &str = "node_type";
    /// `node_content(node, text)` — leaf node kinds only.
    pub const NODE_CONTENT: &str = "node_content";
    /// `parent_child(parent, index, child)` — positional children.
    pub const PARENT_CHILD: &str = "parent_child";
    /// `node_field(parent, child, field)` — named-field children.
    pub const NODE_FIELD: &str = "node_field";
    /// `node_location(node, [start_byte, start_row, start_col, end_row, end_col])`.
    pub const NODE_LOCATION: &str = "node_location";
    /// `rule_variable(root, name, occurrence)` — pattern variable joins.
    pub const RULE_VARIABLE: &str = "rule_variable";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// One argument of a literal or fact.
///
/// Ground facts carry only `Symbol`, `Unsigned` and `Record`; rule bodies
/// additionally use `Id` (a free logic variable) and `Wildcard`.
pub enum Element {
    Symbol(String),
    Unsigned(u32),
    Record(Vec<Element>),
    Id(String),
    Wildcard,
}

impl Element {
    pub fn symbol(value: impl Into<String>) -> Self {
        Element::Symbol(value.into())
    }

    /// Whether the element (recursively) contains no variables or wildcards.
    pub fn is_ground(&self) -> bool {
        match self {
            Element::Symbol(_) | Element::Unsigned(_) => true,
            Element::Record(inner) => inner.iter().all(Element::is_ground),
            Element::Id(_) | Element::Wildcard => false,
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Element::Symbol(s) => {
                out.push('"');
                for ch in s.chars() {
                    match ch {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        _ => out.push(ch),
                    }
                }
                out.push('"');
            }
            Element::Unsigned(v) => out.push_str(&v.to_string()),
            Element::Record(inner) => {
                out.push('[');
                render_list(inner, out);
                out.push(']');
            }
            Element::Id(name) => out.push_str(name),
            Element::Wildcard => out.push('_'),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out);
        f.write_str(&out)
    }
}

fn render_list(elements: &[Element], out: &mut String) {
    for (i, e) in elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        e.render(out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Comparison operator of a [`Literal::Constraint`].
pub enum CmpOp {
    Eq,
    Ne,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One body literal of a rule.
///
/// A rendered rule body is a single `Conjunction`; `Disjunction` and
/// `Constraint` nest only inside it.
pub enum Literal {
    Predicate {
        name: String,
        elements: Vec<Element>,
    },
    Negated {
        name: String,
        elements: Vec<Element>,
    },
    Conjunction(Vec<Literal>),
    Disjunction(Vec<Literal>),
    Constraint {
        left: Element,
        op: CmpOp,
        right: Element,
    },
}

impl Literal {
    pub fn predicate(name: &str, elements: Vec<Element>) -> Self {
        Literal::Predicate {
            name: name.to_string(),
            elements,
        }
    }

    pub fn negated(name: &str, elements: Vec<Element>) -> Self {
        Literal::Negated {
            name: name.to_string(),
            elements,
        }
    }

    /// Number of atoms (predicates, negations, constraints) in the literal,
    /// counting through conjunctions and disjunctions. Drives the pattern
    /// compiler's cost cap.
    pub fn atom_count(&self) -> usize {
        match self {
            Literal::Predicate { .. } | Literal::Negated { .. } | Literal::Constraint { .. } => 1,
            Literal::Conjunction(inner) | Literal::Disjunction(inner) => {
                inner.iter().map(Literal::atom_count).sum()
            }
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Literal::Predicate { name, elements } => {
                out.push_str(name);
                out.push('(');
                render_list(elements, out);
                out.push(')');
            }
            Literal::Negated { name, elements } => {
                out.push('!');
                out.push_str(name);
                out.push('(');
                render_list(elements, out);
                out.push(')');
            }
            Literal::Conjunction(inner) => {
                for (i, lit) in inner.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    lit.render(out);
                }
            }
            Literal::Disjunction(inner) => {
                out.push('(');
                for (i, lit) in inner.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    lit.render(out);
                }
                out.push(')');
            }
            Literal::Constraint { left, op, right } => {
                left.render(out);
                out.push(' ');
                out.push_str(op.as_str());
                out.push(' ');
                right.render(out);
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out);
        f.write_str(&out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One ground tuple of the fact base.
pub struct Fact {
    pub relation: String,
    pub elements: Vec<Element>,
}

impl Fact {
    pub fn new(relation: &str, elements: Vec<Element>) -> Self {
        Self {
            relation: relation.to_string(),
            elements,
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        out.push_str(&self.relation);
        out.push('(');
        render_list(&self.elements, &mut out);
        out.push_str(").");
        f.write_str(&out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A compiled implication: `name(head...) :- body.`
pub struct Rule {
    pub name: String,
    pub head: Vec<Element>,
    pub body: Literal,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        out.push_str(&self.name);
        out.push('(');
        render_list(&self.head, &mut out);
        out.push_str(") :- ");
        self.body.render(&mut out);
        out.push('.');
        f.write_str(&out)
    }
}
