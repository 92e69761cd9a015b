//! Writer backends for the IR.
//!
//! [`SourceWriter`] accumulates engine-loadable source text, one
//! statement per line. [`RelationSink`] is the in-process tuple ABI
//! (open tuple, write each column, insert) used for bulk fact loading
//! without round-tripping through the engine's text parser;
//! [`MemoryStore`] implements it for tests and for callers that batch
//! tuples before handing them to a live engine. Both backends must
//! yield the same fact set for the same IR input.

use crate::{schema, Element, Fact, Rule};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug)]
pub enum WriteError {
    /// A rule element (variable or wildcard) appeared in a ground fact.
    Unground(String),
    /// A column was written with no tuple open.
    NoOpenTuple,
    /// `open` was called while a tuple was still pending.
    TupleAlreadyOpen(String),
    /// Inserted tuple width does not match the declared schema.
    Arity {
        relation: String,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Unground(el) => write!(f, "non-ground element in fact: {el}"),
            WriteError::NoOpenTuple => write!(f, "column written with no open tuple"),
            WriteError::TupleAlreadyOpen(rel) => {
                write!(f, "tuple for relation {rel} still open")
            }
            WriteError::Arity {
                relation,
                expected,
                got,
            } => write!(
                f,
                "relation {relation} expects {expected} columns, got {got}"
            ),
        }
    }
}

impl std::error::Error for WriteError {}

/// Accumulates rule/fact declarations as engine-loadable source text.
pub struct SourceWriter {
    out: String,
    declared: HashSet<String>,
    outputs: HashSet<String>,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            declared: HashSet::new(),
            outputs: HashSet::new(),
        }
    }

    /// Starts the output with the base relation declarations.
    pub fn with_schema() -> Self {
        let mut w = Self::new();
        w.out = schema::declarations();
        for (name, _) in schema::base_relations() {
            w.declared.insert(name.to_string());
        }
        w
    }

    /// Writes one ground fact as `relation(args...).`.
    pub fn write_fact(&mut self, fact: &Fact) -> Result<(), WriteError> {
        for e in &fact.elements {
            if !e.is_ground() {
                return Err(WriteError::Unground(e.to_string()));
            }
        }
        self.out.push_str(&fact.to_string());
        self.out.push('\n');
        Ok(())
    }

    /// Writes a rule, declaring its head relation on first use. Column
    /// types are inferred from the head elements: symbols as `symbol`,
    /// everything node- or index-valued as `unsigned`.
    pub fn write_rule(&mut self, rule: &Rule) {
        if !self.declared.contains(&rule.name) {
            self.out.push_str(".decl ");
            self.out.push_str(&rule.name);
            self.out.push('(');
            for (i, e) in rule.head.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                let ty = match e {
                    Element::Symbol(_) => "symbol",
                    _ => "unsigned",
                };
                self.out.push_str(&format!("a{i}: {ty}"));
            }
            self.out.push_str(")\n");
            self.declared.insert(rule.name.clone());
        }
        if !self.outputs.contains(&rule.name) {
            self.out.push_str(".output ");
            self.out.push_str(&rule.name);
            self.out.push('\n');
            self.outputs.insert(rule.name.clone());
        }
        self.out.push_str(&rule.to_string());
        self.out.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Default for SourceWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// One typed column value of an inserted tuple.
pub enum TupleValue {
    Symbol(String),
    Unsigned(u32),
    Record(Vec<TupleValue>),
}

/// Tuple-insertion ABI of a relation handle: open a tuple, write each
/// element in declared column order, then insert. Implementations map
/// this onto the engine's native interface.
pub trait RelationSink {
    fn open(&mut self, relation: &str) -> Result<(), WriteError>;
    fn write_symbol(&mut self, value: &str) -> Result<(), WriteError>;
    fn write_unsigned(&mut self, value: u32) -> Result<(), WriteError>;
    fn write_record(&mut self, values: Vec<TupleValue>) -> Result<(), WriteError>;
    fn insert(&mut self) -> Result<(), WriteError>;
}

/// Packs one ground fact into a sink tuple.
pub fn insert_fact<S: RelationSink + ?Sized>(sink: &mut S, fact: &Fact) -> Result<(), WriteError> {
    sink.open(&fact.relation)?;
    for e in &fact.elements {
        write_element(sink, e)?;
    }
    sink.insert()
}

fn write_element<S: RelationSink + ?Sized>(sink: &mut S, e: &Element) -> Result<(), WriteError> {
    match e {
        Element::Symbol(s) => sink.write_symbol(s),
        Element::Unsigned(v) => sink.write_unsigned(*v),
        Element::Record(inner) => {
            let mut values = Vec::with_capacity(inner.len());
            for el in inner {
                values.push(element_value(el)?);
            }
            sink.write_record(values)
        }
        other => Err(WriteError::Unground(other.to_string())),
    }
}

fn element_value(e: &Element) -> Result<TupleValue, WriteError> {
    match e {
        Element::Symbol(s) => Ok(TupleValue::Symbol(s.clone())),
        Element::Unsigned(v) => Ok(TupleValue::Unsigned(*v)),
        Element::Record(inner) => {
            let mut values = Vec::with_capacity(inner.len());
            for el in inner {
                values.push(element_value(el)?);
            }
            Ok(TupleValue::Record(values))
        }
        other => Err(WriteError::Unground(other.to_string())),
    }
}

#[derive(Default)]
/// In-memory relation store implementing the tuple ABI.
pub struct MemoryStore {
    schemas: HashMap<String, usize>,
    rows: HashMap<String, Vec<Vec<TupleValue>>>,
    open: Option<(String, Vec<TupleValue>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a relation with a fixed column count. Inserts into a
    /// declared relation are arity-checked; undeclared relations accept
    /// any width.
    pub fn declare(&mut self, relation: &str, arity: usize) {
        self.schemas.insert(relation.to_string(), arity);
    }

    pub fn rows(&self, relation: &str) -> &[Vec<TupleValue>] {
        self.rows.get(relation).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn relation_names(&self) -> Vec<&str> {
        self.rows.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RelationSink for MemoryStore {
    fn open(&mut self, relation: &str) -> Result<(), WriteError> {
        if let Some((rel, _)) = &self.open {
            return Err(WriteError::TupleAlreadyOpen(rel.clone()));
        }
        self.open = Some((relation.to_string(), Vec::new()));
        Ok(())
    }

    fn write_symbol(&mut self, value: &str) -> Result<(), WriteError> {
        self.push_value(TupleValue::Symbol(value.to_string()))
    }

    fn write_unsigned(&mut self, value: u32) -> Result<(), WriteError> {
        self.push_value(TupleValue::Unsigned(value))
    }

    fn write_record(&mut self, values: Vec<TupleValue>) -> Result<(), WriteError> {
        self.push_value(TupleValue::Record(values))
    }

    fn insert(&mut self) -> Result<(), WriteError> {
        let (relation, tuple) = self.open.take().ok_or(WriteError::NoOpenTuple)?;
        if let Some(&arity) = self.schemas.get(&relation) {
            if tuple.len() != arity {
                return Err(WriteError::Arity {
                    relation,
                    expected: arity,
                    got: tuple.len(),
                });
            }
        }
        self.rows.entry(relation).or_default().push(tuple);
        Ok(())
    }
}

impl MemoryStore {
    fn push_value(&mut self, value: TupleValue) -> Result<(), WriteError> {
        match &mut self.open {
            Some((_, tuple)) => {
                tuple.push(value);
                Ok(())
            }
            None => Err(WriteError::NoOpenTuple),
        }
    }
}
