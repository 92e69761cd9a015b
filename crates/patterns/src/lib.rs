//! Compiles pattern snippets into logic-program rules.
//!
//! A pattern is a code fragment in which placeholder tokens stand for
//! author-declared variables. The snippet is parsed with the target
//! language's grammar, and a single pruning walk over the resulting
//! tree emits one body literal per structural constraint: node kinds,
//! leaf content, parent links, absent named fields, and per-kind
//! canonicalizations that make equivalent surface spellings match the
//! same rule. The head fires with the rule's identity and the bound
//! root node; auxiliary `rule_variable` rules recover which matched
//! node corresponds to which declared variable.

mod canonical;

use canonical::CanonicalRules;
use ir::{relations, Element, Literal, Rule, SourceWriter};
use parsers::{IdAllocator, Language, NodeId, Step};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use tree_sitter::Node;

/// Placeholder name that matches any subtree without recording a
/// binding.
pub const ANY_VARIABLE: &str = "_";

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on body atoms per compiled rule; patterns over the
    /// cap are skipped with a diagnostic, as a cost control on the
    /// evaluation engine.
    pub max_literals: usize,
    /// Also emit shared-content joins forcing repeated occurrences of
    /// one variable to carry equal literal text. Off by default: the
    /// join only constrains occurrences that are content-bearing
    /// leaves.
    pub enforce_variable_equality: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_literals: 20,
            enforce_variable_equality: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A declared pattern variable and the synthetic token substituted for
/// it in the snippet before parsing.
pub struct PatternVariable {
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One pattern of one rule, ready to compile.
pub struct PatternSource {
    pub rule: String,
    /// Position within the rule's alternative patterns.
    pub index: u32,
    pub snippet: String,
    pub variables: Vec<PatternVariable>,
}

#[derive(Debug)]
pub enum CompileError {
    /// The grammar rejected the snippet.
    Parse(String),
    /// The snippet does not reduce to exactly one top-level node.
    Shape(String),
    /// The compiled body exceeds the configured literal cap.
    Capacity { literals: usize, max: usize },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(msg) => write!(f, "pattern does not parse: {msg}"),
            CompileError::Shape(msg) => write!(f, "invalid pattern shape: {msg}"),
            CompileError::Capacity { literals, max } => {
                write!(f, "pattern compiles to {literals} literals, cap is {max}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone)]
/// One pattern compiled to its main rule plus variable-occurrence
/// rules. Written once, then discarded; the engine owns all runtime
/// state thereafter.
pub struct CompiledPattern {
    pub rule: Rule,
    pub variable_rules: Vec<Rule>,
    /// Declared variable name to pattern-node occurrences.
    pub variables: HashMap<String, Vec<NodeId>>,
}

impl CompiledPattern {
    pub fn write_to(&self, writer: &mut SourceWriter) {
        writer.write_rule(&self.rule);
        for rule in &self.variable_rules {
            writer.write_rule(rule);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    Parse,
    Shape,
    Capacity,
}

#[derive(Debug, Clone, Serialize)]
/// Per-pattern failure report; a batch run carries on past these.
pub struct Diagnostic {
    pub rule: String,
    pub index: u32,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(pattern: &PatternSource, error: &CompileError) -> Self {
        let kind = match error {
            CompileError::Parse(_) => DiagnosticKind::Parse,
            CompileError::Shape(_) => DiagnosticKind::Shape,
            CompileError::Capacity { .. } => DiagnosticKind::Capacity,
        };
        Self {
            rule: pattern.rule.clone(),
            index: pattern.index,
            kind,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Batch {
    pub compiled: Vec<CompiledPattern>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles one pattern snippet into a rule.
pub fn compile_pattern(
    lang: &Language,
    pattern: &PatternSource,
    config: &Config,
) -> Result<CompiledPattern, CompileError> {
    let tree = lang
        .parse(&pattern.snippet)
        .map_err(|e| CompileError::Parse(e.to_string()))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(CompileError::Parse(format!(
            "grammar rejected snippet for {}", pattern.rule
        )));
    }
    if root.named_child_count() != 1 {
        return Err(CompileError::Shape(format!(
            "pattern must contain exactly one top-level node, found {}",
            root.named_child_count()
        )));
    }
    let top = root
        .named_child(0)
        .ok_or_else(|| CompileError::Shape("empty pattern".into()))?;

    let mut compiler = Compiler::new(lang, &pattern.snippet, &pattern.variables);
    lang.walker
        .walk(top, &pattern.snippet, &mut |node| compiler.visit(node))?;
    compiler.finish(pattern, config)
}

/// Compiles a batch of patterns in parallel. Per-pattern failures
/// become diagnostics; sibling patterns still compile.
pub fn compile_patterns(lang: &Language, patterns: &[PatternSource], config: &Config) -> Batch {
    let results: Vec<(usize, Result<CompiledPattern, CompileError>)> = patterns
        .par_iter()
        .enumerate()
        .map(|(i, p)| (i, compile_pattern(lang, p, config)))
        .collect();

    let mut batch = Batch::default();
    for (i, res) in results {
        let pattern = &patterns[i];
        match res {
            Ok(compiled) => {
                debug!(rule = %pattern.rule, index = pattern.index, "pattern compiled");
                batch.compiled.push(compiled);
            }
            Err(e) => {
                warn!(rule = %pattern.rule, index = pattern.index, error = %e, "pattern skipped");
                batch.diagnostics.push(Diagnostic::new(pattern, &e));
            }
        }
    }
    batch
}

pub(crate) struct Compiler<'a> {
    pub(crate) lang: &'a Language,
    source: &'a str,
    /// Substituted token text to declared variable name.
    pub(crate) tokens: HashMap<&'a str, &'a str>,
    pub(crate) alloc: IdAllocator,
    ids: HashMap<usize, NodeId>,
    next_index: HashMap<usize, u32>,
    literals: Vec<Literal>,
    occurrences: Vec<(String, NodeId)>,
    root: Option<NodeId>,
    canon: CanonicalRules,
}

pub(crate) fn var(id: NodeId) -> Element {
    Element::Id(format!("n{}", id.index()))
}

impl<'a> Compiler<'a> {
    fn new(lang: &'a Language, source: &'a str, variables: &'a [PatternVariable]) -> Self {
        let tokens = variables
            .iter()
            .map(|v| (v.token.as_str(), v.name.as_str()))
            .collect();
        Self {
            lang,
            source,
            tokens,
            alloc: IdAllocator::new(),
            ids: HashMap::new(),
            next_index: HashMap::new(),
            literals: Vec::new(),
            occurrences: Vec::new(),
            root: None,
            canon: CanonicalRules::resolve(lang),
        }
    }

    pub(crate) fn node_text(&self, node: Node<'_>) -> Result<&'a str, CompileError> {
        node.utf8_text(self.source.as_bytes())
            .map_err(|e| CompileError::Parse(format!("invalid utf-8 in snippet: {e}")))
    }

    fn visit(&mut self, node: Node<'_>) -> Result<Step, CompileError> {
        let id = self.alloc.next_id();
        self.ids.insert(node.id(), id);
        let el = var(id);
        let is_root = self.root.is_none();
        if is_root {
            self.root = Some(id);
        } else {
            self.link_to_parent(node, &el);
        }

        let text = self.node_text(node)?;
        if let Some(&name) = self.tokens.get(text) {
            // Placeholders bind any node shape and are leaves in the
            // pattern regardless of how the token parsed.
            self.literals.push(Literal::predicate(
                relations::NODE_TYPE,
                vec![el, Element::Wildcard],
            ));
            if name != ANY_VARIABLE {
                self.occurrences.push((name.to_string(), id));
            }
            return Ok(Step::prune());
        }

        // Type/content literals go first so negations further down the
        // body only ever see grounded variables.
        let canonical = self.canonicalize(node, &el, is_root)?;
        if let Some(outcome) = canonical {
            if !outcome.replaces_node {
                self.push_node_shape(node, &el)?;
            }
            self.literals.extend(outcome.literals);
            if !outcome.replaces_node {
                self.push_missing_fields(node, &el, &outcome.handled_fields);
            }
            return Ok(Step::descend_skipping(outcome.consumed));
        }

        self.push_node_shape(node, &el)?;
        self.push_missing_fields(node, &el, &[]);
        Ok(Step::descend())
    }

    fn push_node_shape(&mut self, node: Node<'_>, el: &Element) -> Result<(), CompileError> {
        self.literals.push(Literal::predicate(
            relations::NODE_TYPE,
            vec![el.clone(), Element::symbol(node.kind())],
        ));
        if self.lang.profile.is_leaf(node.kind_id()) {
            let text = self.node_text(node)?;
            self.literals.push(Literal::predicate(
                relations::NODE_CONTENT,
                vec![el.clone(), Element::symbol(text)],
            ));
        }
        Ok(())
    }

    /// Asserts the absence of every declared field the pattern node
    /// does not populate, letting a pattern state "no third argument",
    /// except exempted or canonicalization-handled fields.
    fn push_missing_fields(&mut self, node: Node<'_>, el: &Element, handled: &[&str]) {
        let kind_id = node.kind_id();
        for field in self.lang.profile.fields_of(kind_id) {
            if handled.contains(field) || self.lang.profile.is_exempt(kind_id, field) {
                continue;
            }
            if node.child_by_field_name(field).is_none() {
                self.literals.push(Literal::negated(
                    relations::NODE_FIELD,
                    vec![el.clone(), Element::Wildcard, Element::symbol(*field)],
                ));
            }
        }
    }

    fn link_to_parent(&mut self, node: Node<'_>, el: &Element) {
        let mut ancestor = node.parent();
        while let Some(parent) = ancestor {
            if let Some(&pid) = self.ids.get(&parent.id()) {
                if let Some(field) = self.lang.profile.field_of(parent, &node) {
                    self.literals.push(Literal::predicate(
                        relations::NODE_FIELD,
                        vec![var(pid), el.clone(), Element::symbol(field)],
                    ));
                } else {
                    let slot = self.next_index.entry(parent.id()).or_insert(0);
                    self.literals.push(Literal::predicate(
                        relations::PARENT_CHILD,
                        vec![var(pid), Element::Unsigned(*slot), el.clone()],
                    ));
                    *slot += 1;
                }
                return;
            }
            ancestor = parent.parent();
        }
    }

    fn finish(
        mut self,
        pattern: &PatternSource,
        config: &Config,
    ) -> Result<CompiledPattern, CompileError> {
        let root = self
            .root
            .ok_or_else(|| CompileError::Shape("empty pattern".into()))?;

        if config.enforce_variable_equality {
            self.push_equality_joins();
        }

        let body = Literal::Conjunction(std::mem::take(&mut self.literals));
        let literals = body.atom_count();
        if literals > config.max_literals {
            return Err(CompileError::Capacity {
                literals,
                max: config.max_literals,
            });
        }

        let rule = Rule {
            name: pattern.rule.clone(),
            head: vec![Element::Unsigned(pattern.index), var(root)],
            body: body.clone(),
        };
        let variable_rules = self
            .occurrences
            .iter()
            .map(|(name, occ)| Rule {
                name: relations::RULE_VARIABLE.to_string(),
                head: vec![var(root), Element::symbol(name.clone()), var(*occ)],
                body: body.clone(),
            })
            .collect();

        let mut variables: HashMap<String, Vec<NodeId>> = HashMap::new();
        for (name, occ) in &self.occurrences {
            variables.entry(name.clone()).or_default().push(*occ);
        }
        Ok(CompiledPattern {
            rule,
            variable_rules,
            variables,
        })
    }

    /// One shared content variable per repeated pattern variable, so
    /// every occurrence must carry the same literal text at match time.
    fn push_equality_joins(&mut self) {
        let mut groups: Vec<(String, Vec<NodeId>)> = Vec::new();
        for (name, occ) in &self.occurrences {
            match groups.iter_mut().find(|(n, _)| n == name) {
                Some((_, ids)) => ids.push(*occ),
                None => groups.push((name.clone(), vec![*occ])),
            }
        }
        for (i, (_, ids)) in groups.iter().enumerate() {
            if ids.len() < 2 {
                continue;
            }
            let shared = Element::Id(format!("v{i}"));
            for occ in ids {
                self.literals.push(Literal::predicate(
                    relations::NODE_CONTENT,
                    vec![var(*occ), shared.clone()],
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_caps_at_twenty_literals() {
        assert_eq!(Config::default().max_literals, 20);
        assert!(!Config::default().enforce_variable_equality);
    }

    #[test]
    fn diagnostics_carry_pattern_identity() {
        let pattern = PatternSource {
            rule: "rule_9".into(),
            index: 2,
            snippet: String::new(),
            variables: vec![],
        };
        let err = CompileError::Capacity {
            literals: 25,
            max: 20,
        };
        let diag = Diagnostic::new(&pattern, &err);
        assert_eq!(diag.rule, "rule_9");
        assert_eq!(diag.index, 2);
        assert_eq!(diag.kind, DiagnosticKind::Capacity);
        assert!(diag.message.contains("25"));
    }
}
