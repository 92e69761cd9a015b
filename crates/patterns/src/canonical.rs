//! Per-node-kind syntactic canonicalization.
//!
//! Some constructs have several equivalent surface spellings; a
//! compiled rule must match all of them. Each canonicalization replaces
//! part of the node's literal output with a disjunction over the
//! alternative fact shapes and reports the children it consumed, so the
//! walker never revisits them. Rules are resolved per language from the
//! profile's canonicalization hints; a grammar without the construct
//! leaves the rule disabled.

use crate::{var, CompileError, Compiler};
use ir::{relations, Element, Literal};
use tree_sitter::Node;

pub(crate) struct CanonicalRules {
    call: Option<CallRule>,
    pair: Option<PairRule>,
}

#[derive(Clone, Copy)]
struct CallRule {
    call_id: u16,
    list_id: u16,
    identifier_id: u16,
    call: &'static str,
    list: &'static str,
    identifier: &'static str,
    arguments_field: &'static str,
    method_field: Option<&'static str>,
    receiver_field: Option<&'static str>,
    bare: bool,
}

#[derive(Clone, Copy)]
struct PairRule {
    pair_id: u16,
    plain_id: u16,
    prefixed_id: u16,
    plain: &'static str,
    prefixed: &'static str,
    key_field: &'static str,
}

pub(crate) struct Outcome {
    pub literals: Vec<Literal>,
    /// `tree_sitter::Node::id`s of children consumed here.
    pub consumed: Vec<usize>,
    /// Fields excluded from the generic missing-field pass.
    pub handled_fields: Vec<&'static str>,
    /// Whether the literals fully replace the node's type/content/field
    /// output (the visit emits nothing else for this node).
    pub replaces_node: bool,
}

impl CanonicalRules {
    pub(crate) fn resolve(lang: &parsers::Language) -> Self {
        let profile = &lang.profile;
        let call = lang.canonical.call.and_then(|hint| {
            Some(CallRule {
                call_id: profile.kind_id(hint.call)?,
                list_id: profile.kind_id(hint.list)?,
                identifier_id: profile.kind_id(hint.identifier)?,
                call: hint.call,
                list: hint.list,
                identifier: hint.identifier,
                arguments_field: hint.arguments_field,
                method_field: hint.method_field,
                receiver_field: hint.receiver_field,
                bare: hint.bare,
            })
        });
        let pair = lang.canonical.symbol_pair.and_then(|hint| {
            Some(PairRule {
                pair_id: profile.kind_id(hint.pair)?,
                plain_id: profile.kind_id(hint.plain)?,
                prefixed_id: profile.kind_id(hint.prefixed)?,
                plain: hint.plain,
                prefixed: hint.prefixed,
                key_field: hint.key_field,
            })
        });
        Self { call, pair }
    }
}

impl Compiler<'_> {
    pub(crate) fn canonicalize(
        &mut self,
        node: Node<'_>,
        el: &Element,
        is_root: bool,
    ) -> Result<Option<Outcome>, CompileError> {
        if let Some(outcome) = self.bare_call(node, el, is_root)? {
            return Ok(Some(outcome));
        }
        if let Some(outcome) = self.empty_arguments(node, el)? {
            return Ok(Some(outcome));
        }
        self.symbol_pair_key(node, el)
    }

    /// A receiverless call with no arguments and a bare identifier in
    /// call position are the same expression in two spellings; either
    /// pattern form compiles to a disjunction matching both.
    fn bare_call(
        &mut self,
        node: Node<'_>,
        el: &Element,
        is_root: bool,
    ) -> Result<Option<Outcome>, CompileError> {
        let Some(rule) = self.canon.call else {
            return Ok(None);
        };
        if !rule.bare {
            return Ok(None);
        }
        let (Some(method_field), Some(receiver_field)) = (rule.method_field, rule.receiver_field)
        else {
            return Ok(None);
        };

        let kind_id = node.kind_id();
        if kind_id == rule.identifier_id {
            // Only the pattern root is ambiguous enough to widen; an
            // identifier deeper in the pattern keeps its literal shape.
            if !is_root {
                return Ok(None);
            }
            let name = self.node_text(node)?;
            if self.tokens.contains_key(name) {
                return Ok(None);
            }
            let name = name.to_string();
            let literals = self.call_or_identifier(el, &name, rule, method_field, receiver_field);
            return Ok(Some(Outcome {
                literals,
                consumed: Vec::new(),
                handled_fields: Vec::new(),
                replaces_node: true,
            }));
        }

        if kind_id != rule.call_id {
            return Ok(None);
        }
        if node.child_by_field_name(receiver_field).is_some() {
            return Ok(None);
        }
        let Some(method) = node.child_by_field_name(method_field) else {
            return Ok(None);
        };
        if method.kind_id() != rule.identifier_id {
            return Ok(None);
        }
        let name = self.node_text(method)?;
        if self.tokens.contains_key(name) {
            return Ok(None);
        }
        let mut consumed = vec![method.id()];
        match node.child_by_field_name(rule.arguments_field) {
            None => {}
            Some(list) if list.named_child_count() == 0 => consumed.push(list.id()),
            Some(_) => return Ok(None),
        }
        let name = name.to_string();
        let literals = self.call_or_identifier(el, &name, rule, method_field, receiver_field);
        Ok(Some(Outcome {
            literals,
            consumed,
            handled_fields: Vec::new(),
            replaces_node: true,
        }))
    }

    fn call_or_identifier(
        &mut self,
        el: &Element,
        name: &str,
        rule: CallRule,
        method_field: &'static str,
        receiver_field: &'static str,
    ) -> Vec<Literal> {
        let args_empty = self.arguments_absent_or_empty(el, rule.arguments_field, rule.list);
        let method = var(self.alloc.next_id());

        let call_branch = Literal::Conjunction(vec![
            Literal::predicate(
                relations::NODE_TYPE,
                vec![el.clone(), Element::symbol(rule.call)],
            ),
            Literal::predicate(
                relations::NODE_FIELD,
                vec![el.clone(), method.clone(), Element::symbol(method_field)],
            ),
            Literal::predicate(
                relations::NODE_TYPE,
                vec![method.clone(), Element::symbol(rule.identifier)],
            ),
            Literal::predicate(
                relations::NODE_CONTENT,
                vec![method, Element::symbol(name)],
            ),
            args_empty,
            Literal::negated(
                relations::NODE_FIELD,
                vec![el.clone(), Element::Wildcard, Element::symbol(receiver_field)],
            ),
        ]);
        let identifier_branch = Literal::Conjunction(vec![
            Literal::predicate(
                relations::NODE_TYPE,
                vec![el.clone(), Element::symbol(rule.identifier)],
            ),
            Literal::predicate(
                relations::NODE_CONTENT,
                vec![el.clone(), Element::symbol(name)],
            ),
            // Not itself the method position of some call.
            Literal::negated(
                relations::NODE_FIELD,
                vec![Element::Wildcard, el.clone(), Element::symbol(method_field)],
            ),
        ]);
        vec![Literal::Disjunction(vec![call_branch, identifier_branch])]
    }

    /// A call with zero explicit arguments matches both an explicit
    /// empty argument list and a wholly absent one.
    fn empty_arguments(
        &mut self,
        node: Node<'_>,
        el: &Element,
    ) -> Result<Option<Outcome>, CompileError> {
        let Some(rule) = self.canon.call else {
            return Ok(None);
        };
        if node.kind_id() != rule.call_id {
            return Ok(None);
        }
        let mut consumed = Vec::new();
        match node.child_by_field_name(rule.arguments_field) {
            None => {}
            Some(list) if list.kind_id() == rule.list_id && list.named_child_count() == 0 => {
                consumed.push(list.id());
            }
            Some(_) => return Ok(None),
        }
        let literals = vec![self.arguments_absent_or_empty(el, rule.arguments_field, rule.list)];
        Ok(Some(Outcome {
            literals,
            consumed,
            handled_fields: vec![rule.arguments_field],
            replaces_node: false,
        }))
    }

    fn arguments_absent_or_empty(
        &mut self,
        el: &Element,
        field: &'static str,
        list: &'static str,
    ) -> Literal {
        let tmp = var(self.alloc.next_id());
        Literal::Disjunction(vec![
            Literal::negated(
                relations::NODE_FIELD,
                vec![el.clone(), Element::Wildcard, Element::symbol(field)],
            ),
            Literal::Conjunction(vec![
                Literal::predicate(
                    relations::NODE_FIELD,
                    vec![el.clone(), tmp.clone(), Element::symbol(field)],
                ),
                Literal::predicate(
                    relations::NODE_TYPE,
                    vec![tmp.clone(), Element::symbol(list)],
                ),
                Literal::negated(
                    relations::PARENT_CHILD,
                    vec![tmp, Element::Wildcard, Element::Wildcard],
                ),
            ]),
        ])
    }

    /// A pair whose key is a bare symbol matches both the `:name =>`
    /// and `name:` spellings through a temporary key node constrained
    /// by a two-way content disjunction.
    fn symbol_pair_key(
        &mut self,
        node: Node<'_>,
        el: &Element,
    ) -> Result<Option<Outcome>, CompileError> {
        let Some(rule) = self.canon.pair else {
            return Ok(None);
        };
        if node.kind_id() != rule.pair_id {
            return Ok(None);
        }
        let Some(key) = node.child_by_field_name(rule.key_field) else {
            return Ok(None);
        };
        if key.kind_id() != rule.plain_id && key.kind_id() != rule.prefixed_id {
            return Ok(None);
        }
        let text = self.node_text(key)?;
        if self.tokens.contains_key(text) {
            return Ok(None);
        }
        let name = text.trim_start_matches(':').to_string();

        let tmp = var(self.alloc.next_id());
        let literals = vec![
            Literal::predicate(
                relations::NODE_FIELD,
                vec![el.clone(), tmp.clone(), Element::symbol(rule.key_field)],
            ),
            Literal::Disjunction(vec![
                Literal::Conjunction(vec![
                    Literal::predicate(
                        relations::NODE_TYPE,
                        vec![tmp.clone(), Element::symbol(rule.prefixed)],
                    ),
                    Literal::predicate(
                        relations::NODE_CONTENT,
                        vec![tmp.clone(), Element::symbol(format!(":{name}"))],
                    ),
                ]),
                Literal::Conjunction(vec![
                    Literal::predicate(
                        relations::NODE_TYPE,
                        vec![tmp.clone(), Element::symbol(rule.plain)],
                    ),
                    Literal::predicate(relations::NODE_CONTENT, vec![tmp, Element::symbol(name)]),
                ]),
            ]),
        ];
        Ok(Some(Outcome {
            literals,
            consumed: vec![key.id()],
            handled_fields: vec![rule.key_field],
            replaces_node: false,
        }))
    }
}
