//! Per-grammar structural tables.
//!
//! A [`ProfileSpec`] is a static description of a grammar: which node
//! kinds carry matchable literal content, the declared field names per
//! node kind, and which fields may be absent without signaling
//! "missing". [`LanguageProfile::resolve`] binds the spec against the
//! grammar once, mapping every kind name to the grammar's numeric kind
//! id so the extractor and the pattern compiler match on `u16` tags
//! instead of comparing strings per node.

use std::collections::{HashMap, HashSet};
use tracing::debug;
use tree_sitter::Node;

/// Static profile tables for one grammar, written per language module.
pub struct ProfileSpec {
    /// Node kinds whose exact source text is emitted as `node_content`.
    pub leaves: &'static [&'static str],
    /// Declared field names per node kind, in grammar order.
    pub fields: &'static [(&'static str, &'static [&'static str])],
    /// `(kind, field)` pairs exempt from missing-field negation.
    pub exempt: &'static [(&'static str, &'static str)],
}

/// Canonicalization anchors for one grammar. Names are resolved to kind
/// ids by the pattern compiler; a grammar without a given construct
/// leaves the hint unset and the corresponding rule disabled.
#[derive(Clone, Copy, Default)]
pub struct CanonicalHints {
    pub call: Option<CallHint>,
    pub symbol_pair: Option<PairHint>,
}

#[derive(Clone, Copy)]
/// Call nodes whose argument list may be empty or wholly omitted.
pub struct CallHint {
    pub call: &'static str,
    pub list: &'static str,
    pub arguments_field: &'static str,
    pub method_field: Option<&'static str>,
    pub receiver_field: Option<&'static str>,
    pub identifier: &'static str,
    /// Grammar permits a bare identifier as a receiverless zero-argument
    /// call (`foo` versus `foo()`).
    pub bare: bool,
}

#[derive(Clone, Copy)]
/// Hash/object pairs whose bare-symbol key has two surface spellings
/// (`:name =>` versus `name:`).
pub struct PairHint {
    pub pair: &'static str,
    pub key_field: &'static str,
    pub plain: &'static str,
    pub prefixed: &'static str,
}

/// A [`ProfileSpec`] resolved against its grammar.
pub struct LanguageProfile {
    ts: tree_sitter::Language,
    leaves: HashSet<u16>,
    fields: HashMap<u16, &'static [&'static str]>,
    exempt: HashSet<(u16, &'static str)>,
}

impl LanguageProfile {
    pub(crate) fn resolve(ts: tree_sitter::Language, spec: &ProfileSpec) -> Self {
        let mut leaves = HashSet::new();
        for kind in spec.leaves {
            match kind_lookup(ts, kind) {
                Some(id) => {
                    leaves.insert(id);
                }
                None => debug!(kind, "leaf kind not in grammar, ignored"),
            }
        }
        let mut fields = HashMap::new();
        for (kind, names) in spec.fields {
            match kind_lookup(ts, kind) {
                Some(id) => {
                    fields.insert(id, *names);
                }
                None => debug!(kind, "field table kind not in grammar, ignored"),
            }
        }
        let mut exempt = HashSet::new();
        for (kind, field) in spec.exempt {
            if let Some(id) = kind_lookup(ts, kind) {
                exempt.insert((id, *field));
            }
        }
        Self {
            ts,
            leaves,
            fields,
            exempt,
        }
    }

    /// Grammar kind id for a named node kind, if the grammar knows it.
    pub fn kind_id(&self, kind: &str) -> Option<u16> {
        kind_lookup(self.ts, kind)
    }

    pub fn is_leaf(&self, kind_id: u16) -> bool {
        self.leaves.contains(&kind_id)
    }

    /// Declared field names for a node kind. Kinds without a profile
    /// entry report no fields: they still produce structural facts, but
    /// missing-field negation is skipped for them.
    pub fn fields_of(&self, kind_id: u16) -> &'static [&'static str] {
        self.fields.get(&kind_id).copied().unwrap_or(&[])
    }

    pub fn is_exempt(&self, kind_id: u16, field: &str) -> bool {
        self.exempt.contains(&(kind_id, field))
    }

    /// The field of `parent` that `child` occupies, if any.
    pub fn field_of(&self, parent: Node<'_>, child: &Node<'_>) -> Option<&'static str> {
        self.fields_of(parent.kind_id())
            .iter()
            .copied()
            .find(|f| {
                parent
                    .child_by_field_name(f)
                    .is_some_and(|n| n.id() == child.id())
            })
    }
}

fn kind_lookup(ts: tree_sitter::Language, kind: &str) -> Option<u16> {
    match ts.id_for_node_kind(kind, true) {
        0 => None,
        id => Some(id),
    }
}
