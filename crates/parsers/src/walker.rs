//! Lazy, cursor-driven depth-first traversal over a syntax tree.
//!
//! The walker holds one language-level "every node" query and is reused
//! across files and patterns; all positional state lives in a per-call
//! cursor over the flattened query result. The cursor moves forward
//! only, deciding with one-token lookahead whether the next node still
//! belongs under the current one, so pruning a subtree costs its own
//! size rather than a rescan of the whole tree.

use std::collections::HashSet;
use tree_sitter::{Node, Query, QueryCursor, QueryError};

/// Per-node traversal decision returned by the visit callback.
pub enum Step {
    /// Visit the node's children, except subtrees rooted at the listed
    /// nodes (`tree_sitter::Node::id` values), which the callback has
    /// already consumed.
    Descend { consumed: Vec<usize> },
    /// Skip the entire subtree.
    Prune,
}

impl Step {
    pub fn descend() -> Self {
        Step::Descend {
            consumed: Vec::new(),
        }
    }

    pub fn descend_skipping(consumed: Vec<usize>) -> Self {
        Step::Descend { consumed }
    }

    pub fn prune() -> Self {
        Step::Prune
    }
}

/// A reusable traversal over one grammar's trees.
pub struct Walker {
    query: Query,
}

impl Walker {
    pub(crate) fn new(ts: tree_sitter::Language) -> Result<Self, QueryError> {
        Ok(Self {
            query: Query::new(ts, "(_) @node")?,
        })
    }

    /// Visits `root` and, for each node whose callback descends, its
    /// named children in source order. Errors propagate immediately;
    /// nothing is revisited afterwards.
    pub fn walk<'t, E, F>(&self, root: Node<'t>, source: &str, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(Node<'t>) -> Result<Step, E>,
    {
        let mut qc = QueryCursor::new();
        let nodes: Vec<Node<'t>> = qc
            .matches(&self.query, root, source.as_bytes())
            .flat_map(|m| m.captures.iter().map(|c| c.node).collect::<Vec<_>>())
            .collect();
        let mut cursor = Cursor {
            nodes,
            pos: 0,
            consumed: HashSet::new(),
        };
        while let Some(node) = cursor.accept() {
            visit_subtree(&mut cursor, node, visit)?;
        }
        Ok(())
    }
}

struct Cursor<'t> {
    nodes: Vec<Node<'t>>,
    pos: usize,
    /// Subtree roots consumed by callbacks, skipped when reached.
    consumed: HashSet<usize>,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<Node<'t>> {
        self.nodes.get(self.pos).copied()
    }

    fn accept(&mut self) -> Option<Node<'t>> {
        let node = self.peek()?;
        self.pos += 1;
        Some(node)
    }

    fn skip_subtree(&mut self, top: &Node<'t>) {
        while let Some(next) = self.peek() {
            if !is_beneath(next, top) {
                break;
            }
            self.pos += 1;
        }
    }
}

fn visit_subtree<'t, E, F>(cursor: &mut Cursor<'t>, node: Node<'t>, visit: &mut F) -> Result<(), E>
where
    F: FnMut(Node<'t>) -> Result<Step, E>,
{
    match visit(node)? {
        Step::Prune => {
            cursor.skip_subtree(&node);
        }
        Step::Descend { consumed } => {
            cursor.consumed.extend(consumed);
            while let Some(next) = cursor.peek() {
                if !is_beneath(next, &node) {
                    break;
                }
                cursor.pos += 1;
                if cursor.consumed.contains(&next.id()) {
                    cursor.skip_subtree(&next);
                    continue;
                }
                visit_subtree(cursor, next, visit)?;
            }
        }
    }
    Ok(())
}

fn is_beneath(node: Node<'_>, ancestor: &Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.id() == ancestor.id() {
            return true;
        }
        current = parent;
    }
    false
}
