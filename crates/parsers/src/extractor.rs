//! Fact extraction: one full walk per file, one fact per structural
//! relationship.
//!
//! Every node gets a `node_type` and a `node_location` fact; leaf kinds
//! per the language profile additionally get `node_content`. Each
//! non-root node is bound to its parent by exactly one `parent_child`
//! (positional children) or `node_field` (named-field children) fact.
//! Positional indices reset at every parent scope and only anonymous
//! children consume them.

use crate::ids::{IdAllocator, NodeId};
use crate::languages::Language;
use crate::walker::Step;
use anyhow::{anyhow, Context, Result};
use ir::{relations, Element, Fact, RelationSink, WriteError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Serialize)]
pub struct ExtractMetrics {
    pub files_extracted: usize,
    pub parse_errors: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Facts extracted from one file.
pub struct FileFacts {
    pub path: String,
    pub facts: Vec<Fact>,
    pub nodes: u32,
}

impl FileFacts {
    /// Packs every fact into the sink as one tuple each.
    pub fn write_to<S: RelationSink + ?Sized>(&self, sink: &mut S) -> Result<(), WriteError> {
        for fact in &self.facts {
            ir::insert_fact(sink, fact)?;
        }
        Ok(())
    }
}

/// Extracts the fact encoding of `source`, assigning node identifiers
/// from `alloc` top-down so a child always references an already
/// assigned parent.
pub fn extract(
    lang: &Language,
    source: &str,
    path: &str,
    alloc: &mut IdAllocator,
) -> Result<FileFacts> {
    let tree = lang.parse(source)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(anyhow!("parse error in {path}"));
    }

    let mut facts: Vec<Fact> = Vec::new();
    let mut ids: HashMap<usize, NodeId> = HashMap::new();
    let mut next_index: HashMap<usize, u32> = HashMap::new();
    let mut nodes = 0u32;

    lang.walker.walk(root, source, &mut |node| -> Result<Step> {
        let id = alloc.next_id();
        ids.insert(node.id(), id);
        nodes += 1;

        facts.push(Fact::new(
            relations::NODE_TYPE,
            vec![Element::Unsigned(id.index()), Element::symbol(node.kind())],
        ));
        if lang.profile.is_leaf(node.kind_id()) {
            let text = node
                .utf8_text(source.as_bytes())
                .map_err(|e| anyhow!("invalid utf-8 in {path}: {e}"))?;
            facts.push(Fact::new(
                relations::NODE_CONTENT,
                vec![Element::Unsigned(id.index()), Element::symbol(text)],
            ));
        }

        if let Some(parent) = node.parent() {
            if let Some(&pid) = ids.get(&parent.id()) {
                if let Some(field) = lang.profile.field_of(parent, &node) {
                    facts.push(Fact::new(
                        relations::NODE_FIELD,
                        vec![
                            Element::Unsigned(pid.index()),
                            Element::Unsigned(id.index()),
                            Element::symbol(field),
                        ],
                    ));
                } else {
                    let slot = next_index.entry(parent.id()).or_insert(0);
                    facts.push(Fact::new(
                        relations::PARENT_CHILD,
                        vec![
                            Element::Unsigned(pid.index()),
                            Element::Unsigned(*slot),
                            Element::Unsigned(id.index()),
                        ],
                    ));
                    *slot += 1;
                }
            }
        }

        facts.push(Fact::new(
            relations::NODE_LOCATION,
            vec![Element::Unsigned(id.index()), location(&node)],
        ));
        Ok(Step::descend())
    })?;

    debug!(file = %path, nodes, facts = facts.len(), "facts extracted");
    Ok(FileFacts {
        path: path.to_string(),
        facts,
        nodes,
    })
}

fn location(node: &tree_sitter::Node<'_>) -> Element {
    let start = node.start_position();
    let end = node.end_position();
    Element::Record(vec![
        Element::Unsigned(node.start_byte() as u32),
        Element::Unsigned(start.row as u32),
        Element::Unsigned(start.column as u32),
        Element::Unsigned(end.row as u32),
        Element::Unsigned(end.column as u32),
    ])
}

/// Reads and extracts one file with a fresh file-scoped allocator.
pub fn extract_file(lang: &Language, path: &Path) -> Result<FileFacts> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut alloc = IdAllocator::new();
    extract(lang, &content, &path.to_string_lossy(), &mut alloc)
}

/// Extracts many files in parallel, one allocator and fact buffer per
/// file. Failures are collected per file so a batch reports partial
/// success instead of aborting.
pub fn extract_files(
    lang: &Language,
    paths: &[PathBuf],
    metrics: Option<&mut ExtractMetrics>,
) -> (Vec<FileFacts>, Vec<(PathBuf, anyhow::Error)>) {
    let results: Vec<(PathBuf, Result<FileFacts>)> = paths
        .par_iter()
        .map(|p| (p.clone(), extract_file(lang, p)))
        .collect();

    let mut extracted = Vec::new();
    let mut failures = Vec::new();
    for (path, res) in results {
        match res {
            Ok(facts) => extracted.push(facts),
            Err(e) => {
                debug!(file = %path.display(), error = ?e, "Failed to extract file");
                failures.push((path, e));
            }
        }
    }
    if let Some(m) = metrics {
        m.files_extracted += extracted.len();
        m.parse_errors += failures.len();
    }
    (extracted, failures)
}
