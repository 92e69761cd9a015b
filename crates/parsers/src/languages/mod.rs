//! Per-language wiring: grammar handle, structural profile, walker and
//! canonicalization hints, bundled as one static [`Language`] per
//! supported grammar.

pub mod javascript;
pub mod python;
pub mod ruby;

use crate::profile::{CanonicalHints, LanguageProfile, ProfileSpec};
use crate::walker::Walker;
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::debug;

pub struct Language {
    pub name: &'static str,
    ts: tree_sitter::Language,
    pub profile: LanguageProfile,
    pub walker: Walker,
    pub canonical: CanonicalHints,
}

impl Language {
    fn build(
        name: &'static str,
        ts: tree_sitter::Language,
        spec: &ProfileSpec,
        canonical: CanonicalHints,
    ) -> Self {
        let profile = LanguageProfile::resolve(ts, spec);
        let walker = Walker::new(ts).expect("every-node query");
        Self {
            name,
            ts,
            profile,
            walker,
            canonical,
        }
    }

    pub fn grammar(&self) -> tree_sitter::Language {
        self.ts
    }

    /// Parses one compilation unit. The tree owns every node for the
    /// lifetime of the extraction or compilation pass.
    pub fn parse(&self, source: &str) -> Result<tree_sitter::Tree> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(self.ts)
            .map_err(|e| anyhow!("load {} grammar: {e}", self.name))?;
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow!("{}: parser produced no tree", self.name))
    }
}

pub fn by_name(name: &str) -> Option<&'static Language> {
    match name {
        "ruby" => Some(ruby::language()),
        "python" => Some(python::language()),
        "javascript" => Some(javascript::language()),
        _ => None,
    }
}

/// Determines the supported language from the file name/extension.
pub fn detect_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase());
    let detected = match ext.as_deref() {
        Some("rb") => Some("ruby"),
        Some("py") => Some("python"),
        Some("js") | Some("jsx") => Some("javascript"),
        _ => None,
    };
    if let Some(t) = detected {
        debug!(file = %path.display(), file_type = t, "File type detected");
    } else {
        debug!(file = %path.display(), "Unsupported file type");
    }
    detected
}

pub fn for_path(path: &Path) -> Option<&'static Language> {
    detect_type(path).and_then(by_name)
}
