//! Tree-sitter front-end that lowers parsed source files into the
//! relational fact encoding consumed by the evaluation engine.
//!
//! The pieces, leaves first: [`ids`] issues per-unit node identifiers,
//! [`profile`] holds the per-grammar structural tables, [`walker`] is the
//! reusable pruning traversal, and [`extractor`] runs one full walk per
//! file and emits its facts. [`languages`] wires a grammar, its profile
//! and its walker into one [`Language`] handle.

pub mod extractor;
pub mod ids;
pub mod languages;
pub mod profile;
pub mod walker;

pub use extractor::{extract, extract_file, extract_files, ExtractMetrics, FileFacts};
pub use ids::{IdAllocator, NodeId};
pub use languages::{by_name, detect_type, for_path, Language};
pub use profile::LanguageProfile;
pub use walker::{Step, Walker};
