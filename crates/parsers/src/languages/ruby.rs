use super::Language;
use crate::profile::{CallHint, CanonicalHints, PairHint, ProfileSpec};
use std::sync::OnceLock;

static PROFILE: ProfileSpec = ProfileSpec {
    leaves: &[
        "identifier",
        "constant",
        "simple_symbol",
        "hash_key_symbol",
        "integer",
        "float",
        "string_content",
        "instance_variable",
        "class_variable",
        "global_variable",
        "true",
        "false",
        "nil",
        "self",
    ],
    fields: &[
        ("call", &["receiver", "method", "arguments", "block"]),
        ("pair", &["key", "value"]),
        ("method", &["name", "parameters"]),
        ("singleton_method", &["object", "name", "parameters"]),
        ("assignment", &["left", "right"]),
        ("operator_assignment", &["left", "right"]),
        ("binary", &["left", "right"]),
        ("element_reference", &["object"]),
        ("if", &["condition", "consequence", "alternative"]),
        ("unless", &["condition", "consequence", "alternative"]),
        ("while", &["condition", "body"]),
        ("class", &["name", "superclass"]),
        ("module", &["name"]),
        ("block", &["parameters", "body"]),
        ("do_block", &["parameters", "body"]),
    ],
    exempt: &[
        ("call", "arguments"),
        ("call", "block"),
        ("method", "parameters"),
        ("singleton_method", "parameters"),
        ("if", "alternative"),
        ("unless", "alternative"),
        ("class", "superclass"),
        ("block", "parameters"),
        ("do_block", "parameters"),
    ],
};

static LANG: OnceLock<Language> = OnceLock::new();

pub fn language() -> &'static Language {
    LANG.get_or_init(|| {
        Language::build(
            "ruby",
            tree_sitter_ruby::language(),
            &PROFILE,
            CanonicalHints {
                call: Some(CallHint {
                    call: "call",
                    list: "argument_list",
                    arguments_field: "arguments",
                    method_field: Some("method"),
                    receiver_field: Some("receiver"),
                    identifier: "identifier",
                    bare: true,
                }),
                symbol_pair: Some(PairHint {
                    pair: "pair",
                    key_field: "key",
                    plain: "hash_key_symbol",
                    prefixed: "simple_symbol",
                }),
            },
        )
    })
}
