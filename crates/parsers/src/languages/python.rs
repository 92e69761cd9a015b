use super::Language;
use crate::profile::{CallHint, CanonicalHints, ProfileSpec};
use std::sync::OnceLock;

static PROFILE: ProfileSpec = ProfileSpec {
    leaves: &[
        "identifier",
        "integer",
        "float",
        "string",
        "true",
        "false",
        "none",
    ],
    fields: &[
        ("call", &["function", "arguments"]),
        ("attribute", &["object", "attribute"]),
        ("keyword_argument", &["name", "value"]),
        ("assignment", &["left", "right", "type"]),
        ("augmented_assignment", &["left", "right"]),
        ("binary_operator", &["left", "right"]),
        ("subscript", &["value", "subscript"]),
        ("function_definition", &["name", "parameters", "return_type", "body"]),
        ("class_definition", &["name", "superclasses", "body"]),
        ("if_statement", &["condition", "consequence", "alternative"]),
        ("for_statement", &["left", "right", "body"]),
        ("while_statement", &["condition", "body"]),
    ],
    exempt: &[
        ("assignment", "type"),
        ("function_definition", "return_type"),
        ("class_definition", "superclasses"),
        ("if_statement", "alternative"),
    ],
};

static LANG: OnceLock<Language> = OnceLock::new();

pub fn language() -> &'static Language {
    LANG.get_or_init(|| {
        Language::build(
            "python",
            tree_sitter_python::language(),
            &PROFILE,
            CanonicalHints {
                call: Some(CallHint {
                    call: "call",
                    list: "argument_list",
                    arguments_field: "arguments",
                    method_field: None,
                    receiver_field: None,
                    identifier: "identifier",
                    bare: false,
                }),
                symbol_pair: None,
            },
        )
    })
}
