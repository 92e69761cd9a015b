use super::Language;
use crate::profile::{CallHint, CanonicalHints, ProfileSpec};
use std::sync::OnceLock;

static PROFILE: ProfileSpec = ProfileSpec {
    leaves: &[
        "identifier",
        "property_identifier",
        "shorthand_property_identifier",
        "number",
        "string_fragment",
        "true",
        "false",
        "null",
        "undefined",
        "this",
    ],
    fields: &[
        ("call_expression", &["function", "arguments"]),
        ("member_expression", &["object", "property"]),
        ("pair", &["key", "value"]),
        ("assignment_expression", &["left", "right"]),
        ("binary_expression", &["left", "right"]),
        ("subscript_expression", &["object", "index"]),
        ("function_declaration", &["name", "parameters", "body"]),
        ("variable_declarator", &["name", "value"]),
        ("if_statement", &["condition", "consequence", "alternative"]),
        ("for_statement", &["initializer", "condition", "increment", "body"]),
        ("while_statement", &["condition", "body"]),
    ],
    exempt: &[
        ("variable_declarator", "value"),
        ("if_statement", "alternative"),
    ],
};

static LANG: OnceLock<Language> = OnceLock::new();

pub fn language() -> &'static Language {
    LANG.get_or_init(|| {
        Language::build(
            "javascript",
            tree_sitter_javascript::language(),
            &PROFILE,
            CanonicalHints {
                call: Some(CallHint {
                    call: "call_expression",
                    list: "arguments",
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
