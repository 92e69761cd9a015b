//! Relation declarations for the base fact schema.
//!
//! The evaluation engine requires every relation to be declared before
//! use; [`declarations`] renders the declarations matching the facts
//! produced by the extractor so a written fact file loads stand-alone.
//! Rule-head relations are declared by the writer as rules are written,
//! since their names are only known at compile time.

/// Column types accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Symbol,
    Unsigned,
    Location,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Symbol => "symbol",
            ColumnType::Unsigned => "unsigned",
            ColumnType::Location => "Location",
        }
    }
}

/// Declared schema of the base relations, in declaration order.
pub fn base_relations() -> [(&'static str, &'static [(&'static str, ColumnType)]); 6] {
    use ColumnType::*;
    [
        (crate::relations::NODE_TYPE, &[("node", Unsigned), ("kind", Symbol)]),
        (crate::relations::NODE_CONTENT, &[("node", Unsigned), ("content", Symbol)]),
        (
            crate::relations::PARENT_CHILD,
            &[("parent", Unsigned), ("index", Unsigned), ("child", Unsigned)],
        ),
        (
            crate::relations::NODE_FIELD,
            &[("parent", Unsigned), ("child", Unsigned), ("field", Symbol)],
        ),
        (crate::relations::NODE_LOCATION, &[("node", Unsigned), ("loc", Location)]),
        (
            crate::relations::RULE_VARIABLE,
            &[("root", Unsigned), ("name", Symbol), ("occurrence", Unsigned)],
        ),
    ]
}

/// Renders the `.type`/`.decl` block for the base schema.
pub fn declarations() -> String {
    let mut out = String::from(
        ".type Location = [start_byte: unsigned, start_row: unsigned, start_col: unsigned, \
         end_row: unsigned, end_col: unsigned]\n",
    );
    for (name, columns) in base_relations() {
        out.push_str(".decl ");
        out.push_str(name);
        out.push('(');
        for (i, (col, ty)) in columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(col);
            out.push_str(": ");
            out.push_str(ty.as_str());
        }
        out.push_str(")\n");
    }
    out
}
