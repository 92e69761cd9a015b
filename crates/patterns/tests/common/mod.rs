//! A naive backtracking evaluator over in-memory fact sets, just enough
//! Datalog to check what a compiled rule matches.

use ir::{CmpOp, Element, Fact, Literal, Rule};
use std::collections::HashMap;

pub type Env = HashMap<String, Element>;

/// Evaluates `rule` against `facts` and returns the deduplicated head
/// projections of every satisfying binding.
pub fn matches(facts: &[Fact], rule: &Rule) -> Vec<Vec<Element>> {
    let mut rows: Vec<Vec<Element>> = Vec::new();
    for env in solve(facts, &rule.body, &Env::new()) {
        let row: Vec<Element> = rule.head.iter().map(|e| resolve(e, &env)).collect();
        if !rows.contains(&row) {
            rows.push(row);
        }
    }
    rows
}

fn solve(facts: &[Fact], literal: &Literal, env: &Env) -> Vec<Env> {
    match literal {
        Literal::Predicate { name, elements } => facts
            .iter()
            .filter(|f| &f.relation == name)
            .filter_map(|f| unify_row(elements, &f.elements, env))
            .collect(),
        Literal::Negated { name, elements } => {
            let holds = facts
                .iter()
                .any(|f| &f.relation == name && unify_row(elements, &f.elements, env).is_some());
            if holds {
                Vec::new()
            } else {
                vec![env.clone()]
            }
        }
        Literal::Conjunction(inner) => {
            let mut envs = vec![env.clone()];
            for lit in inner {
                let mut next = Vec::new();
                for e in &envs {
                    next.extend(solve(facts, lit, e));
                }
                envs = next;
                if envs.is_empty() {
                    break;
                }
            }
            envs
        }
        Literal::Disjunction(inner) => inner.iter().flat_map(|l| solve(facts, l, env)).collect(),
        Literal::Constraint { left, op, right } => {
            let equal = resolve(left, env) == resolve(right, env);
            let holds = match op {
                CmpOp::Eq => equal,
                CmpOp::Ne => !equal,
            };
            if holds {
                vec![env.clone()]
            } else {
                Vec::new()
            }
        }
    }
}

fn unify_row(pattern: &[Element], row: &[Element], env: &Env) -> Option<Env> {
    if pattern.len() != row.len() {
        return None;
    }
    let mut env = env.clone();
    for (p, v) in pattern.iter().zip(row) {
        if !unify(p, v, &mut env) {
            return None;
        }
    }
    Some(env)
}

fn unify(pattern: &Element, value: &Element, env: &mut Env) -> bool {
    match pattern {
        Element::Wildcard => true,
        Element::Id(name) => match env.get(name) {
            Some(bound) => bound == value,
            None => {
                env.insert(name.clone(), value.clone());
                true
            }
        },
        Element::Record(inner) => match value {
            Element::Record(values) if inner.len() == values.len() => inner
                .iter()
                .zip(values)
                .all(|(p, v)| unify(p, v, env)),
            _ => false,
        },
        ground => ground == value,
    }
}

fn resolve(element: &Element, env: &Env) -> Element {
    match element {
        Element::Id(name) => env.get(name).cloned().unwrap_or_else(|| element.clone()),
        other => other.clone(),
    }
}
