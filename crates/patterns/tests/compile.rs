mod common;

use common::matches;
use ir::{Element, Fact, SourceWriter};
use parsers::{by_name, extract, IdAllocator, Language};
use patterns::{
    compile_pattern, compile_patterns, CompileError, CompiledPattern, Config, DiagnosticKind,
    PatternSource, PatternVariable,
};
use std::io::Write;
use std::sync::{Arc, Mutex};

struct VecWriter(Arc<Mutex<Vec<u8>>>);

impl Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

fn capture_logs<F: FnOnce()>(f: F) -> String {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let writer_buf = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || VecWriter(writer_buf.clone()))
        .with_max_level(tracing::Level::WARN)
        .without_time()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        f();
    });
    let bytes = buf.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

fn ruby() -> &'static Language {
    by_name("ruby").expect("ruby")
}

fn ruby_facts(source: &str) -> Vec<Fact> {
    let mut alloc = IdAllocator::new();
    extract(ruby(), source, "test.rb", &mut alloc).unwrap().facts
}

fn pattern(snippet: &str, variables: &[(&str, &str)]) -> PatternSource {
    PatternSource {
        rule: "rule_0".into(),
        index: 0,
        snippet: snippet.into(),
        variables: variables
            .iter()
            .map(|(name, token)| PatternVariable {
                name: (*name).into(),
                token: (*token).into(),
            })
            .collect(),
    }
}

fn compile(snippet: &str, variables: &[(&str, &str)]) -> CompiledPattern {
    compile_pattern(ruby(), &pattern(snippet, variables), &Config::default()).unwrap()
}

#[test]
fn placeholder_receiver_matches_any_receiver_and_binds_it() {
    let compiled = compile("treelogVarX.save", &[("X", "treelogVarX")]);
    let facts = ruby_facts("user.save\n");

    // program=0, call=1, receiver=2, method=3.
    let rows = matches(&facts, &compiled.rule);
    assert_eq!(rows, vec![vec![Element::Unsigned(0), Element::Unsigned(1)]]);

    assert_eq!(compiled.variable_rules.len(), 1);
    let bindings = matches(&facts, &compiled.variable_rules[0]);
    assert_eq!(
        bindings,
        vec![vec![
            Element::Unsigned(1),
            Element::symbol("X"),
            Element::Unsigned(2),
        ]]
    );
}

#[test]
fn placeholder_does_not_match_a_different_method() {
    let compiled = compile("treelogVarX.save", &[("X", "treelogVarX")]);
    let facts = ruby_facts("user.delete\n");
    assert!(matches(&facts, &compiled.rule).is_empty());
}

#[test]
fn anonymous_placeholder_records_no_binding() {
    let compiled = compile("treelogAny.save", &[("_", "treelogAny")]);
    let facts = ruby_facts("user.save\n");

    assert_eq!(matches(&facts, &compiled.rule).len(), 1);
    assert!(compiled.variable_rules.is_empty());
    assert!(compiled.variables.is_empty());
}

#[test]
fn zero_argument_call_rejects_a_call_with_arguments() {
    let compiled = compile("foo()", &[]);

    assert!(matches(&ruby_facts("foo(1)\n"), &compiled.rule).is_empty());
    assert_eq!(matches(&ruby_facts("foo()\n"), &compiled.rule).len(), 1);
    assert_eq!(matches(&ruby_facts("foo\n"), &compiled.rule).len(), 1);
}

#[test]
fn bare_identifier_pattern_also_matches_the_explicit_call() {
    let compiled = compile("foo", &[]);

    assert_eq!(matches(&ruby_facts("foo\n"), &compiled.rule).len(), 1);
    assert_eq!(matches(&ruby_facts("foo()\n"), &compiled.rule).len(), 1);
    assert!(matches(&ruby_facts("foo(1)\n"), &compiled.rule).is_empty());
}

#[test]
fn bare_identifier_does_not_match_the_method_position_of_a_call() {
    let compiled = compile("foo", &[]);
    // The identifier in `bar.foo` sits in method position and is not a
    // standalone use of `foo`.
    assert!(matches(&ruby_facts("bar.foo\n"), &compiled.rule).is_empty());
}

#[test]
fn symbol_keys_match_both_hash_spellings() {
    let compiled = compile("x = {status: 1}", &[]);

    assert_eq!(
        matches(&ruby_facts("x = {status: 1}\n"), &compiled.rule).len(),
        1
    );
    assert_eq!(
        matches(&ruby_facts("x = {:status => 1}\n"), &compiled.rule).len(),
        1
    );
    assert!(matches(&ruby_facts("x = {state: 1}\n"), &compiled.rule).is_empty());
    assert!(matches(&ruby_facts("x = {status: 2}\n"), &compiled.rule).is_empty());
}

#[test]
fn rocket_spelling_in_the_pattern_compiles_to_the_same_match() {
    let compiled = compile("x = {:status => 1}", &[]);
    assert_eq!(
        matches(&ruby_facts("x = {status: 1}\n"), &compiled.rule).len(),
        1
    );
}

#[test]
fn repeated_variable_is_unconstrained_by_default() {
    let compiled = compile(
        "foo(treelogVarX, treelogVarX)",
        &[("X", "treelogVarX"), ("X", "treelogVarX")],
    );
    assert_eq!(matches(&ruby_facts("foo(a, b)\n"), &compiled.rule).len(), 1);
    assert_eq!(compiled.variables["X"].len(), 2);
}

#[test]
fn repeated_variable_joins_on_content_when_configured() {
    let config = Config {
        enforce_variable_equality: true,
        ..Config::default()
    };
    let compiled = compile_pattern(
        ruby(),
        &pattern(
            "foo(treelogVarX, treelogVarX)",
            &[("X", "treelogVarX"), ("X", "treelogVarX")],
        ),
        &config,
    )
    .unwrap();

    assert_eq!(matches(&ruby_facts("foo(a, a)\n"), &compiled.rule).len(), 1);
    assert!(matches(&ruby_facts("foo(a, b)\n"), &compiled.rule).is_empty());
}

#[test]
fn compiling_twice_yields_identical_rules() {
    let source = pattern("treelogVarX.save", &[("X", "treelogVarX")]);
    let a = compile_pattern(ruby(), &source, &Config::default()).unwrap();
    let b = compile_pattern(ruby(), &source, &Config::default()).unwrap();
    assert_eq!(a.rule, b.rule);
    assert_eq!(a.variable_rules, b.variable_rules);
}

#[test]
fn multi_statement_snippet_is_a_shape_error() {
    let err = compile_pattern(ruby(), &pattern("a = 1\nb = 2\n", &[]), &Config::default());
    assert!(matches!(err, Err(CompileError::Shape(_))));
}

#[test]
fn unparsable_snippet_is_a_parse_error() {
    let err = compile_pattern(ruby(), &pattern("def f(", &[]), &Config::default());
    assert!(matches!(err, Err(CompileError::Parse(_))));
}

#[test]
fn oversized_pattern_hits_the_literal_cap() {
    let err = compile_pattern(
        ruby(),
        &pattern("foo(1, 2, 3, 4, 5, 6, 7, 8, 9, 10)", &[]),
        &Config::default(),
    );
    assert!(matches!(err, Err(CompileError::Capacity { .. })));
}

#[test]
fn batch_compilation_collects_diagnostics_and_keeps_going() {
    let sources = vec![
        pattern("user.save", &[]),
        PatternSource {
            rule: "rule_broken".into(),
            index: 1,
            snippet: "def f(".into(),
            variables: vec![],
        },
        PatternSource {
            rule: "rule_0".into(),
            index: 2,
            snippet: "foo()".into(),
            variables: vec![],
        },
    ];
    let batch = compile_patterns(ruby(), &sources, &Config::default());

    assert_eq!(batch.compiled.len(), 2);
    assert_eq!(batch.diagnostics.len(), 1);
    let diag = &batch.diagnostics[0];
    assert_eq!(diag.rule, "rule_broken");
    assert_eq!(diag.index, 1);
    assert_eq!(diag.kind, DiagnosticKind::Parse);
}

#[test]
fn over_cap_pattern_in_a_batch_leaves_siblings_intact() {
    let sources = vec![
        pattern("user.save", &[]),
        PatternSource {
            rule: "rule_wide".into(),
            index: 1,
            snippet: "foo(1, 2, 3, 4, 5, 6, 7, 8, 9, 10)".into(),
            variables: vec![],
        },
        PatternSource {
            rule: "rule_0".into(),
            index: 2,
            snippet: "foo()".into(),
            variables: vec![],
        },
    ];
    let batch = compile_patterns(ruby(), &sources, &Config::default());

    assert_eq!(batch.compiled.len(), 2);
    assert_eq!(batch.diagnostics.len(), 1);
    let diag = &batch.diagnostics[0];
    assert_eq!(diag.rule, "rule_wide");
    assert_eq!(diag.index, 1);
    assert_eq!(diag.kind, DiagnosticKind::Capacity);
    assert!(diag.message.contains("cap is 20"), "message: {}", diag.message);
}

#[test]
fn batch_driver_warns_when_a_pattern_is_skipped() {
    let sources = vec![PatternSource {
        rule: "rule_broken".into(),
        index: 0,
        snippet: "def f(".into(),
        variables: vec![],
    }];
    let output = capture_logs(|| {
        let batch = compile_patterns(ruby(), &sources, &Config::default());
        assert!(batch.compiled.is_empty());
    });
    assert!(output.contains("pattern skipped"), "logs: {output}");
    assert!(output.contains("rule_broken"), "logs: {output}");
}

#[test]
fn compiled_pattern_writes_declared_rule_source() {
    let compiled = compile("treelogVarX.save", &[("X", "treelogVarX")]);
    let mut writer = SourceWriter::with_schema();
    compiled.write_to(&mut writer);
    let out = writer.finish();

    assert!(out.contains(".decl rule_0(a0: unsigned, a1: unsigned)"));
    assert!(out.contains(".output rule_0"));
    assert!(out.contains("rule_0(0, n0) :- "));
    // rule_variable is part of the base schema; no second declaration.
    assert_eq!(out.matches(".decl rule_variable").count(), 1);
    assert!(out.contains("rule_variable(n0, \"X\","));
}
