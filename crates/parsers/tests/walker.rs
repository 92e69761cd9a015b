use parsers::{by_name, Step};

fn walk_kinds(source: &str, prune_at: Option<&str>) -> Vec<String> {
    let lang = by_name("ruby").expect("ruby");
    let tree = lang.parse(source).unwrap();
    let mut kinds = Vec::new();
    lang.walker
        .walk(tree.root_node(), source, &mut |node| {
            kinds.push(node.kind().to_string());
            if prune_at == Some(node.kind()) {
                Ok::<_, ()>(Step::prune())
            } else {
                Ok(Step::descend())
            }
        })
        .unwrap();
    kinds
}

#[test]
fn visits_every_named_node_in_preorder() {
    let kinds = walk_kinds("user.save\n", None);
    assert_eq!(kinds, ["program", "call", "identifier", "identifier"]);
}

#[test]
fn pruning_skips_strict_descendants_only() {
    let source = "def foo\n  bar.qux\nend\nbaz(2)\n";
    let kinds = walk_kinds(source, Some("method"));
    // The call inside the method body is skipped; the sibling call after
    // the method is still visited.
    assert_eq!(kinds.iter().filter(|k| *k == "call").count(), 1);
    assert!(kinds.contains(&"argument_list".to_string()));
    assert!(kinds.contains(&"integer".to_string()));
    assert_eq!(kinds.iter().filter(|k| *k == "method").count(), 1);
}

#[test]
fn consumed_children_are_not_revisited() {
    let lang = by_name("ruby").expect("ruby");
    let source = "user.save\n";
    let tree = lang.parse(source).unwrap();
    let mut kinds = Vec::new();
    lang.walker
        .walk(tree.root_node(), source, &mut |node| {
            kinds.push(node.kind().to_string());
            if node.kind() == "call" {
                let method = node.child_by_field_name("method").unwrap();
                Ok::<_, ()>(Step::descend_skipping(vec![method.id()]))
            } else {
                Ok(Step::descend())
            }
        })
        .unwrap();
    // Only the receiver identifier remains under the call.
    assert_eq!(kinds, ["program", "call", "identifier"]);
}

#[test]
fn callback_errors_propagate_immediately() {
    let lang = by_name("ruby").expect("ruby");
    let source = "user.save\n";
    let tree = lang.parse(source).unwrap();
    let mut visited = 0usize;
    let res = lang.walker.walk(tree.root_node(), source, &mut |node| {
        visited += 1;
        if node.kind() == "call" {
            Err("boom")
        } else {
            Ok(Step::descend())
        }
    });
    assert_eq!(res, Err("boom"));
    assert_eq!(visited, 2);
}

#[test]
fn walker_is_reusable_across_trees() {
    let lang = by_name("ruby").expect("ruby");
    for source in ["a = 1\n", "foo(2)\n"] {
        let tree = lang.parse(source).unwrap();
        let mut count = 0usize;
        lang.walker
            .walk(tree.root_node(), source, &mut |_| {
                count += 1;
                Ok::<_, ()>(Step::descend())
            })
            .unwrap();
        assert!(count > 2);
    }
}
