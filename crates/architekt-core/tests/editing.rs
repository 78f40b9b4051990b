//! Property tests over random editing sequences.

use std::collections::HashSet;

use proptest::prelude::*;

use architekt_core::{Catalog, Diagram, Editor, Position, Selection};

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Connect(usize, usize),
    DeleteNode(usize),
    DeleteEdge(usize),
    SelectNode(usize),
    SelectEdge(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..14).prop_map(Op::Add),
        3 => (0usize..32, 0usize..32).prop_map(|(a, b)| Op::Connect(a, b)),
        1 => (0usize..32).prop_map(Op::DeleteNode),
        1 => (0usize..32).prop_map(Op::DeleteEdge),
        1 => (0usize..32).prop_map(Op::SelectNode),
        1 => (0usize..32).prop_map(Op::SelectEdge),
    ]
}

fn pick<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        items.get(index % items.len())
    }
}

fn apply(editor: &mut Editor, op: &Op) {
    let node_ids: Vec<String> = editor.diagram().nodes.iter().map(|n| n.id.clone()).collect();
    let edge_ids: Vec<String> = editor.diagram().edges.iter().map(|e| e.id.clone()).collect();
    match op {
        Op::Add(n) => {
            let tags: Vec<&str> = Catalog::builtin().type_tags().collect();
            let tag = tags[n % tags.len()];
            editor.add_node(tag, Position::new(*n as f64, 0.0)).unwrap();
        }
        Op::Connect(a, b) => {
            if let (Some(a), Some(b)) = (pick(&node_ids, *a), pick(&node_ids, *b)) {
                editor.connect(a, b).unwrap();
            }
        }
        Op::DeleteNode(n) => {
            if let Some(id) = pick(&node_ids, *n) {
                editor.delete_node(id).unwrap();
            }
        }
        Op::DeleteEdge(n) => {
            if let Some(id) = pick(&edge_ids, *n) {
                editor.delete_edge(id).unwrap();
            }
        }
        Op::SelectNode(n) => {
            if let Some(id) = pick(&node_ids, *n) {
                editor.select(Selection::Node(id.clone())).unwrap();
            }
        }
        Op::SelectEdge(n) => {
            if let Some(id) = pick(&edge_ids, *n) {
                editor.select(Selection::Edge(id.clone())).unwrap();
            }
        }
    }
}

fn check_consistent(editor: &Editor) -> Result<(), TestCaseError> {
    let diagram: &Diagram = editor.diagram();
    let nodes: HashSet<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();
    prop_assert_eq!(nodes.len(), diagram.nodes.len(), "node ids must be unique");

    let edges: HashSet<&str> = diagram.edges.iter().map(|e| e.id.as_str()).collect();
    prop_assert_eq!(edges.len(), diagram.edges.len(), "edge ids must be unique");
    prop_assert!(nodes.is_disjoint(&edges), "node and edge ids share one counter");

    for edge in &diagram.edges {
        prop_assert!(nodes.contains(edge.source.as_str()), "dangling source on {}", edge.id);
        prop_assert!(nodes.contains(edge.target.as_str()), "dangling target on {}", edge.id);
    }

    match editor.selection() {
        Selection::Node(id) => prop_assert!(nodes.contains(id.as_str())),
        Selection::Edge(id) => prop_assert!(edges.contains(id.as_str())),
        Selection::None => {}
    }
    Ok(())
}

proptest! {
    #[test]
    fn edits_never_leave_dangling_references(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut editor = Editor::new();
        for op in &ops {
            apply(&mut editor, op);
            check_consistent(&editor)?;
        }
    }

    #[test]
    fn delete_node_removes_exactly_its_edges(ops in prop::collection::vec(op_strategy(), 1..40), victim in 0usize..32) {
        let mut editor = Editor::new();
        for op in &ops {
            apply(&mut editor, op);
        }
        let before = editor.diagram().clone();
        let Some(node) = pick(&before.nodes, victim) else {
            return Ok(());
        };

        let (removed, cascaded) = editor.delete_node(&node.id).unwrap();
        prop_assert_eq!(&removed.id, &node.id);

        let expected: Vec<_> = before.edges.iter().filter(|e| e.touches(&node.id)).cloned().collect();
        prop_assert_eq!(cascaded, expected);

        let survivors: Vec<_> = before.edges.iter().filter(|e| !e.touches(&node.id)).cloned().collect();
        prop_assert_eq!(&editor.diagram().edges, &survivors);
        prop_assert_eq!(editor.diagram().nodes.len(), before.nodes.len() - 1);
    }

    #[test]
    fn export_then_import_restores_the_diagram(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut editor = Editor::new();
        for op in &ops {
            apply(&mut editor, op);
        }
        let exported = editor.export().unwrap();

        let mut other = Editor::new();
        let issues = other.import(&exported).unwrap();
        prop_assert!(issues.is_empty());
        prop_assert_eq!(other.diagram(), editor.diagram());

        // Fresh ids in the importing session never collide with carried ones.
        if let Some(first) = other.diagram().nodes.first().map(|n| n.id.clone()) {
            let added = other.add_node("cache", Position::default()).unwrap().id.clone();
            prop_assert!(editor.diagram().node(&added).is_none());
            let edge = other.connect(&first, &added).unwrap().id.clone();
            prop_assert!(editor.diagram().edge(&edge).is_none());
        }
    }
}
