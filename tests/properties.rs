//! Property tests: the ancestor index always matches reachability, and the
//! graph never accepts an edge that closes a cycle.

use std::collections::HashSet;

use proptest::prelude::*;
use recipe_dag::{CompositionGraph, ProductId, ProductName};

/// Products reachable downward from `start` in a plain adjacency model
fn reachable(edges: &HashSet<(usize, usize)>, start: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for &(from, to) in edges {
            if from == node && seen.insert(to) {
                stack.push(to);
            }
        }
    }
    seen
}

fn build(count: usize) -> (CompositionGraph, Vec<ProductId>) {
    let mut graph = CompositionGraph::new();
    let ids = (0..count)
        .map(|i| graph.add_product(ProductName::new(format!("P{}", i))))
        .collect();
    (graph, ids)
}

fn edge_list() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..10).prop_flat_map(|count| {
        (
            Just(count),
            proptest::collection::vec((0..count, 0..count), 0..40),
        )
    })
}

proptest! {
    #[test]
    fn ancestors_match_reachability((count, attempts) in edge_list()) {
        let (mut graph, ids) = build(count);
        let mut edges = HashSet::new();

        for (parent, child) in attempts {
            if graph.add_child(ids[parent], ids[child]).unwrap() {
                edges.insert((parent, child));
            }
        }

        for node in 0..count {
            let expected: HashSet<ProductId> = (0..count)
                .filter(|&other| reachable(&edges, other).contains(&node))
                .map(|other| ids[other])
                .collect();
            prop_assert_eq!(graph.ancestors(ids[node]).unwrap(), &expected);
        }
        prop_assert!(graph.verify_ancestor_index().is_ok());
        prop_assert!(graph.topological_order().is_ok());
    }

    #[test]
    fn rejects_exactly_the_cycle_closing_edges((count, attempts) in edge_list()) {
        let (mut graph, ids) = build(count);
        let mut edges = HashSet::new();

        for (parent, child) in attempts {
            let closes_cycle = parent == child || reachable(&edges, child).contains(&parent);
            let accepted = graph.add_child(ids[parent], ids[child]).unwrap();

            prop_assert_eq!(accepted, !closes_cycle);
            if accepted {
                edges.insert((parent, child));
            }
        }
        prop_assert_eq!(graph.edge_count(), edges.len());
    }

    #[test]
    fn ancestor_sets_only_grow((count, attempts) in edge_list()) {
        let (mut graph, ids) = build(count);

        for (parent, child) in attempts {
            let before: Vec<HashSet<ProductId>> = ids
                .iter()
                .map(|&id| graph.ancestors(id).unwrap().clone())
                .collect();

            graph.add_child(ids[parent], ids[child]).unwrap();

            for (i, &id) in ids.iter().enumerate() {
                prop_assert!(before[i].is_subset(graph.ancestors(id).unwrap()));
            }
        }
    }
}
