//! End-to-end scenarios against the public engine API.

mod common;

use common::*;
use depgraph_core::{
    engine::DepGraph,
    ident::ProjectKey,
    rel::{RelationKind, Relationship},
    view::ViewParams,
};
use std::collections::BTreeSet;

/// A -> B -> C, accept-all view rooted at A: full reachability, one path to
/// C, nothing missing.
#[test]
fn transitive_reachability_from_a_root() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0), dep("org.acme:b:1", "org.acme:c:1", 0)])
        .unwrap();
    let view = graph
        .register_view(ViewParams::new([coord("org.acme:a:1")]))
        .unwrap();

    assert_eq!(
        graph.all_projects(&view).unwrap(),
        BTreeSet::from([
            coord("org.acme:a:1"),
            coord("org.acme:b:1"),
            coord("org.acme:c:1")
        ])
    );

    let paths = graph.all_paths_to(&view, &[coord("org.acme:c:1")]).unwrap();
    assert_eq!(paths.len(), 1);
    let rendered: Vec<String> = paths[0].iter().map(|rel| rel.to_string()).collect();
    assert_eq!(paths[0].len(), 2);
    assert!(rendered[0].contains("org.acme:a:1"), "path starts at the root");
    assert!(rendered[1].contains("org.acme:c:1"), "path ends at the target");

    assert!(graph.missing_projects(&view).unwrap().is_empty());
}

/// A -> B only: B is a member but missing and unconnected.
#[test]
fn referenced_but_undeclared_projects_are_missing() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0)])
        .unwrap();
    let view = graph
        .register_view(ViewParams::new([coord("org.acme:a:1")]))
        .unwrap();

    assert_eq!(
        graph.missing_projects(&view).unwrap(),
        BTreeSet::from([coord("org.acme:b:1")])
    );
    assert!(graph.contains_project(&view, &coord("org.acme:b:1")).unwrap());
    assert!(!graph.is_connected(&coord("org.acme:b:1")).unwrap());
    assert!(graph.is_connected(&coord("org.acme:a:1")).unwrap());
}

/// Two edges to different versions of B plus a selection pinning B to v2:
/// only v2 paths remain.
#[test]
fn version_selection_redirects_paths() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[
            dep("org.acme:a:1", "org.acme:b:1", 0),
            managed_dep("org.acme:a:1", "org.acme:b:2", 1),
        ])
        .unwrap();
    let view = graph
        .register_view(ViewParams::new([coord("org.acme:a:1")]))
        .unwrap();

    graph
        .register_view_selection(&view, &ProjectKey::new("org.acme", "b"), "2")
        .unwrap();

    let to_v2 = graph.all_paths_to(&view, &[coord("org.acme:b:2")]).unwrap();
    assert!(!to_v2.is_empty());
    for path in &to_v2 {
        assert_eq!(path.last().unwrap().target().version(), "2");
    }
    assert!(graph
        .all_paths_to(&view, &[coord("org.acme:b:1")])
        .unwrap()
        .is_empty());
}

/// A -> B -> A: one minimal cycle, both nodes participate.
#[test]
fn two_node_cycle_is_reported_once() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[
            dep("org.acme:a:1", "org.acme:b:1", 0),
            dep("org.acme:b:1", "org.acme:a:1", 0),
        ])
        .unwrap();
    let view = graph
        .register_view(ViewParams::new([coord("org.acme:a:1")]))
        .unwrap();

    let cycles = graph.get_cycles(&view).unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 2);
    assert_eq!(
        cycles[0].first().unwrap().declaring().gav(),
        cycles[0].last().unwrap().target().gav(),
        "a cycle starts and ends at the same project"
    );
    assert!(graph
        .is_cycle_participant(&view, &coord("org.acme:a:1"))
        .unwrap());
}

/// Deleting A's declarations returns A to the missing set and empties the
/// view.
#[test]
fn deleting_declarations_resets_membership() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0)])
        .unwrap();
    let view = graph
        .register_view(ViewParams::new([coord("org.acme:a:1")]))
        .unwrap();
    assert_eq!(graph.all_relationships(&view).unwrap().len(), 1);

    graph
        .delete_relationships_declared_by(&coord("org.acme:a:1"))
        .unwrap();

    let global = graph.global_view();
    assert_eq!(
        graph.missing_projects(&global).unwrap(),
        BTreeSet::from([coord("org.acme:a:1"), coord("org.acme:b:1")])
    );
    assert!(graph.all_relationships(&view).unwrap().is_empty());
    assert_eq!(
        graph.all_projects(&view).unwrap(),
        BTreeSet::from([coord("org.acme:a:1")]),
        "only the root survives re-materialization"
    );
}

/// BOM edges are concrete, unmanaged, and expose the target's POM artifact;
/// endpoint substitution preserves everything else.
#[test]
fn bom_relationships_are_structural() {
    init_logging();
    let p = coord("org.acme:p:1");
    let q = coord("org.acme:q:2");
    let bom = Relationship::new(
        RelationKind::Bom,
        p.clone(),
        q.clone(),
        BTreeSet::from([central()]),
        4,
        true, // forced concrete regardless
    )
    .unwrap();

    assert!(bom.concrete());
    assert!(!bom.managed());
    let artifact = bom.target_artifact();
    assert_eq!(artifact.extension(), Some("pom"));
    assert_eq!(artifact.gav(), q.gav());

    let p2 = coord("org.acme:p2:1");
    let moved = bom.select_declaring(p2.clone());
    assert_eq!(moved.declaring(), &p2);
    assert_eq!(moved.target(), &q);
    assert_eq!(moved.index(), 4);
    assert_eq!(moved.sources(), bom.sources());

    // a BOM edge participates in view traversal like any structural edge
    let graph = DepGraph::in_memory();
    graph.add_relationships(&[bom]).unwrap();
    let view = graph.register_view(ViewParams::new([p])).unwrap();
    assert!(graph.contains_project(&view, &q).unwrap());
}
