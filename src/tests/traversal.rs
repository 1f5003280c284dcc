//! Tests for view materialization, cache maintenance and traversal.

use super::helpers::*;
use crate::{
    filter::{KindFilter, ScopeFilter},
    rel::{DependencyScope, RelationKind, Relationship},
    traverse::{GraphTraversal, Order},
    view::ViewParams,
};
use std::{collections::BTreeSet, sync::Arc};
use test_log::test;

#[test]
fn roots_are_cached_with_an_empty_path() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();

    let projects = graph.all_projects(&view).unwrap();
    assert!(projects.contains(&coord("g:a:1")), "root must be a member");

    // the root is reachable through its synthetic empty path
    let map = graph.path_map_targeting(&view, &[coord("g:a:1")]).unwrap();
    assert_eq!(map.len(), 1);
    let (path, info) = map.iter().next().unwrap();
    assert!(path.is_empty());
    assert_eq!(info.view(), &view);
}

#[test]
fn rootless_views_are_rejected() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0)]);
    let err = graph.register_view(ViewParams::new([])).unwrap_err();
    assert!(matches!(err, crate::DepGraphError::InvalidArgument(_)));
}

#[test]
fn cache_equals_traversed_edge_set() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:1", 0),
        dep("g:b:1", "g:c:1", 0),
        dep("g:x:1", "g:y:1", 0), // unreachable from a
    ]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();

    let projects = graph.all_projects(&view).unwrap();
    assert_eq!(
        projects,
        BTreeSet::from([coord("g:a:1"), coord("g:b:1"), coord("g:c:1")])
    );

    let rels = graph.all_relationships(&view).unwrap();
    assert_eq!(rels.len(), 2, "only edges on accepted paths are cached");
    assert!(rels.iter().all(|rel| rel.declaring().group() == "g"
        && rel.declaring().artifact() != "x"));
}

#[test]
fn adding_the_same_edge_twice_only_unions_sources() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();
    let before = graph.all_paths_to(&view, &[coord("g:b:1")]).unwrap();

    let again = dep("g:a:1", "g:b:1", 0).add_source(mirror());
    graph.add_relationships(&[again]).unwrap();

    let rels = graph.all_relationships(&view).unwrap();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].sources().len(), 2, "source URIs union on re-add");

    let after = graph.all_paths_to(&view, &[coord("g:b:1")]).unwrap();
    assert_eq!(before.len(), after.len(), "path cache is unchanged");
}

#[test]
fn views_fold_in_edges_added_after_registration() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();
    assert!(!graph
        .all_projects(&view)
        .unwrap()
        .contains(&coord("g:c:1")));

    graph.add_relationships(&[dep("g:b:1", "g:c:1", 0)]).unwrap();

    let projects = graph.all_projects(&view).unwrap();
    assert!(projects.contains(&coord("g:c:1")), "new edge is folded in");
    let paths = graph.all_paths_to(&view, &[coord("g:c:1")]).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 2);
}

#[test]
fn unrelated_additions_leave_membership_alone() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();

    graph.add_relationships(&[dep("g:x:1", "g:y:1", 0)]).unwrap();
    let projects = graph.all_projects(&view).unwrap();
    assert!(!projects.contains(&coord("g:x:1")));
    assert!(!projects.contains(&coord("g:y:1")));
}

#[test]
fn kind_filter_restricts_membership() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:1", 0),
        bom("g:a:1", "g:platform:1", 0),
    ]);
    let filter = KindFilter::of(&[RelationKind::dependency()], false, true);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]).with_filter(Arc::new(filter)))
        .unwrap();

    let projects = graph.all_projects(&view).unwrap();
    assert!(projects.contains(&coord("g:b:1")));
    assert!(
        !projects.contains(&coord("g:platform:1")),
        "BOM edge is outside the filtered kind set"
    );
}

#[test]
fn scope_filter_prunes_test_dependencies() {
    let test_dep = Relationship::new(
        RelationKind::Dependency {
            scope: DependencyScope::Test,
        },
        coord("g:a:1"),
        coord("g:testlib:1"),
        sources(),
        1,
        false,
    )
    .unwrap();
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0), test_dep]);
    let filter = ScopeFilter::new([DependencyScope::Compile, DependencyScope::Runtime], false);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]).with_filter(Arc::new(filter)))
        .unwrap();

    let projects = graph.all_projects(&view).unwrap();
    assert!(projects.contains(&coord("g:b:1")));
    assert!(!projects.contains(&coord("g:testlib:1")));
}

#[test]
fn direct_relationship_queries_respect_kind_switches() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:1", 0),
        managed_dep("g:a:1", "g:c:1", 1),
    ]);
    let global = graph.global_view();

    let concrete = graph
        .direct_relationships_from(&global, &coord("g:a:1"), false, true, &[])
        .unwrap();
    assert_eq!(concrete.len(), 1);
    assert_eq!(concrete[0].target().gav(), "g:b:1");

    let managed = graph
        .direct_relationships_from(&global, &coord("g:a:1"), true, false, &[])
        .unwrap();
    assert_eq!(managed.len(), 1);
    assert_eq!(managed[0].target().gav(), "g:c:1");

    let incoming = graph
        .direct_relationships_to(&global, &coord("g:b:1"), true, true, &[])
        .unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].declaring().gav(), "g:a:1");
}

#[test]
fn created_paths_round_trip_through_the_store() {
    let ab = dep("g:a:1", "g:b:1", 0);
    let bc = dep("g:b:1", "g:c:1", 0);
    let graph = graph_with(&[ab.clone(), bc.clone()]);

    let path = graph.create_path(&[ab.clone(), bc.clone()]).unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(graph.path_target(&path).unwrap(), coord("g:c:1"));

    let unknown = dep("g:a:1", "g:unknown:9", 5);
    assert!(graph.create_path(&[unknown]).is_err());

    // child paths store missing relationships on demand
    let cd = dep("g:c:1", "g:d:1", 0);
    let extended = graph.create_child_path(&path, &cd).unwrap();
    assert_eq!(extended.len(), 3);
    assert_eq!(graph.path_target(&extended).unwrap(), coord("g:d:1"));
}

#[test]
fn rooted_relationship_aggregation_without_a_view() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:1", 0),
        dep("g:b:1", "g:c:1", 0),
        dep("g:x:1", "g:y:1", 0),
    ]);
    let rels = graph.relationships_rooted_at(&[coord("g:a:1")]).unwrap();
    assert_eq!(rels.len(), 2);
}

#[derive(Default)]
struct CountingTraversal {
    passes: Vec<usize>,
    edges: Vec<String>,
}

impl GraphTraversal for CountingTraversal {
    fn required_passes(&self) -> usize {
        2
    }

    fn order(&self, pass: usize) -> Order {
        if pass == 0 {
            Order::BreadthFirst
        } else {
            Order::DepthFirst
        }
    }

    fn start_pass(&mut self, pass: usize) {
        self.passes.push(pass);
    }

    fn traverse_edge(
        &mut self,
        rel: &Relationship,
        _path: &[Relationship],
        _pass: usize,
    ) -> bool {
        // prune everything below c
        rel.declaring().artifact() != "c"
    }

    fn edge_traversed(&mut self, rel: &Relationship, _path: &[Relationship], pass: usize) {
        self.edges.push(format!("{pass}:{}", rel.target().gav()));
    }
}

#[test]
fn multi_pass_traversal_runs_each_pass_with_its_own_lifecycle() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:1", 0),
        dep("g:b:1", "g:c:1", 0),
        dep("g:c:1", "g:d:1", 0),
    ]);
    let global = graph.global_view();
    let mut traversal = CountingTraversal::default();
    graph
        .traverse(&global, &mut traversal, &coord("g:a:1"))
        .unwrap();

    assert_eq!(traversal.passes, vec![0, 1]);
    // both passes saw a->b and b->c; c->d was pruned
    let pass0: Vec<&String> = traversal.edges.iter().filter(|e| e.starts_with("0:")).collect();
    assert_eq!(pass0.len(), 2);
    let pass1: Vec<&String> = traversal.edges.iter().filter(|e| e.starts_with("1:")).collect();
    assert_eq!(pass1.len(), 2);
    assert!(!traversal.edges.iter().any(|e| e.ends_with("g:d:1")));
}

#[test]
fn variable_versions_are_tracked_per_view() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:[1.0,2.0)", 0),
        dep("g:x:1", "g:y:${ver}", 0),
    ]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();

    let variable = graph.variable_projects(&view).unwrap();
    assert_eq!(variable, BTreeSet::from([coord("g:b:[1.0,2.0)")]));

    let global = graph.global_view();
    assert_eq!(graph.variable_projects(&global).unwrap().len(), 2);
}
