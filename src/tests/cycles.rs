//! Tests for lazy cycle detection and the cycle caches.

use super::helpers::*;
use crate::view::ViewParams;
use test_log::test;

#[test]
fn minimal_cycles_are_collected_and_cached() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0), dep("g:b:1", "g:a:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();

    let cycles = graph.get_cycles(&view).unwrap();
    assert_eq!(cycles.len(), 1);
    let cycle = &cycles[0];
    assert_eq!(cycle.len(), 2);
    // repeated endpoint: the cycle starts and ends at the same node
    assert_eq!(
        cycle.first().unwrap().declaring().gav(),
        cycle.last().unwrap().target().gav()
    );

    // second call answers from the cache
    let again = graph.get_cycles(&view).unwrap();
    assert_eq!(again.len(), 1);

    assert!(graph.is_cycle_participant(&view, &coord("g:a:1")).unwrap());
    assert!(graph.is_cycle_participant(&view, &coord("g:b:1")).unwrap());
    assert!(!graph.is_cycle_participant(&view, &coord("g:c:1")).unwrap());
}

#[test]
fn cycle_injectors_are_skipped_by_later_traversals() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0), dep("g:b:1", "g:a:1", 0)]);
    let first = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();
    graph.get_cycles(&first).unwrap();

    // the injector (b -> a) is now marked: a view registered afterwards
    // never crosses it
    let second = graph
        .register_view(ViewParams::new([coord("g:b:1")]))
        .unwrap();
    let rels = graph.all_relationships(&second).unwrap();
    assert!(rels.is_empty(), "the injector edge must not be re-traversed");
    let projects = graph.all_projects(&second).unwrap();
    assert_eq!(projects.len(), 1, "only the root is reachable");
}

#[test]
fn new_edges_reset_the_pending_flag() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();
    assert!(graph.get_cycles(&view).unwrap().is_empty());

    graph.add_relationships(&[dep("g:b:1", "g:a:1", 0)]).unwrap();
    let cycles = graph.get_cycles(&view).unwrap();
    assert_eq!(cycles.len(), 1, "the new back-edge surfaces lazily");
}

#[test]
fn introduces_cycle_answers_from_the_path_cache() {
    let graph = graph_with(&[dep("g:a:1", "g:b:1", 0), dep("g:b:1", "g:c:1", 0)]);
    let view = graph
        .register_view(ViewParams::new([coord("g:a:1")]))
        .unwrap();

    assert!(graph.introduces_cycle(&view, &dep("g:c:1", "g:a:1", 0)).unwrap());
    assert!(graph.introduces_cycle(&view, &dep("g:b:1", "g:a:1", 0)).unwrap());
    assert!(!graph.introduces_cycle(&view, &dep("g:c:1", "g:d:1", 0)).unwrap());

    // the rootless global view probes reachability instead
    let global = graph.global_view();
    assert!(graph.introduces_cycle(&global, &dep("g:c:1", "g:a:1", 0)).unwrap());
    assert!(!graph.introduces_cycle(&global, &dep("g:a:1", "g:c:1", 0)).unwrap());
}

#[test]
fn global_cycles_cover_every_component() {
    let graph = graph_with(&[
        dep("g:a:1", "g:b:1", 0),
        dep("g:b:1", "g:a:1", 0),
        dep("h:x:1", "h:y:1", 0),
        dep("h:y:1", "h:x:1", 0),
    ]);
    let global = graph.global_view();
    let cycles = graph.get_cycles(&global).unwrap();
    assert_eq!(cycles.len(), 2);
    for cycle in &cycles {
        assert_eq!(
            cycle.first().unwrap().declaring().gav(),
            cycle.last().unwrap().target().gav()
        );
    }
}
