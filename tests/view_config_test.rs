//! Metadata, provenance gating, and workspace/view configuration.

mod common;

use common::*;
use depgraph_core::{
    engine::DepGraph,
    ident::ProjectKey,
    view::ViewParams,
    DepGraphError,
};
use std::collections::BTreeMap;
use url::Url;

#[test]
fn metadata_round_trips_and_indexes() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0)])
        .unwrap();
    let a = coord("org.acme:a:1");

    graph.add_metadata(&a, "build-id", "42").unwrap();
    graph.add_metadata(&a, "owner", "platform").unwrap();
    assert_eq!(
        graph.get_metadata(&a).unwrap().get("build-id"),
        Some(&"42".to_string())
    );
    assert_eq!(
        graph.get_metadata_keys(&a, &["owner"]).unwrap().len(),
        1
    );

    let view = graph.register_view(ViewParams::new([a.clone()])).unwrap();
    let tagged = graph.projects_with_metadata(&view, "owner").unwrap();
    assert!(tagged.contains(&a));
    assert!(graph
        .projects_with_metadata(&view, "nonexistent")
        .unwrap()
        .is_empty());

    // replacing the map drops stale index entries
    graph
        .set_metadata(&a, BTreeMap::from([("owner".to_string(), "infra".to_string())]))
        .unwrap();
    assert!(graph
        .projects_with_metadata(&view, "build-id")
        .unwrap()
        .is_empty());

    graph.reindex().unwrap();
    assert!(graph.projects_with_metadata(&view, "owner").unwrap().contains(&a));

    let err = graph.get_metadata(&coord("org.acme:ghost:1")).unwrap_err();
    assert!(matches!(err, DepGraphError::NotFound(_)));
}

#[test]
fn active_sources_gate_edge_acceptance() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0)])
        .unwrap();

    // a view restricted to a source the edge does not carry sees no edges
    let foreign = Url::parse("https://other.example.org/repo").unwrap();
    let view = graph
        .register_view(
            ViewParams::new([coord("org.acme:a:1")]).with_active_sources([foreign]),
        )
        .unwrap();
    assert!(graph.all_relationships(&view).unwrap().is_empty());

    // widening to the edge's source restores visibility
    graph
        .add_active_sources(Some(&view), [central()])
        .unwrap();
    assert_eq!(graph.all_relationships(&view).unwrap().len(), 1);
    assert_eq!(graph.active_sources(Some(&view)).unwrap().len(), 2);
}

#[test]
fn workspace_and_view_properties_are_independent() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0)])
        .unwrap();
    let view = graph
        .register_view(ViewParams::new([coord("org.acme:a:1")]))
        .unwrap();

    graph.set_property(None, "cache-dir", "/var/graph").unwrap();
    graph.set_property(Some(&view), "label", "release-audit").unwrap();

    assert_eq!(
        graph.get_property(None, "cache-dir").unwrap(),
        Some("/var/graph".to_string())
    );
    assert_eq!(graph.get_property(Some(&view), "cache-dir").unwrap(), None);
    assert_eq!(
        graph.get_property(Some(&view), "label").unwrap(),
        Some("release-audit".to_string())
    );

    graph.remove_property(Some(&view), "label").unwrap();
    assert_eq!(graph.get_property(Some(&view), "label").unwrap(), None);

    graph.set_last_access(None, 1_706_000_000_000).unwrap();
    graph.set_last_access(Some(&view), 1_706_000_000_500).unwrap();
    assert_eq!(graph.last_access(None).unwrap(), Some(1_706_000_000_000));
    assert_eq!(
        graph.last_access(Some(&view)).unwrap(),
        Some(1_706_000_000_500)
    );
}

#[test]
fn extension_queries_require_rootless_clauses() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(&[dep("org.acme:a:1", "org.acme:b:1", 0)])
        .unwrap();

    let err = graph
        .execute_from("START n=node(*) MATCH (n)-->(m) RETURN m", &[coord("org.acme:a:1")])
        .unwrap_err();
    assert!(matches!(err, DepGraphError::InvalidArgument(_)));

    // the in-memory store has no query engine; valid forms surface that
    let err = graph
        .execute_from("MATCH (n)-->(m) RETURN m", &[coord("org.acme:a:1")])
        .unwrap_err();
    assert!(matches!(err, DepGraphError::Driver(_)));
}

#[test]
fn managed_overrides_resolve_along_a_path() {
    init_logging();
    let graph = DepGraph::in_memory();
    let ab = dep("org.acme:a:1", "org.acme:b:1", 0);
    graph
        .add_relationships(&[
            ab.clone(),
            managed_dep("org.acme:a:1", "org.acme:c:9", 1),
            dep("org.acme:b:1", "org.acme:c:1", 0),
        ])
        .unwrap();

    let path = graph.create_path(&[ab]).unwrap();
    let managed = graph
        .managed_target_for(
            &ProjectKey::new("org.acme", "c"),
            &path,
            &depgraph_core::rel::RelationKind::dependency(),
        )
        .unwrap();
    assert_eq!(managed, Some(coord("org.acme:c:9")));

    let absent = graph
        .managed_target_for(
            &ProjectKey::new("org.acme", "zz"),
            &path,
            &depgraph_core::rel::RelationKind::dependency(),
        )
        .unwrap();
    assert_eq!(absent, None);
}

#[test]
fn disconnected_projects_and_matching_versions() {
    init_logging();
    let graph = DepGraph::in_memory();
    graph.add_disconnected_project(&coord("org.acme:solo:1")).unwrap();
    graph
        .add_relationships(&[
            dep("org.acme:a:1", "org.acme:solo:2", 0),
        ])
        .unwrap();

    let versions = graph
        .projects_matching(&ProjectKey::new("org.acme", "solo"))
        .unwrap();
    assert_eq!(versions.len(), 2);

    let global = graph.global_view();
    assert!(graph.contains_project(&global, &coord("org.acme:solo:1")).unwrap());
    assert!(graph.is_missing(&coord("org.acme:solo:1")).unwrap());
}
