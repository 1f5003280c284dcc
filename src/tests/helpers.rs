//! Shared builders for engine tests.

use std::collections::BTreeSet;
use url::Url;

use crate::{
    engine::DepGraph,
    ident::Coordinate,
    rel::{RelationKind, Relationship},
};

pub fn central() -> Url {
    Url::parse("https://repo.example.org/central").unwrap()
}

pub fn mirror() -> Url {
    Url::parse("https://mirror.example.org/repo").unwrap()
}

pub fn sources() -> BTreeSet<Url> {
    BTreeSet::from([central()])
}

pub fn coord(gav: &str) -> Coordinate {
    Coordinate::try_from(gav).unwrap()
}

pub fn dep(declaring: &str, target: &str, index: u32) -> Relationship {
    Relationship::new(
        RelationKind::dependency(),
        coord(declaring),
        coord(target),
        sources(),
        index,
        false,
    )
    .unwrap()
}

pub fn managed_dep(declaring: &str, target: &str, index: u32) -> Relationship {
    Relationship::new(
        RelationKind::dependency(),
        coord(declaring),
        coord(target),
        sources(),
        index,
        true,
    )
    .unwrap()
}

pub fn parent(declaring: &str, target: &str) -> Relationship {
    Relationship::new(
        RelationKind::Parent,
        coord(declaring),
        coord(target),
        sources(),
        0,
        false,
    )
    .unwrap()
}

pub fn bom(declaring: &str, target: &str, index: u32) -> Relationship {
    Relationship::new(
        RelationKind::Bom,
        coord(declaring),
        coord(target),
        sources(),
        index,
        false,
    )
    .unwrap()
}

pub fn graph_with(rels: &[Relationship]) -> DepGraph {
    let graph = DepGraph::in_memory();
    graph
        .add_relationships(rels)
        .expect("test relationships to be accepted");
    graph
}
