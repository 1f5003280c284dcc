//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use depgraph_core::{
    ident::Coordinate,
    rel::{RelationKind, Relationship},
};
use std::collections::BTreeSet;
use url::Url;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
pub fn central() -> Url {
    Url::parse("https://repo.example.org/central").unwrap()
}

#[allow(dead_code)]
pub fn coord(gav: &str) -> Coordinate {
    Coordinate::try_from(gav).unwrap()
}

#[allow(dead_code)]
pub fn dep(declaring: &str, target: &str, index: u32) -> Relationship {
    Relationship::new(
        RelationKind::dependency(),
        coord(declaring),
        coord(target),
        BTreeSet::from([central()]),
        index,
        false,
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn managed_dep(declaring: &str, target: &str, index: u32) -> Relationship {
    Relationship::new(
        RelationKind::dependency(),
        coord(declaring),
        coord(target),
        BTreeSet::from([central()]),
        index,
        true,
    )
    .unwrap()
}
