//! # depgraph-core
//!
//! A view-scoped dependency graph engine for build-artifact coordinates.
//!
//! depgraph-core ingests typed edges between project coordinates (group,
//! artifact, version, plus optional classifier/extension): direct and
//! managed dependencies, parents, BOM imports, plugins, plugin dependencies
//! and extensions. It answers structural queries about the resulting
//! multigraph: which projects are reachable from a set of roots under a
//! filter, which paths lead to a coordinate, where the cycles are, which
//! referenced projects were never declared, and which versions are still
//! variable.
//!
//! ## Overview
//!
//! Queries are scoped by a **view**: roots + filter + version-selection
//! policy. Registering a view materializes three caches against the store:
//! member nodes, crossed edges, and the full set of accepted root-to-node
//! paths, each annotated with the filter/selector state accumulated along
//! it. Repeated reachability queries are answered from those caches without
//! re-traversal; mutations mark affected views stale and the next query
//! folds the new edges in incrementally.
//!
//! ### Key Features
//!
//! - **Typed multigraph**: one edge kind per (relationship kind, managed)
//!   pair, so traversals and neighbor queries fetch exactly the edge types
//!   a filter can accept
//! - **Narrowing filters**: accepting an edge yields the child filter for
//!   everything below it, composable with `all_of`/`any_of`/`not`
//! - **Ad-hoc version selection**: per-view pins rewrite the effective
//!   graph through session-scoped *selection edges* while the underlying
//!   store is untouched; selections never leak into other views
//! - **Lazy cycle detection**: insertion never rejects; minimal cycles are
//!   collected on demand, cached per view, and their injector edges marked
//!   so cycle-avoiding traversals skip them outright
//! - **Store seam**: the engine drives any property-graph backend through
//!   the [`store::GraphStore`] trait; a complete in-memory implementation
//!   ships in the crate
//!
//! ## Quick Start
//!
//! ```rust
//! use depgraph_core::{
//!     engine::DepGraph,
//!     ident::Coordinate,
//!     rel::{RelationKind, Relationship},
//!     view::ViewParams,
//! };
//! use std::collections::BTreeSet;
//! use url::Url;
//!
//! fn main() -> Result<(), depgraph_core::DepGraphError> {
//!     let graph = DepGraph::in_memory();
//!     let repo = BTreeSet::from([Url::parse("https://repo.example.org/central").unwrap()]);
//!
//!     let app = Coordinate::new("org.acme", "app", "1.0");
//!     let lib = Coordinate::new("org.acme", "lib", "2.3");
//!     graph.add_relationships(&[Relationship::new(
//!         RelationKind::dependency(),
//!         app.clone(),
//!         lib.clone(),
//!         repo,
//!         0,
//!         false,
//!     )?])?;
//!
//!     let view = graph.register_view(ViewParams::new([app.clone()]))?;
//!     assert!(graph.all_projects(&view)?.contains(&lib));
//!     assert_eq!(graph.all_paths_to(&view, &[lib])?.len(), 1);
//!     graph.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`ident`]: coordinates and project keys
//! - [`rel`]: relationship values and the typed edge-kind projection
//! - [`filter`]: narrowing relationship filters and combinators
//! - [`path`]: graph paths, cycle paths, per-path traversal state
//! - [`selector`]: version-selection policies
//! - [`store`]: the store seam and the in-memory implementation
//! - [`traverse`]: the visitor-driven traversal engine
//! - [`update`]: concrete visitors (view updater, cycle collector, ...)
//! - [`view`]: view configuration, identity, and registration state
//! - [`engine`]: the [`engine::DepGraph`] facade tying it all together
//! - [`config`]: workspace-level defaults and properties
//!
//! ## Consistency Model
//!
//! Mutations serialize on a process-wide writer lock and run inside a
//! snapshot-scoped store transaction: partial failure restores the
//! pre-transaction state. Reads run concurrently and observe the last
//! committed state; a read that finds its view stale upgrades to the writer
//! side, folds pending edges into the caches, and downgrades again. Within
//! one view, an `add_relationships` followed by a query observes the new
//! edges; across views the caches are eventually consistent. Selection
//! edges are per-session and are discarded when the engine shuts down.

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ident;
pub mod path;
pub mod rel;
pub mod selector;
pub mod store;
#[cfg(test)]
mod tests;
pub mod traverse;
pub mod update;
pub mod view;

pub use error::*;
