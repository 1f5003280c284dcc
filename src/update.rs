//! Concrete traversal visitors.
//!
//! Each visitor here is one implementation of the
//! [`TraverseVisitor`](crate::traverse::TraverseVisitor) capability set:
//! [`ViewUpdater`] populates and extends a view's caches, [`CycleCollector`]
//! records minimal cycles and marks their injectors, [`PathExistenceVisitor`]
//! probes reachability, [`RootedRelationshipsVisitor`] aggregates the edge
//! set reachable from a view's roots, and [`TraversalDriver`] bridges the
//! engine's multi-pass `traverse` entry point.

use std::collections::BTreeSet;

use crate::{
    error::DepGraphError,
    path::{CyclePath, GraphPath, PathInfo},
    rel::Relationship,
    store::{GraphStore, Nid, Rid},
    traverse::{GraphTraversal, TraverseVisitor},
    view::ViewId,
};

/// Populates a view's caches with every accepted path.
///
/// Seeds passed to the traversal and paths cached during the current run
/// are exempt from the seen check; anything cached by an earlier run is
/// pruned, which keeps re-traversal incremental (new edges hang off nodes
/// that have their own seed paths).
#[derive(Debug)]
pub struct ViewUpdater {
    view: ViewId,
    seeds: BTreeSet<GraphPath>,
    fresh: BTreeSet<GraphPath>,
}

impl ViewUpdater {
    pub fn new(view: ViewId, seeds: BTreeSet<GraphPath>) -> Self {
        ViewUpdater {
            view,
            seeds,
            fresh: BTreeSet::new(),
        }
    }
}

impl<S: GraphStore> TraverseVisitor<S> for ViewUpdater {
    fn has_seen(&mut self, store: &S, path: &GraphPath, _info: &PathInfo) -> bool {
        if self.seeds.contains(path) || self.fresh.contains(path) {
            return false;
        }
        store
            .view_cache(&self.view)
            .map(|cache| cache.contains_path(path))
            .unwrap_or(false)
    }

    fn including_child(
        &mut self,
        store: &mut S,
        _rid: Rid,
        path: &GraphPath,
        info: &PathInfo,
        _parent: &GraphPath,
    ) -> Result<(), DepGraphError> {
        let pre_existing = store
            .view_cache(&self.view)
            .map(|cache| cache.contains_path(path))
            .unwrap_or(false);
        if pre_existing {
            // cached by an earlier run; its subtree is already complete
            return Ok(());
        }

        let mut touched: Vec<Nid> = Vec::with_capacity(path.len() + 1);
        for (idx, rid) in path.iter().enumerate() {
            let Some((from, to)) = store.endpoints(rid) else {
                return Err(DepGraphError::NotFound(format!(
                    "Cached path {path} references unknown edge {rid}"
                )));
            };
            if idx == 0 {
                touched.push(from);
            }
            touched.push(to);
        }
        let Some(target) = touched.last().copied() else {
            return Ok(());
        };
        tracing::debug!("caching path {} for view {}", path, self.view);
        self.fresh.insert(path.clone());
        store
            .view_cache_mut(&self.view)
            .cache_path(path.clone(), info.clone(), &touched, target);
        Ok(())
    }
}

/// Collects minimal in-progress cycles and marks each injector edge so that
/// later cycle-avoiding traversals skip it without re-deriving the cycle.
#[derive(Debug, Default)]
pub struct CycleCollector {
    cycles: Vec<CyclePath>,
}

impl CycleCollector {
    pub fn new() -> Self {
        CycleCollector::default()
    }

    pub fn into_cycles(self) -> Vec<CyclePath> {
        self.cycles
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }
}

impl<S: GraphStore> TraverseVisitor<S> for CycleCollector {
    fn including_child(
        &mut self,
        _store: &mut S,
        _rid: Rid,
        _path: &GraphPath,
        _info: &PathInfo,
        _parent: &GraphPath,
    ) -> Result<(), DepGraphError> {
        Ok(())
    }

    fn cycle_detected(
        &mut self,
        store: &mut S,
        cycle: &CyclePath,
    ) -> Result<(), DepGraphError> {
        // the same loop entered elsewhere is not a new cycle
        if self
            .cycles
            .iter()
            .all(|known| known.loop_key() != cycle.loop_key())
        {
            store.mark_cycle_injected(cycle.injector);
            self.cycles.push(cycle.clone());
        }
        Ok(())
    }
}

/// Answers "is `target` reachable from the seeds"; stops expanding once the
/// answer is yes.
#[derive(Debug)]
pub struct PathExistenceVisitor {
    target: Nid,
    found: bool,
}

impl PathExistenceVisitor {
    pub fn new(target: Nid) -> Self {
        PathExistenceVisitor {
            target,
            found: false,
        }
    }

    pub fn found(&self) -> bool {
        self.found
    }
}

impl<S: GraphStore> TraverseVisitor<S> for PathExistenceVisitor {
    fn include_children(&mut self, _store: &S, _path: &GraphPath, _info: &PathInfo) -> bool {
        !self.found
    }

    fn including_child(
        &mut self,
        store: &mut S,
        rid: Rid,
        _path: &GraphPath,
        _info: &PathInfo,
        _parent: &GraphPath,
    ) -> Result<(), DepGraphError> {
        if let Some((_, to)) = store.endpoints(rid) {
            if to == self.target {
                self.found = true;
            }
        }
        Ok(())
    }
}

/// Aggregates every accepted edge reachable from the seeds. Used for
/// rootful views that have no materialized cache.
#[derive(Debug, Default)]
pub struct RootedRelationshipsVisitor {
    rels: BTreeSet<Rid>,
}

impl RootedRelationshipsVisitor {
    pub fn new() -> Self {
        RootedRelationshipsVisitor::default()
    }

    pub fn into_relationships(self) -> BTreeSet<Rid> {
        self.rels
    }
}

impl<S: GraphStore> TraverseVisitor<S> for RootedRelationshipsVisitor {
    fn including_child(
        &mut self,
        _store: &mut S,
        rid: Rid,
        _path: &GraphPath,
        _info: &PathInfo,
        _parent: &GraphPath,
    ) -> Result<(), DepGraphError> {
        self.rels.insert(rid);
        Ok(())
    }
}

/// Bridges one pass of a [`GraphTraversal`] onto the engine walk: each
/// accepted edge is offered to the consumer, which can prune expansion below
/// it.
#[derive(Debug)]
pub struct TraversalDriver<'a, T: GraphTraversal> {
    traversal: &'a mut T,
    pass: usize,
    stopped: BTreeSet<GraphPath>,
}

impl<'a, T: GraphTraversal> TraversalDriver<'a, T> {
    pub fn new(traversal: &'a mut T, pass: usize) -> Self {
        TraversalDriver {
            traversal,
            pass,
            stopped: BTreeSet::new(),
        }
    }
}

impl<S: GraphStore, T: GraphTraversal> TraverseVisitor<S> for TraversalDriver<'_, T> {
    fn include_children(&mut self, _store: &S, path: &GraphPath, _info: &PathInfo) -> bool {
        !self.stopped.contains(path)
    }

    fn including_child(
        &mut self,
        store: &mut S,
        rid: Rid,
        path: &GraphPath,
        _info: &PathInfo,
        _parent: &GraphPath,
    ) -> Result<(), DepGraphError> {
        let rels: Vec<Relationship> = path
            .iter()
            .filter_map(|r| store.edge(r).map(|record| record.rel.clone()))
            .collect();
        let Some(rel) = store.edge(rid).map(|record| record.rel.clone()) else {
            return Ok(());
        };
        if self.traversal.traverse_edge(&rel, &rels, self.pass) {
            self.traversal.edge_traversed(&rel, &rels, self.pass);
        } else {
            self.stopped.insert(path.clone());
        }
        Ok(())
    }
}
