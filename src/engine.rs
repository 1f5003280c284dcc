//! The engine facade.
//!
//! [`DepGraph`] owns the store handle behind a coarse read/write lock:
//! mutating operations serialize on the write side and run inside a
//! snapshot-scoped transaction (commit on success, restore on error), while
//! queries share the read side and lazily materialize view caches when a
//! mutation has left them stale.
//!
//! Shutdown discards all selection edges (they are per-session) and marks
//! the store closed; every later call fails with
//! [`DepGraphError::StoreClosed`].

use enumset::EnumSet;
use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{
    config::WorkspaceConfig,
    error::DepGraphError,
    ident::{Coordinate, ProjectKey},
    path::{CyclePath, GraphPath, PathInfo},
    rel::{EdgeKind, RelationKind, Relationship},
    store::{GraphStore, MemoryStore, Nid, QueryRow, Rid},
    traverse::{
        collect, Direction, EdgeSelect, GraphTraversal, PassthroughSelect, Seed, TraversalSpec,
        Uniqueness,
    },
    update::{
        CycleCollector, PathExistenceVisitor, RootedRelationshipsVisitor, TraversalDriver,
        ViewUpdater,
    },
    view::{ViewId, ViewParams, ViewState},
};

/// Node/edge counts, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug)]
struct Inner<S: GraphStore> {
    store: S,
    closed: bool,
    config: WorkspaceConfig,
    views: BTreeMap<ViewId, ViewState>,
    /// Per view: new edges not yet folded into its caches.
    pending: BTreeMap<ViewId, Vec<Rid>>,
    global_cycles: Vec<CyclePath>,
    global_cycle_pending: bool,
}

impl<S: GraphStore> Inner<S> {
    fn ensure_open(&self) -> Result<(), DepGraphError> {
        if self.closed {
            Err(DepGraphError::StoreClosed)
        } else {
            Ok(())
        }
    }

    fn view_state(&self, view: &ViewId) -> Result<&ViewState, DepGraphError> {
        self.views
            .get(view)
            .ok_or_else(|| DepGraphError::NotFound(format!("No registered view '{view}'")))
    }

    fn view_state_mut(&mut self, view: &ViewId) -> Result<&mut ViewState, DepGraphError> {
        self.views
            .get_mut(view)
            .ok_or_else(|| DepGraphError::NotFound(format!("No registered view '{view}'")))
    }

    fn global_params(&self) -> ViewParams {
        ViewParams::new([])
    }

    fn node_of(&self, coord: &Coordinate) -> Option<Nid> {
        self.store.node_by_gav(&coord.gav())
    }

    fn coord_of(&self, nid: Nid) -> Option<Coordinate> {
        self.store.node(nid).map(|record| record.coord.clone())
    }

    fn rel_of(&self, rid: Rid) -> Option<Relationship> {
        self.store.edge(rid).map(|record| record.rel.clone())
    }

    fn rels_of(&self, rids: impl IntoIterator<Item = Rid>) -> Vec<Relationship> {
        rids.into_iter().filter_map(|rid| self.rel_of(rid)).collect()
    }

    fn render_path(&self, path: &GraphPath) -> Vec<Relationship> {
        self.rels_of(path.iter())
    }

    fn render_cycle(&self, cycle: &CyclePath) -> Vec<Relationship> {
        self.rels_of(cycle.rids())
    }

    /// Whether a stale cache requires write access before answering a query
    /// against this view.
    fn needs_materialization(&self, view: &ViewId) -> bool {
        if view.is_global() || !self.views.contains_key(view) {
            return false;
        }
        self.store.view_cache(view).is_none()
            || self.pending.get(view).map(|p| !p.is_empty()).unwrap_or(false)
    }
}

/// Selection hook applied during view traversals: ad-hoc view selections
/// take precedence, then the path's selector policy. Substitutes are
/// resolved against the store or materialized as selection edges.
struct ViewSelect<'a> {
    view: &'a ViewId,
    selections: &'a BTreeMap<ProjectKey, String>,
}

impl<S: GraphStore> EdgeSelect<S> for ViewSelect<'_> {
    fn select(
        &self,
        store: &mut S,
        rid: Rid,
        info: &PathInfo,
        path: &GraphPath,
    ) -> Result<Option<Rid>, DepGraphError> {
        let Some(rel) = store.edge(rid).map(|record| record.rel.clone()) else {
            return Ok(None);
        };

        let pinned = self.selections.get(&rel.target().key()).and_then(|version| {
            if rel.target().version() == version {
                None
            } else {
                Some(rel.select_target(rel.target().with_version(version.clone())))
            }
        });
        let desired = match pinned {
            Some(substitute) => Some(substitute),
            None => info.selector().select(&rel, path),
        };

        match desired {
            None => Ok(None),
            Some(selected) if selected == rel => Ok(Some(rid)),
            Some(selected) => {
                tracing::debug!("selecting substitute for {}: {}", rel, selected);
                if let Some(existing) = store.edge_by_key(&selected.key()) {
                    return Ok(Some(existing));
                }

                // a substitute that targets a node already on this path
                // would close a cycle the moment it is followed
                let mut on_path: BTreeSet<Nid> = BTreeSet::new();
                for prior in path.iter() {
                    if let Some((from, to)) = store.endpoints(prior) {
                        on_path.insert(from);
                        on_path.insert(to);
                    }
                }
                if let Some(target_nid) = store.node_by_gav(&selected.target().gav()) {
                    if on_path.contains(&target_nid) {
                        return Err(DepGraphError::SelectionConflict(format!(
                            "Selection edge {selected} would introduce a cycle"
                        )));
                    }
                }

                let from = store.create_node(selected.declaring())?;
                let to = store.create_node(selected.target())?;
                let new_rid = store.create_edge(&selected, from, to)?;
                store.mark_connected(from);
                store.set_selection(new_rid, true);
                store.view_cache_mut(self.view).insert_node(to);
                tracing::debug!("created ad-hoc selection edge {} for {}", new_rid, selected);
                Ok(Some(new_rid))
            }
        }
    }
}

/// View-scoped dependency graph engine.
///
/// Generic over the consumed [`GraphStore`]; [`DepGraph::in_memory`] wires
/// up the bundled [`MemoryStore`].
pub struct DepGraph<S: GraphStore = MemoryStore> {
    inner: RwLock<Inner<S>>,
}

impl DepGraph<MemoryStore> {
    pub fn in_memory() -> Self {
        DepGraph::new(MemoryStore::new(), WorkspaceConfig::default())
    }
}

impl<S: GraphStore> DepGraph<S> {
    pub fn new(store: S, config: WorkspaceConfig) -> Self {
        DepGraph {
            inner: RwLock::new(Inner {
                store,
                closed: false,
                config,
                views: BTreeMap::new(),
                pending: BTreeMap::new(),
                global_cycles: Vec::new(),
                global_cycle_pending: false,
            }),
        }
    }

    /// The reserved rootless view. Queries against it bypass the per-view
    /// caches and see the whole store.
    pub fn global_view(&self) -> ViewId {
        ViewId::global()
    }

    // ------------------------------------------------------------------
    // lifecycle

    /// Discard all selection edges and close the store. Idempotent.
    pub fn close(&self) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Ok(());
        }
        for rid in inner.store.selection_edges() {
            tracing::debug!("discarding selection edge {} at shutdown", rid);
            inner.store.delete_edge(rid);
        }
        inner.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    pub fn stats(&self) -> Result<GraphStats, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(GraphStats {
            nodes: inner.store.all_nodes().len(),
            edges: inner.store.all_edges().len(),
        })
    }

    // ------------------------------------------------------------------
    // mutation

    /// Ingest a batch of relationships. Nodes are interned on first
    /// reference; re-added edges union their source URIs. Cycle detection
    /// is deferred, so the returned rejection set is always empty.
    pub fn add_relationships(
        &self,
        rels: &[Relationship],
    ) -> Result<Vec<Relationship>, DepGraphError> {
        self.add_relationships_suppressing(rels, &BTreeSet::new())
    }

    /// Like [`DepGraph::add_relationships`], but the views in `suppress`
    /// are not scheduled for cache extension.
    pub fn add_relationships_suppressing(
        &self,
        rels: &[Relationship],
        suppress: &BTreeSet<ViewId>,
    ) -> Result<Vec<Relationship>, DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        let snapshot = inner.store.snapshot();
        match Self::add_relationships_inner(&mut inner, rels, suppress) {
            Ok(rejected) => Ok(rejected),
            Err(err) => {
                inner.store.restore(snapshot);
                Err(err)
            }
        }
    }

    fn add_relationships_inner(
        inner: &mut Inner<S>,
        rels: &[Relationship],
        suppress: &BTreeSet<ViewId>,
    ) -> Result<Vec<Relationship>, DepGraphError> {
        let mut created: Vec<Rid> = Vec::new();

        'next_rel: for rel in rels {
            tracing::debug!("checking relationship: {}", rel);

            let mut nodes = [None, None];
            for (idx, coord) in [rel.declaring(), rel.target()].into_iter().enumerate() {
                match inner.store.create_node(coord) {
                    Ok(nid) => nodes[idx] = Some(nid),
                    Err(err @ DepGraphError::InvalidVersion { .. }) => {
                        // known lossy behavior: drop the edge, keep the batch
                        tracing::error!(
                            "failed to create node for {coord} while adding {rel}: {err}"
                        );
                        continue 'next_rel;
                    }
                    Err(err) => return Err(err),
                }
            }
            let (Some(from), Some(to)) = (nodes[0], nodes[1]) else {
                continue;
            };

            if let Some(existing) = inner.store.edge_by_key(&rel.key()) {
                tracing::debug!("== {} already stored as {}", rel, existing);
                // a concrete re-declaration outranks a prior ad-hoc selection
                inner.store.set_selection(existing, false);
                inner.store.add_edge_sources(existing, rel.sources());
                continue;
            }

            if from == to {
                // parent terminus: marks the project declared, adds no edge
                tracing::debug!("terminus marker for {}; not storing an edge", rel.declaring());
                inner.store.mark_connected(from);
                continue;
            }

            let rid = inner.store.create_edge(rel, from, to)?;
            inner.store.mark_connected(from);
            created.push(rid);
        }

        if !created.is_empty() {
            inner.global_cycle_pending = true;
            let views: Vec<ViewId> = inner.views.keys().cloned().collect();
            for view in views {
                if suppress.contains(&view) {
                    continue;
                }
                inner.pending.entry(view).or_default().extend(created.iter().copied());
            }
        }

        tracing::debug!("added {} new relationships", created.len());
        Ok(Vec::new())
    }

    /// Intern a coordinate that declares nothing yet.
    pub fn add_disconnected_project(&self, coord: &Coordinate) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let snapshot = inner.store.snapshot();
        if let Err(err) = inner.store.create_node(coord) {
            inner.store.restore(snapshot);
            return Err(err);
        }
        Ok(())
    }

    /// Delete every outgoing edge declared by `coord` and return it to the
    /// missing set. All view caches are invalidated: membership may have
    /// shrunk arbitrarily.
    pub fn delete_relationships_declared_by(
        &self,
        coord: &Coordinate,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        let Some(nid) = inner.node_of(coord) else {
            return Ok(());
        };

        let outgoing = inner.store.outgoing(nid, EnumSet::all());
        for rid in outgoing {
            inner.store.delete_edge(rid);
        }
        inner.store.mark_missing(nid);

        for view in inner.store.view_ids() {
            inner.store.drop_view_cache(&view);
        }
        inner.pending.clear();
        inner.global_cycle_pending = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // views

    /// Register a view and materialize its caches. Views without roots
    /// cannot track membership and are rejected.
    pub fn register_view(&self, params: ViewParams) -> Result<ViewId, DepGraphError> {
        if params.roots().is_empty() {
            return Err(DepGraphError::InvalidArgument(
                "Cannot track membership in a view without root coordinates".to_string(),
            ));
        }
        let view = params.short_id();
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let was_new = !inner.views.contains_key(&view);
        if was_new {
            tracing::debug!("registering new view {} ({})", view, params.describe());
            inner.views.insert(view.clone(), ViewState::new(params));
        }
        let snapshot = inner.store.snapshot();
        if let Err(err) = Self::ensure_view(&mut inner, &view) {
            inner.store.restore(snapshot);
            if was_new {
                inner.views.remove(&view);
            }
            return Err(err);
        }
        Ok(view)
    }

    pub fn deregister_view(&self, view: &ViewId) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        inner.views.remove(view);
        inner.pending.remove(view);
        inner.store.drop_view_cache(view);
        Ok(())
    }

    pub fn registered_views(&self) -> Vec<ViewId> {
        self.inner.read().views.keys().cloned().collect()
    }

    /// Bring a view's caches up to date: full materialization when absent,
    /// otherwise incremental extension along edges added since the last
    /// query.
    fn ensure_view(inner: &mut Inner<S>, view: &ViewId) -> Result<(), DepGraphError> {
        let state = inner.view_state(view)?;
        let params = state.params().clone();
        let selections = state.selections().clone();
        let workspace = inner.config.clone();

        if inner.store.view_cache(view).is_none() {
            tracing::debug!("materializing cache for view {}", view);
            let info = params.initial_path_info(view.clone());
            let mut seeds = Vec::new();
            let mut seed_paths = BTreeSet::new();
            for root in params.roots() {
                let nid = inner.store.create_node(root)?;
                inner.store.view_cache_mut(view).cache_path(
                    GraphPath::empty(),
                    info.clone(),
                    &[nid],
                    nid,
                );
                seeds.push(Seed::cached(nid, GraphPath::empty(), info.clone()));
                seed_paths.insert(GraphPath::empty());
            }

            let mut updater = ViewUpdater::new(view.clone(), seed_paths);
            let spec = TraversalSpec::for_view(&params);
            let select = ViewSelect {
                view,
                selections: &selections,
            };
            collect(
                &mut inner.store,
                &params,
                &workspace,
                &spec,
                seeds,
                &select,
                &mut updater,
            )?;
            inner.store.view_cache_mut(view).set_cycle_pending(true);
            inner.pending.remove(view);
            return Ok(());
        }

        let pending = inner.pending.remove(view).unwrap_or_default();
        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            "extending cache for view {} along {} new edges",
            view,
            pending.len()
        );
        let mut seeds = Vec::new();
        let mut seed_paths = BTreeSet::new();
        {
            let Some(cache) = inner.store.view_cache(view) else {
                return Ok(());
            };
            for rid in pending {
                let Some((from, _)) = inner.store.endpoints(rid) else {
                    continue;
                };
                if !cache.nodes().contains(&from) {
                    continue;
                }
                for path in cache.paths_targeting(from) {
                    if !seed_paths.insert(path.clone()) {
                        continue;
                    }
                    if let Some(info) = cache.path_info(&path) {
                        seeds.push(Seed::cached(from, path, info.clone()));
                    }
                }
            }
        }

        if !seeds.is_empty() {
            let mut updater = ViewUpdater::new(view.clone(), seed_paths);
            let spec = TraversalSpec::for_view(&params);
            let select = ViewSelect {
                view,
                selections: &selections,
            };
            collect(
                &mut inner.store,
                &params,
                &workspace,
                &spec,
                seeds,
                &select,
                &mut updater,
            )?;
            inner.store.view_cache_mut(view).set_cycle_pending(true);
        }
        Ok(())
    }

    /// Pin every occurrence of `key` in this view to `version`. Cached
    /// paths traversing another version are rebuilt: the prefix up to the
    /// divergence survives, the rest is uncached and traversal restarts
    /// from the divergence node under the updated selection.
    pub fn register_view_selection(
        &self,
        view: &ViewId,
        key: &ProjectKey,
        version: &str,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let snapshot = inner.store.snapshot();
        let views_snapshot = inner.views.clone();
        match Self::register_view_selection_inner(&mut inner, view, key, version) {
            Ok(()) => Ok(()),
            Err(err) => {
                inner.store.restore(snapshot);
                inner.views = views_snapshot;
                Err(err)
            }
        }
    }

    fn register_view_selection_inner(
        inner: &mut Inner<S>,
        view: &ViewId,
        key: &ProjectKey,
        version: &str,
    ) -> Result<(), DepGraphError> {
        Self::ensure_view(inner, view)?;

        let state = inner.view_state_mut(view)?;
        state.set_selection(key.clone(), version.to_string());
        let params = state.params().clone();
        let selections = state.selections().clone();
        let workspace = inner.config.clone();

        // nodes of the same group:artifact at any other version
        let stale: BTreeSet<Nid> = inner
            .store
            .nodes_by_ga(&key.to_string())
            .into_iter()
            .filter(|nid| {
                inner
                    .store
                    .node(*nid)
                    .map(|record| record.coord.version() != version)
                    .unwrap_or(false)
            })
            .collect();

        let mut to_remove: BTreeSet<GraphPath> = BTreeSet::new();
        let mut seeds: Vec<Seed> = Vec::new();
        let mut seed_paths: BTreeSet<GraphPath> = BTreeSet::new();
        {
            let Some(cache) = inner.store.view_cache(view) else {
                return Ok(());
            };
            for nid in &stale {
                if !cache.nodes().contains(nid) {
                    continue;
                }
                for path in cache.paths_containing(*nid) {
                    // divergence = the first edge that reaches the stale node
                    let mut divergence = None;
                    for (idx, rid) in path.iter().enumerate() {
                        if let Some((_, to)) = inner.store.endpoints(rid) {
                            if to == *nid {
                                divergence = Some(idx);
                                break;
                            }
                        }
                    }
                    let Some(at) = divergence else {
                        // the stale node is the path start: a view root
                        // cannot be re-selected away
                        tracing::debug!(
                            "cannot rebuild {}: its start node carries the deselected version",
                            path
                        );
                        continue;
                    };

                    to_remove.insert(path.clone());

                    let prefix = path.prefix(at);
                    if !seed_paths.insert(prefix.clone()) {
                        continue;
                    }
                    // a prefix that itself crosses a stale node is rebuilt
                    // from that node's own, shorter divergence seed
                    let mut prefix_stale = false;
                    for rid in prefix.iter() {
                        if let Some((from, to)) = inner.store.endpoints(rid) {
                            if stale.contains(&from) || stale.contains(&to) {
                                prefix_stale = true;
                                break;
                            }
                        }
                    }
                    if prefix_stale {
                        seed_paths.remove(&prefix);
                        continue;
                    }
                    let Some(info) = cache.path_info(&prefix) else {
                        continue;
                    };
                    let node = match prefix.last() {
                        Some(last) => match inner.store.endpoints(last) {
                            Some((_, to)) => to,
                            None => continue,
                        },
                        None => match path.first().and_then(|first| inner.store.endpoints(first)) {
                            Some((from, _)) => from,
                            None => continue,
                        },
                    };
                    seeds.push(Seed::cached(node, prefix, info.clone()));
                }
            }
        }

        // the seeds themselves survive; everything downstream is uncached
        let cache = inner.store.view_cache_mut(view);
        for path in &to_remove {
            if seed_paths.contains(path) {
                continue;
            }
            cache.remove_path(path);
        }
        cache.retain_path_closure();

        if !seeds.is_empty() {
            tracing::debug!(
                "extending view {} through {} selection seeds",
                view,
                seeds.len()
            );
            let mut updater = ViewUpdater::new(view.clone(), seed_paths);
            let spec = TraversalSpec::for_view(&params);
            let select = ViewSelect {
                view,
                selections: &selections,
            };
            collect(
                &mut inner.store,
                &params,
                &workspace,
                &spec,
                seeds,
                &select,
                &mut updater,
            )?;
        }
        inner.store.view_cache_mut(view).set_cycle_pending(true);
        Ok(())
    }

    // ------------------------------------------------------------------
    // shared read-path plumbing

    fn read_view<T>(
        &self,
        view: &ViewId,
        f: impl FnOnce(&Inner<S>) -> Result<T, DepGraphError>,
    ) -> Result<T, DepGraphError> {
        let guard = self.inner.upgradable_read();
        guard.ensure_open()?;
        if guard.needs_materialization(view) {
            let mut write = RwLockUpgradableReadGuard::upgrade(guard);
            let snapshot = write.store.snapshot();
            if let Err(err) = Self::ensure_view(&mut write, view) {
                write.store.restore(snapshot);
                return Err(err);
            }
            let read = RwLockWriteGuard::downgrade(write);
            return f(&read);
        }
        f(&guard)
    }

    fn view_params_of(inner: &Inner<S>, view: &ViewId) -> Result<ViewParams, DepGraphError> {
        if view.is_global() {
            Ok(inner.global_params())
        } else {
            Ok(inner.view_state(view)?.params().clone())
        }
    }

    /// Selection edges belong to the view whose selections produced them.
    fn edge_visible(inner: &Inner<S>, view: &ViewId, rid: Rid) -> bool {
        let Some(record) = inner.store.edge(rid) else {
            return false;
        };
        if !record.selection {
            return true;
        }
        if view.is_global() {
            return false;
        }
        inner
            .views
            .get(view)
            .map(|state| {
                state
                    .selections()
                    .get(&record.rel.target().key())
                    .map(|version| version == record.rel.target().version())
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // membership queries

    pub fn all_projects(&self, view: &ViewId) -> Result<BTreeSet<Coordinate>, DepGraphError> {
        self.read_view(view, |inner| {
            let nids: Vec<Nid> = if view.is_global() {
                inner.store.all_nodes()
            } else {
                inner
                    .store
                    .view_cache(view)
                    .map(|cache| cache.nodes().iter().copied().collect())
                    .unwrap_or_default()
            };
            Ok(nids.into_iter().filter_map(|nid| inner.coord_of(nid)).collect())
        })
    }

    pub fn all_relationships(&self, view: &ViewId) -> Result<Vec<Relationship>, DepGraphError> {
        self.read_view(view, |inner| {
            let rids: Vec<Rid> = if view.is_global() {
                inner
                    .store
                    .all_edges()
                    .into_iter()
                    .filter(|rid| Self::edge_visible(inner, view, *rid))
                    .collect()
            } else {
                inner
                    .store
                    .view_cache(view)
                    .map(|cache| cache.edges().iter().copied().collect())
                    .unwrap_or_default()
            };
            Ok(inner.rels_of(rids))
        })
    }

    /// The accepted edge set reachable from ad-hoc roots, without
    /// registering a view.
    pub fn relationships_rooted_at(
        &self,
        roots: &[Coordinate],
    ) -> Result<Vec<Relationship>, DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let params = inner.global_params();
        let workspace = inner.config.clone();
        let info = params.initial_path_info(ViewId::global());
        let seeds: Vec<Seed> = roots
            .iter()
            .filter_map(|coord| inner.node_of(coord))
            .map(|nid| Seed::root(nid, info.clone()))
            .collect();
        let mut visitor = RootedRelationshipsVisitor::new();
        let spec = TraversalSpec::default();
        collect(
            &mut inner.store,
            &params,
            &workspace,
            &spec,
            seeds,
            &PassthroughSelect,
            &mut visitor,
        )?;
        let rids = visitor.into_relationships();
        Ok(inner.rels_of(rids))
    }

    pub fn contains_project(&self, view: &ViewId, coord: &Coordinate) -> Result<bool, DepGraphError> {
        self.read_view(view, |inner| {
            let Some(nid) = inner.node_of(coord) else {
                return Ok(false);
            };
            if view.is_global() {
                return Ok(true);
            }
            Ok(inner
                .store
                .view_cache(view)
                .map(|cache| cache.nodes().contains(&nid))
                .unwrap_or(false))
        })
    }

    pub fn contains_relationship(
        &self,
        view: &ViewId,
        rel: &Relationship,
    ) -> Result<bool, DepGraphError> {
        self.read_view(view, |inner| {
            let Some(rid) = inner.store.edge_by_key(&rel.key()) else {
                return Ok(false);
            };
            if view.is_global() {
                return Ok(true);
            }
            Ok(inner
                .store
                .view_cache(view)
                .map(|cache| cache.edges().contains(&rid))
                .unwrap_or(false))
        })
    }

    /// A project is connected once it has declared at least one outgoing
    /// edge (or a parent terminus marker).
    pub fn is_connected(&self, coord: &Coordinate) -> Result<bool, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner
            .node_of(coord)
            .map(|nid| inner.store.is_connected(nid))
            .unwrap_or(false))
    }

    pub fn is_missing(&self, coord: &Coordinate) -> Result<bool, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner
            .node_of(coord)
            .map(|nid| inner.store.is_missing(nid))
            .unwrap_or(false))
    }

    pub fn missing_projects(&self, view: &ViewId) -> Result<BTreeSet<Coordinate>, DepGraphError> {
        self.indexed_projects(view, |inner| inner.store.missing_nodes())
    }

    pub fn has_missing_projects(&self, view: &ViewId) -> Result<bool, DepGraphError> {
        Ok(!self.missing_projects(view)?.is_empty())
    }

    pub fn variable_projects(&self, view: &ViewId) -> Result<BTreeSet<Coordinate>, DepGraphError> {
        self.indexed_projects(view, |inner| inner.store.variable_nodes())
    }

    pub fn has_variable_projects(&self, view: &ViewId) -> Result<bool, DepGraphError> {
        Ok(!self.variable_projects(view)?.is_empty())
    }

    fn indexed_projects(
        &self,
        view: &ViewId,
        index: impl FnOnce(&Inner<S>) -> Vec<Nid>,
    ) -> Result<BTreeSet<Coordinate>, DepGraphError> {
        self.read_view(view, |inner| {
            let nids = index(inner);
            let filtered: Vec<Nid> = if view.is_global() {
                nids
            } else {
                let members = inner
                    .store
                    .view_cache(view)
                    .map(|cache| cache.nodes().clone())
                    .unwrap_or_default();
                nids.into_iter().filter(|nid| members.contains(nid)).collect()
            };
            Ok(filtered
                .into_iter()
                .filter_map(|nid| inner.coord_of(nid))
                .collect())
        })
    }

    /// All interned versions of a group:artifact.
    pub fn projects_matching(&self, key: &ProjectKey) -> Result<Vec<Coordinate>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner
            .store
            .nodes_by_ga(&key.to_string())
            .into_iter()
            .filter_map(|nid| inner.coord_of(nid))
            .collect())
    }

    // ------------------------------------------------------------------
    // neighbor queries

    pub fn direct_relationships_from(
        &self,
        view: &ViewId,
        coord: &Coordinate,
        include_managed: bool,
        include_concrete: bool,
        kinds: &[RelationKind],
    ) -> Result<Vec<Relationship>, DepGraphError> {
        self.direct_relationships(view, coord, include_managed, include_concrete, kinds, Direction::Outgoing)
    }

    pub fn direct_relationships_to(
        &self,
        view: &ViewId,
        coord: &Coordinate,
        include_managed: bool,
        include_concrete: bool,
        kinds: &[RelationKind],
    ) -> Result<Vec<Relationship>, DepGraphError> {
        self.direct_relationships(view, coord, include_managed, include_concrete, kinds, Direction::Incoming)
    }

    fn direct_relationships(
        &self,
        view: &ViewId,
        coord: &Coordinate,
        include_managed: bool,
        include_concrete: bool,
        kinds: &[RelationKind],
        direction: Direction,
    ) -> Result<Vec<Relationship>, DepGraphError> {
        self.read_view(view, |inner| {
            let Some(nid) = inner.node_of(coord) else {
                return Ok(Vec::new());
            };
            let kind_set: EnumSet<EdgeKind> = if kinds.is_empty() {
                EnumSet::<EdgeKind>::all()
                    .iter()
                    .filter(|kind| {
                        (include_managed || !kind.is_managed())
                            && (include_concrete || kind.is_managed())
                    })
                    .collect()
            } else {
                EdgeKind::for_kinds(kinds, include_managed, include_concrete)
            };
            let incident = match direction {
                Direction::Outgoing => inner.store.outgoing(nid, kind_set),
                Direction::Incoming => inner.store.incoming(nid, kind_set),
            };
            let params = Self::view_params_of(inner, view)?;
            Ok(incident
                .into_iter()
                .filter(|rid| Self::edge_visible(inner, view, *rid))
                .filter_map(|rid| inner.rel_of(rid))
                .filter(|rel| params.accepts_edge(rel, &inner.config))
                .collect())
        })
    }

    // ------------------------------------------------------------------
    // path queries

    /// Every cached path of the view terminating at one of `targets`.
    pub fn all_paths_to(
        &self,
        view: &ViewId,
        targets: &[Coordinate],
    ) -> Result<Vec<Vec<Relationship>>, DepGraphError> {
        if view.is_global() {
            return Err(DepGraphError::InvalidArgument(
                "Path queries need a view with at least one root coordinate".to_string(),
            ));
        }
        self.read_view(view, |inner| {
            let Some(cache) = inner.store.view_cache(view) else {
                return Ok(Vec::new());
            };
            let mut result = Vec::new();
            for target in targets {
                let Some(nid) = inner.node_of(target) else {
                    continue;
                };
                for path in cache.paths_targeting(nid) {
                    if !path.is_empty() {
                        result.push(inner.render_path(&path));
                    }
                }
            }
            Ok(result)
        })
    }

    /// The cached `path -> state` entries terminating at one of `targets`.
    pub fn path_map_targeting(
        &self,
        view: &ViewId,
        targets: &[Coordinate],
    ) -> Result<BTreeMap<GraphPath, PathInfo>, DepGraphError> {
        if view.is_global() {
            return Err(DepGraphError::InvalidArgument(
                "Path queries need a view with at least one root coordinate".to_string(),
            ));
        }
        self.read_view(view, |inner| {
            let Some(cache) = inner.store.view_cache(view) else {
                return Ok(BTreeMap::new());
            };
            let mut result = BTreeMap::new();
            for target in targets {
                let Some(nid) = inner.node_of(target) else {
                    continue;
                };
                for path in cache.paths_targeting(nid) {
                    if let Some(info) = cache.path_info(&path) {
                        result.insert(path, info.clone());
                    }
                }
            }
            Ok(result)
        })
    }

    /// Coordinate of a path's terminal node.
    pub fn path_target(&self, path: &GraphPath) -> Result<Coordinate, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let last = path.last().ok_or_else(|| {
            DepGraphError::InvalidArgument("An empty path has no target edge".to_string())
        })?;
        let (_, to) = inner
            .store
            .endpoints(last)
            .ok_or_else(|| DepGraphError::NotFound(format!("No edge for id {last}")))?;
        inner
            .coord_of(to)
            .ok_or_else(|| DepGraphError::NotFound(format!("No node for id {to}")))
    }

    /// Build a path from already-stored relationships.
    pub fn create_path(&self, rels: &[Relationship]) -> Result<GraphPath, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let mut rids = Vec::with_capacity(rels.len());
        for rel in rels {
            let rid = inner.store.edge_by_key(&rel.key()).ok_or_else(|| {
                DepGraphError::NotFound(format!("Relationship is not stored: {rel}"))
            })?;
            rids.push(rid);
        }
        Ok(GraphPath::from_rids(rids))
    }

    /// Extend a path by one relationship, storing the relationship on
    /// demand. A relationship that would close a cycle is rejected.
    pub fn create_child_path(
        &self,
        parent: &GraphPath,
        rel: &Relationship,
    ) -> Result<GraphPath, DepGraphError> {
        let existing = {
            let inner = self.inner.read();
            inner.ensure_open()?;
            inner.store.edge_by_key(&rel.key())
        };
        let rid = match existing {
            Some(rid) => rid,
            None => {
                if self.introduces_cycle(&ViewId::global(), rel)? {
                    return Err(DepGraphError::SelectionConflict(format!(
                        "Cannot store {rel}: it would introduce a relationship cycle"
                    )));
                }
                self.add_relationships(&[rel.clone()])?;
                let inner = self.inner.read();
                inner.store.edge_by_key(&rel.key()).ok_or_else(|| {
                    DepGraphError::Driver(format!("Relationship vanished after storing: {rel}"))
                })?
            }
        };
        Ok(parent.append(rid))
    }

    // ------------------------------------------------------------------
    // cycles

    /// All minimal cycles visible in the view. Detection is lazy: the scan
    /// runs only when the view's cycle cache is marked pending.
    pub fn get_cycles(&self, view: &ViewId) -> Result<Vec<Vec<Relationship>>, DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        if view.is_global() {
            if inner.global_cycle_pending {
                let params = inner.global_params();
                let workspace = inner.config.clone();
                let info = params.initial_path_info(ViewId::global());
                let seeds: Vec<Seed> = inner
                    .store
                    .all_nodes()
                    .into_iter()
                    .filter(|nid| inner.store.is_connected(*nid))
                    .map(|nid| Seed::root(nid, info.clone()))
                    .collect();
                let mut collector = CycleCollector::new();
                // path uniqueness keeps the scan order-independent across
                // seed nodes; the collector folds rotations of one loop
                let spec = TraversalSpec {
                    avoid_cycles: false,
                    ..TraversalSpec::default()
                };
                collect(
                    &mut inner.store,
                    &params,
                    &workspace,
                    &spec,
                    seeds,
                    &PassthroughSelect,
                    &mut collector,
                )?;
                inner.global_cycles = collector.into_cycles();
                inner.global_cycle_pending = false;
                tracing::debug!("registered {} global cycles", inner.global_cycles.len());
            }
            let cycles = inner.global_cycles.clone();
            return Ok(cycles.iter().map(|c| inner.render_cycle(c)).collect());
        }

        Self::ensure_view(&mut inner, view)?;
        let pending = inner
            .store
            .view_cache(view)
            .map(|cache| cache.cycle_pending())
            .unwrap_or(false);
        if pending {
            let state = inner.view_state(view)?;
            let params = state.params().clone();
            let selections = state.selections().clone();
            let workspace = inner.config.clone();
            let info = params.initial_path_info(view.clone());
            let mut seeds = Vec::new();
            for root in params.roots() {
                if let Some(nid) = inner.node_of(root) {
                    seeds.push(Seed::root(nid, info.clone()));
                }
            }
            let mut collector = CycleCollector::new();
            let spec = TraversalSpec {
                avoid_cycles: false,
                ..TraversalSpec::for_view(&params)
            };
            let select = ViewSelect {
                view,
                selections: &selections,
            };
            collect(
                &mut inner.store,
                &params,
                &workspace,
                &spec,
                seeds,
                &select,
                &mut collector,
            )?;
            let cycle_count = collector.cycle_count();
            let cache = inner.store.view_cache_mut(view);
            cache.set_cycle_pending(false);
            for cycle in collector.into_cycles() {
                cache.add_cycle(cycle);
            }
            tracing::debug!("registered {} cycles in view {}'s cycle cache", cycle_count, view);
        }

        let cycles: Vec<CyclePath> = inner
            .store
            .view_cache(view)
            .map(|cache| cache.cycles().to_vec())
            .unwrap_or_default();
        Ok(cycles.iter().map(|c| inner.render_cycle(c)).collect())
    }

    pub fn is_cycle_participant(
        &self,
        view: &ViewId,
        coord: &Coordinate,
    ) -> Result<bool, DepGraphError> {
        let gav = coord.gav();
        Ok(self.get_cycles(view)?.iter().any(|cycle| {
            cycle
                .iter()
                .any(|rel| rel.declaring().gav() == gav || rel.target().gav() == gav)
        }))
    }

    pub fn is_cycle_participant_rel(
        &self,
        view: &ViewId,
        rel: &Relationship,
    ) -> Result<bool, DepGraphError> {
        let key = rel.key();
        Ok(self
            .get_cycles(view)?
            .iter()
            .any(|cycle| cycle.iter().any(|member| member.key() == key)))
    }

    /// Would adding `rel` close a cycle in this view? Answered from the
    /// path cache for registered views, by a reachability probe otherwise.
    pub fn introduces_cycle(&self, view: &ViewId, rel: &Relationship) -> Result<bool, DepGraphError> {
        if !view.is_global() {
            return self.read_view(view, |inner| {
                let (Some(declaring), Some(target)) =
                    (inner.node_of(rel.declaring()), inner.node_of(rel.target()))
                else {
                    return Ok(false);
                };
                let Some(cache) = inner.store.view_cache(view) else {
                    return Ok(false);
                };
                for path in cache.paths_targeting(declaring) {
                    for rid in path.iter() {
                        if let Some((from, to)) = inner.store.endpoints(rid) {
                            if from == target || to == target {
                                return Ok(true);
                            }
                        }
                    }
                }
                Ok(false)
            });
        }

        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let (Some(declaring), Some(target)) =
            (inner.node_of(rel.declaring()), inner.node_of(rel.target()))
        else {
            return Ok(false);
        };
        let params = inner.global_params();
        let workspace = inner.config.clone();
        let info = params.initial_path_info(ViewId::global());
        let mut visitor = PathExistenceVisitor::new(declaring);
        let spec = TraversalSpec {
            uniqueness: Uniqueness::RelationshipGlobal,
            ..TraversalSpec::default()
        };
        collect(
            &mut inner.store,
            &params,
            &workspace,
            &spec,
            vec![Seed::root(target, info)],
            &PassthroughSelect,
            &mut visitor,
        )?;
        Ok(visitor.found())
    }

    // ------------------------------------------------------------------
    // traversal entry point

    /// Drive a multi-pass consumer over the view from `root`. Passes run
    /// sequentially, each with its own lifecycle and ordering.
    pub fn traverse<T: GraphTraversal>(
        &self,
        view: &ViewId,
        traversal: &mut T,
        root: &Coordinate,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let Some(nid) = inner.node_of(root) else {
            tracing::debug!("traverse root {} is not stored; nothing to do", root);
            return Ok(());
        };
        let params = Self::view_params_of(&inner, view)?;
        let selections = if view.is_global() {
            BTreeMap::new()
        } else {
            inner.view_state(view)?.selections().clone()
        };
        let workspace = inner.config.clone();

        for pass in 0..traversal.required_passes() {
            traversal.start_pass(pass);
            let info = params.initial_path_info(view.clone());
            let spec = TraversalSpec {
                order: traversal.order(pass),
                sorted: true,
                ..TraversalSpec::for_view(&params)
            };
            let mut driver = TraversalDriver::new(traversal, pass);
            let select = ViewSelect {
                view,
                selections: &selections,
            };
            collect(
                &mut inner.store,
                &params,
                &workspace,
                &spec,
                vec![Seed::root(nid, info)],
                &select,
                &mut driver,
            )?;
            traversal.end_pass(pass);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // metadata

    pub fn get_metadata(&self, coord: &Coordinate) -> Result<BTreeMap<String, String>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let nid = inner
            .node_of(coord)
            .ok_or_else(|| DepGraphError::NotFound(format!("No project for {coord}")))?;
        Ok(inner.store.metadata(nid).cloned().unwrap_or_default())
    }

    pub fn get_metadata_keys(
        &self,
        coord: &Coordinate,
        keys: &[&str],
    ) -> Result<BTreeMap<String, String>, DepGraphError> {
        let all = self.get_metadata(coord)?;
        Ok(all
            .into_iter()
            .filter(|(key, _)| keys.contains(&key.as_str()))
            .collect())
    }

    pub fn add_metadata(
        &self,
        coord: &Coordinate,
        key: &str,
        value: &str,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let nid = inner
            .node_of(coord)
            .ok_or_else(|| DepGraphError::NotFound(format!("No project for {coord}")))?;
        inner.store.add_metadata(nid, key, value)
    }

    pub fn set_metadata(
        &self,
        coord: &Coordinate,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let nid = inner
            .node_of(coord)
            .ok_or_else(|| DepGraphError::NotFound(format!("No project for {coord}")))?;
        inner.store.set_metadata(nid, metadata)
    }

    pub fn projects_with_metadata(
        &self,
        view: &ViewId,
        key: &str,
    ) -> Result<BTreeSet<Coordinate>, DepGraphError> {
        self.indexed_projects(view, |inner| inner.store.nodes_with_metadata(key))
    }

    /// Rebuild the per-key metadata indices from node metadata.
    pub fn reindex(&self) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        inner.store.reindex_metadata();
        Ok(())
    }

    // ------------------------------------------------------------------
    // managed overrides

    /// Walk a path's declaring projects for a managed override of
    /// `target` for the given kind, nearest declaration first.
    pub fn managed_target_for(
        &self,
        target: &ProjectKey,
        path: &GraphPath,
        kind: &RelationKind,
    ) -> Result<Option<Coordinate>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let ga = target.to_string();
        for rid in path.iter() {
            let Some((from, _)) = inner.store.endpoints(rid) else {
                continue;
            };
            if let Some(managed) = inner.store.managed_target(from, kind.tag(), &ga) {
                if let Some((_, to)) = inner.store.endpoints(managed) {
                    return Ok(inner.coord_of(to));
                }
            }
        }
        Ok(None)
    }

    // ------------------------------------------------------------------
    // workspace & view configuration

    pub fn add_active_sources<I: IntoIterator<Item = url::Url>>(
        &self,
        view: Option<&ViewId>,
        sources: I,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => inner.config.active_sources.extend(sources),
            Some(view) => {
                inner
                    .view_state_mut(view)?
                    .params_mut()
                    .active_sources_mut()
                    .extend(sources);
                inner.store.drop_view_cache(view);
            }
        }
        Ok(())
    }

    pub fn remove_active_sources<I: IntoIterator<Item = url::Url>>(
        &self,
        view: Option<&ViewId>,
        sources: I,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => {
                for source in sources {
                    inner.config.active_sources.remove(&source);
                }
            }
            Some(view) => {
                let state = inner.view_state_mut(view)?;
                for source in sources {
                    state.params_mut().active_sources_mut().remove(&source);
                }
                inner.store.drop_view_cache(view);
            }
        }
        Ok(())
    }

    pub fn active_sources(&self, view: Option<&ViewId>) -> Result<BTreeSet<url::Url>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        match view {
            None => Ok(inner.config.active_sources.clone()),
            Some(view) => Ok(inner.view_state(view)?.params().active_sources().clone()),
        }
    }

    pub fn add_active_pom_locations<I: IntoIterator<Item = url::Url>>(
        &self,
        view: Option<&ViewId>,
        locations: I,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => inner.config.active_pom_locations.extend(locations),
            Some(view) => {
                inner
                    .view_state_mut(view)?
                    .params_mut()
                    .active_pom_locations_mut()
                    .extend(locations);
                inner.store.drop_view_cache(view);
            }
        }
        Ok(())
    }

    pub fn remove_active_pom_locations<I: IntoIterator<Item = url::Url>>(
        &self,
        view: Option<&ViewId>,
        locations: I,
    ) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => {
                for location in locations {
                    inner.config.active_pom_locations.remove(&location);
                }
            }
            Some(view) => {
                let state = inner.view_state_mut(view)?;
                for location in locations {
                    state.params_mut().active_pom_locations_mut().remove(&location);
                }
                inner.store.drop_view_cache(view);
            }
        }
        Ok(())
    }

    pub fn active_pom_locations(
        &self,
        view: Option<&ViewId>,
    ) -> Result<BTreeSet<url::Url>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        match view {
            None => Ok(inner.config.active_pom_locations.clone()),
            Some(view) => Ok(inner
                .view_state(view)?
                .params()
                .active_pom_locations()
                .clone()),
        }
    }

    pub fn set_property(
        &self,
        view: Option<&ViewId>,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => Ok(inner
                .config
                .properties
                .insert(key.to_string(), value.to_string())),
            Some(view) => Ok(inner
                .view_state_mut(view)?
                .properties_mut()
                .insert(key.to_string(), value.to_string())),
        }
    }

    pub fn get_property(
        &self,
        view: Option<&ViewId>,
        key: &str,
    ) -> Result<Option<String>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        match view {
            None => Ok(inner.config.properties.get(key).cloned()),
            Some(view) => Ok(inner.view_state(view)?.properties().get(key).cloned()),
        }
    }

    pub fn remove_property(
        &self,
        view: Option<&ViewId>,
        key: &str,
    ) -> Result<Option<String>, DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => Ok(inner.config.properties.remove(key)),
            Some(view) => Ok(inner.view_state_mut(view)?.properties_mut().remove(key)),
        }
    }

    pub fn set_last_access(&self, view: Option<&ViewId>, stamp: i64) -> Result<(), DepGraphError> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match view {
            None => inner.config.last_access = Some(stamp),
            Some(view) => inner.view_state_mut(view)?.set_last_access(stamp),
        }
        Ok(())
    }

    pub fn last_access(&self, view: Option<&ViewId>) -> Result<Option<i64>, DepGraphError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        match view {
            None => Ok(inner.config.last_access),
            Some(view) => Ok(inner.view_state(view)?.last_access()),
        }
    }

    // ------------------------------------------------------------------
    // extension queries

    /// Run a declarative query against the store's optional query hook,
    /// rooting it at the given coordinates. The query must not carry its
    /// own `START` clause.
    pub fn execute_from(
        &self,
        query: &str,
        roots: &[Coordinate],
    ) -> Result<Vec<QueryRow>, DepGraphError> {
        if query.trim_start().starts_with("START") {
            return Err(DepGraphError::InvalidArgument(format!(
                "Leave off the START clause when supplying coordinates as query roots: '{query}'"
            )));
        }
        let inner = self.inner.read();
        inner.ensure_open()?;
        let mut ids = String::new();
        for root in roots {
            if let Some(nid) = inner.node_of(root) {
                if !ids.is_empty() {
                    ids.push_str(", ");
                }
                ids.push_str(&nid.to_string());
            }
        }
        if ids.is_empty() {
            ids.push('*');
        }
        inner
            .store
            .run_query(&format!("START n=node({ids}) {query}"), &[])
    }
}

impl<S: GraphStore> fmt::Debug for DepGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        write!(
            f,
            "DepGraph(closed: {}, views: {})",
            inner.closed,
            inner.views.len()
        )
    }
}

impl<S: GraphStore> Drop for DepGraph<S> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if !inner.closed {
            for rid in inner.store.selection_edges() {
                inner.store.delete_edge(rid);
            }
            inner.closed = true;
        }
    }
}
