//! The store seam and the in-memory reference store.
//!
//! The engine consumes a property-graph store through the [`GraphStore`]
//! trait: node/edge interning with secondary indices, typed incident-edge
//! iteration, per-view caches, and snapshot-scoped transactions. The
//! [`MemoryStore`] implementation backs everything with a
//! `petgraph::stable_graph::StableDiGraph` plus `BTreeMap` indices; on-disk
//! or server-backed stores are external collaborators implementing the same
//! trait.
//!
//! Identifier stability: nodes are never removed, so [`Nid`]s are stable for
//! the life of the store. Edges can be removed (declaration deletion,
//! selection-edge discard at shutdown); every removal invalidates the view
//! caches that could hold the stale [`Rid`].

use enumset::EnumSet;
use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex, StableDiGraph},
    visit::EdgeRef,
    Direction,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display, Formatter},
};
use url::Url;

use crate::{
    error::DepGraphError,
    ident::Coordinate,
    path::{CyclePath, GraphPath, PathInfo},
    rel::{EdgeKind, Relationship},
    view::ViewId,
};

/// Stable node identifier assigned by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Nid(u32);

impl Nid {
    fn as_index(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }
}

impl From<NodeIndex> for Nid {
    fn from(idx: NodeIndex) -> Nid {
        Nid(idx.index() as u32)
    }
}

impl Display for Nid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Stable edge identifier assigned by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Rid(u32);

impl Rid {
    fn as_index(self) -> EdgeIndex {
        EdgeIndex::new(self.0 as usize)
    }
}

impl From<EdgeIndex> for Rid {
    fn from(idx: EdgeIndex) -> Rid {
        Rid(idx.index() as u32)
    }
}

impl Display for Rid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Node payload: the interned coordinate plus its stored flags.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub coord: Coordinate,
    /// False until the project declares its first outgoing edge.
    pub connected: bool,
    pub metadata: BTreeMap<String, String>,
}

/// Edge payload: the relationship value plus its stored flags.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub rel: Relationship,
    pub kind: EdgeKind,
    /// Synthesized by a selector for one view; discarded at shutdown and
    /// never followed on its own merit.
    pub selection: bool,
    /// This edge closes a known cycle; cycle-avoiding traversals skip it.
    pub cycle_injected: bool,
}

/// The three per-view caches plus the cycle cache, owned by the store and
/// keyed by the view's short id.
#[derive(Debug, Clone, Default)]
pub struct ViewCache {
    nodes: BTreeSet<Nid>,
    edges: BTreeSet<Rid>,
    paths: BTreeMap<GraphPath, PathInfo>,
    by_target: BTreeMap<Nid, BTreeSet<GraphPath>>,
    by_node: BTreeMap<Nid, BTreeSet<GraphPath>>,
    cycles: Vec<CyclePath>,
    cycle_pending: bool,
}

impl ViewCache {
    pub fn new() -> Self {
        ViewCache {
            cycle_pending: true,
            ..ViewCache::default()
        }
    }

    pub fn nodes(&self) -> &BTreeSet<Nid> {
        &self.nodes
    }

    pub fn edges(&self) -> &BTreeSet<Rid> {
        &self.edges
    }

    pub fn paths(&self) -> &BTreeMap<GraphPath, PathInfo> {
        &self.paths
    }

    pub fn contains_path(&self, path: &GraphPath) -> bool {
        self.paths.contains_key(path)
    }

    pub fn path_info(&self, path: &GraphPath) -> Option<&PathInfo> {
        self.paths.get(path)
    }

    /// All cached paths terminating at `target`.
    pub fn paths_targeting(&self, target: Nid) -> Vec<GraphPath> {
        self.by_target
            .get(&target)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All cached paths passing through `node` (including as target).
    pub fn paths_containing(&self, node: Nid) -> Vec<GraphPath> {
        self.by_node
            .get(&node)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert_node(&mut self, nid: Nid) {
        self.nodes.insert(nid);
    }

    /// Record an accepted path. `touched` must list every node the path
    /// visits (start node first), `target` its terminal node.
    pub fn cache_path(&mut self, path: GraphPath, info: PathInfo, touched: &[Nid], target: Nid) {
        for nid in touched {
            self.nodes.insert(*nid);
            self.by_node.entry(*nid).or_default().insert(path.clone());
        }
        for rid in path.iter() {
            self.edges.insert(rid);
        }
        self.by_target.entry(target).or_default().insert(path.clone());
        self.paths.insert(path, info);
    }

    pub fn remove_path(&mut self, path: &GraphPath) {
        self.paths.remove(path);
        for set in self.by_target.values_mut() {
            set.remove(path);
        }
        for set in self.by_node.values_mut() {
            set.remove(path);
        }
        self.by_target.retain(|_, set| !set.is_empty());
        self.by_node.retain(|_, set| !set.is_empty());
    }

    /// Drop membership entries not justified by any remaining path. Roots
    /// stay cached through their empty paths, so they survive.
    pub fn retain_path_closure(&mut self) {
        self.nodes = self.by_node.keys().copied().collect();
        self.edges = self
            .paths
            .keys()
            .flat_map(|path| path.iter())
            .collect();
    }

    pub fn cycles(&self) -> &[CyclePath] {
        &self.cycles
    }

    pub fn add_cycle(&mut self, cycle: CyclePath) -> bool {
        if self
            .cycles
            .iter()
            .any(|known| known.loop_key() == cycle.loop_key())
        {
            false
        } else {
            self.cycles.push(cycle);
            true
        }
    }

    pub fn cycle_pending(&self) -> bool {
        self.cycle_pending
    }

    pub fn set_cycle_pending(&mut self, pending: bool) {
        self.cycle_pending = pending;
        if pending {
            self.cycles.clear();
        }
    }
}

/// One result row of the optional declarative query hook.
pub type QueryRow = BTreeMap<String, String>;

/// Store interface consumed by the engine.
pub trait GraphStore: fmt::Debug + Send {
    /// Opaque pre-transaction state, restored on abort.
    type Snapshot;

    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Intern a coordinate as a node. Existing nodes are returned as-is; new
    /// nodes start in the missing set (and the variable set when the
    /// version is not a literal).
    fn create_node(&mut self, coord: &Coordinate) -> Result<Nid, DepGraphError>;
    fn node(&self, nid: Nid) -> Option<&NodeRecord>;
    fn node_by_gav(&self, gav: &str) -> Option<Nid>;
    fn nodes_by_ga(&self, ga: &str) -> Vec<Nid>;
    fn all_nodes(&self) -> Vec<Nid>;

    fn missing_nodes(&self) -> Vec<Nid>;
    fn is_missing(&self, nid: Nid) -> bool;
    fn variable_nodes(&self) -> Vec<Nid>;
    fn mark_connected(&mut self, nid: Nid);
    /// Return a node to the missing set after its declarations were deleted.
    fn mark_missing(&mut self, nid: Nid);
    fn is_connected(&self, nid: Nid) -> bool;

    fn create_edge(
        &mut self,
        rel: &Relationship,
        from: Nid,
        to: Nid,
    ) -> Result<Rid, DepGraphError>;
    fn edge(&self, rid: Rid) -> Option<&EdgeRecord>;
    fn edge_by_key(&self, key: &str) -> Option<Rid>;
    fn all_edges(&self) -> Vec<Rid>;
    fn delete_edge(&mut self, rid: Rid);
    fn endpoints(&self, rid: Rid) -> Option<(Nid, Nid)>;
    fn outgoing(&self, nid: Nid, kinds: EnumSet<EdgeKind>) -> Vec<Rid>;
    fn incoming(&self, nid: Nid, kinds: EnumSet<EdgeKind>) -> Vec<Rid>;

    fn add_edge_sources(&mut self, rid: Rid, sources: &BTreeSet<Url>);
    fn set_selection(&mut self, rid: Rid, selection: bool);
    fn selection_edges(&self) -> Vec<Rid>;
    fn mark_cycle_injected(&mut self, rid: Rid);

    /// Look up a managed override declared by `declaring` for the given
    /// kind tag and group:artifact.
    fn managed_target(&self, declaring: Nid, kind_tag: &str, ga: &str) -> Option<Rid>;

    fn metadata(&self, nid: Nid) -> Option<&BTreeMap<String, String>>;
    fn add_metadata(&mut self, nid: Nid, key: &str, value: &str) -> Result<(), DepGraphError>;
    fn set_metadata(
        &mut self,
        nid: Nid,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), DepGraphError>;
    fn nodes_with_metadata(&self, key: &str) -> Vec<Nid>;
    /// Rebuild the per-key metadata index from node metadata maps.
    fn reindex_metadata(&mut self);

    fn view_cache(&self, view: &ViewId) -> Option<&ViewCache>;
    /// Fetch or create the cache record for a view.
    fn view_cache_mut(&mut self, view: &ViewId) -> &mut ViewCache;
    fn drop_view_cache(&mut self, view: &ViewId);
    fn view_ids(&self) -> Vec<ViewId>;

    /// Optional declarative query hook used only by extended analytics.
    fn run_query(&self, query: &str, params: &[String]) -> Result<Vec<QueryRow>, DepGraphError>;
}

/// In-memory property-graph store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    graph: StableDiGraph<NodeRecord, EdgeRecord>,
    by_gav: BTreeMap<String, Nid>,
    by_ga: BTreeMap<String, BTreeSet<Nid>>,
    by_key: BTreeMap<String, Rid>,
    missing: BTreeSet<Nid>,
    variable: BTreeSet<Nid>,
    selections: BTreeSet<Rid>,
    managed_ga: BTreeMap<String, Rid>,
    meta_index: BTreeMap<String, BTreeSet<Nid>>,
    views: BTreeMap<ViewId, ViewCache>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn managed_key(declaring: Nid, kind_tag: &str, ga: &str) -> String {
        format!("{declaring}/{kind_tag}/{ga}")
    }

    fn incident(&self, nid: Nid, kinds: EnumSet<EdgeKind>, direction: Direction) -> Vec<Rid> {
        if !self.graph.contains_node(nid.as_index()) {
            return Vec::new();
        }
        self.graph
            .edges_directed(nid.as_index(), direction)
            .filter(|edge| kinds.contains(edge.weight().kind))
            .map(|edge| Rid::from(edge.id()))
            .collect()
    }
}

impl GraphStore for MemoryStore {
    type Snapshot = MemoryStore;

    fn snapshot(&self) -> MemoryStore {
        self.clone()
    }

    fn restore(&mut self, snapshot: MemoryStore) {
        *self = snapshot;
    }

    fn create_node(&mut self, coord: &Coordinate) -> Result<Nid, DepGraphError> {
        coord.validate()?;
        let gav = coord.gav();
        if let Some(nid) = self.by_gav.get(&gav) {
            return Ok(*nid);
        }
        let nid = Nid::from(self.graph.add_node(NodeRecord {
            coord: coord.clone(),
            connected: false,
            metadata: BTreeMap::new(),
        }));
        self.by_gav.insert(gav, nid);
        self.by_ga.entry(coord.ga()).or_default().insert(nid);
        self.missing.insert(nid);
        if coord.is_variable() {
            self.variable.insert(nid);
        }
        tracing::debug!("created node {} for {}", nid, coord);
        Ok(nid)
    }

    fn node(&self, nid: Nid) -> Option<&NodeRecord> {
        self.graph.node_weight(nid.as_index())
    }

    fn node_by_gav(&self, gav: &str) -> Option<Nid> {
        self.by_gav.get(gav).copied()
    }

    fn nodes_by_ga(&self, ga: &str) -> Vec<Nid> {
        self.by_ga
            .get(ga)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn all_nodes(&self) -> Vec<Nid> {
        self.graph.node_indices().map(Nid::from).collect()
    }

    fn missing_nodes(&self) -> Vec<Nid> {
        self.missing.iter().copied().collect()
    }

    fn is_missing(&self, nid: Nid) -> bool {
        self.missing.contains(&nid)
    }

    fn variable_nodes(&self) -> Vec<Nid> {
        self.variable.iter().copied().collect()
    }

    fn mark_connected(&mut self, nid: Nid) {
        if let Some(record) = self.graph.node_weight_mut(nid.as_index()) {
            record.connected = true;
        }
        self.missing.remove(&nid);
    }

    fn mark_missing(&mut self, nid: Nid) {
        if let Some(record) = self.graph.node_weight_mut(nid.as_index()) {
            record.connected = false;
        }
        self.missing.insert(nid);
    }

    fn is_connected(&self, nid: Nid) -> bool {
        self.graph
            .node_weight(nid.as_index())
            .map(|record| record.connected)
            .unwrap_or(false)
    }

    fn create_edge(
        &mut self,
        rel: &Relationship,
        from: Nid,
        to: Nid,
    ) -> Result<Rid, DepGraphError> {
        let key = rel.key();
        if let Some(existing) = self.by_key.get(&key) {
            return Ok(*existing);
        }
        if !self.graph.contains_node(from.as_index()) || !self.graph.contains_node(to.as_index())
        {
            return Err(DepGraphError::NotFound(format!(
                "Cannot create edge {rel}: endpoint nodes are not interned"
            )));
        }
        let rid = Rid::from(self.graph.add_edge(
            from.as_index(),
            to.as_index(),
            EdgeRecord {
                rel: rel.clone(),
                kind: rel.edge_kind(),
                selection: false,
                cycle_injected: false,
            },
        ));
        self.by_key.insert(key, rid);
        if rel.managed() {
            self.managed_ga.insert(
                MemoryStore::managed_key(from, rel.kind().tag(), &rel.target().ga()),
                rid,
            );
        }
        tracing::debug!("created edge {} for {}", rid, rel);
        Ok(rid)
    }

    fn edge(&self, rid: Rid) -> Option<&EdgeRecord> {
        self.graph.edge_weight(rid.as_index())
    }

    fn edge_by_key(&self, key: &str) -> Option<Rid> {
        self.by_key.get(key).copied()
    }

    fn all_edges(&self) -> Vec<Rid> {
        self.graph.edge_indices().map(Rid::from).collect()
    }

    fn delete_edge(&mut self, rid: Rid) {
        let Some((from, _)) = self.endpoints(rid) else {
            return;
        };
        if let Some(record) = self.graph.edge_weight(rid.as_index()) {
            let rel = record.rel.clone();
            self.by_key.remove(&rel.key());
            if rel.managed() {
                self.managed_ga.remove(&MemoryStore::managed_key(
                    from,
                    rel.kind().tag(),
                    &rel.target().ga(),
                ));
            }
        }
        self.selections.remove(&rid);
        self.graph.remove_edge(rid.as_index());
    }

    fn endpoints(&self, rid: Rid) -> Option<(Nid, Nid)> {
        self.graph
            .edge_endpoints(rid.as_index())
            .map(|(from, to)| (Nid::from(from), Nid::from(to)))
    }

    fn outgoing(&self, nid: Nid, kinds: EnumSet<EdgeKind>) -> Vec<Rid> {
        self.incident(nid, kinds, Direction::Outgoing)
    }

    fn incoming(&self, nid: Nid, kinds: EnumSet<EdgeKind>) -> Vec<Rid> {
        self.incident(nid, kinds, Direction::Incoming)
    }

    fn add_edge_sources(&mut self, rid: Rid, sources: &BTreeSet<Url>) {
        if let Some(record) = self.graph.edge_weight_mut(rid.as_index()) {
            record.rel = record.rel.add_sources(sources.iter().cloned());
        }
    }

    fn set_selection(&mut self, rid: Rid, selection: bool) {
        if let Some(record) = self.graph.edge_weight_mut(rid.as_index()) {
            record.selection = selection;
        }
        if selection {
            self.selections.insert(rid);
        } else {
            self.selections.remove(&rid);
        }
    }

    fn selection_edges(&self) -> Vec<Rid> {
        self.selections.iter().copied().collect()
    }

    fn mark_cycle_injected(&mut self, rid: Rid) {
        if let Some(record) = self.graph.edge_weight_mut(rid.as_index()) {
            record.cycle_injected = true;
        }
    }

    fn managed_target(&self, declaring: Nid, kind_tag: &str, ga: &str) -> Option<Rid> {
        self.managed_ga
            .get(&MemoryStore::managed_key(declaring, kind_tag, ga))
            .copied()
    }

    fn metadata(&self, nid: Nid) -> Option<&BTreeMap<String, String>> {
        self.node(nid).map(|record| &record.metadata)
    }

    fn add_metadata(&mut self, nid: Nid, key: &str, value: &str) -> Result<(), DepGraphError> {
        let record = self
            .graph
            .node_weight_mut(nid.as_index())
            .ok_or_else(|| DepGraphError::NotFound(format!("No node for id {nid}")))?;
        record.metadata.insert(key.to_string(), value.to_string());
        self.meta_index.entry(key.to_string()).or_default().insert(nid);
        Ok(())
    }

    fn set_metadata(
        &mut self,
        nid: Nid,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), DepGraphError> {
        let record = self
            .graph
            .node_weight_mut(nid.as_index())
            .ok_or_else(|| DepGraphError::NotFound(format!("No node for id {nid}")))?;
        for set in self.meta_index.values_mut() {
            set.remove(&nid);
        }
        for key in metadata.keys() {
            self.meta_index.entry(key.clone()).or_default().insert(nid);
        }
        record.metadata = metadata;
        Ok(())
    }

    fn nodes_with_metadata(&self, key: &str) -> Vec<Nid> {
        self.meta_index
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn reindex_metadata(&mut self) {
        self.meta_index.clear();
        for idx in self.graph.node_indices() {
            let nid = Nid::from(idx);
            if let Some(record) = self.graph.node_weight(idx) {
                for key in record.metadata.keys() {
                    self.meta_index.entry(key.clone()).or_default().insert(nid);
                }
            }
        }
    }

    fn view_cache(&self, view: &ViewId) -> Option<&ViewCache> {
        self.views.get(view)
    }

    fn view_cache_mut(&mut self, view: &ViewId) -> &mut ViewCache {
        self.views.entry(view.clone()).or_insert_with(ViewCache::new)
    }

    fn drop_view_cache(&mut self, view: &ViewId) {
        self.views.remove(view);
    }

    fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().cloned().collect()
    }

    fn run_query(&self, query: &str, _params: &[String]) -> Result<Vec<QueryRow>, DepGraphError> {
        Err(DepGraphError::Driver(format!(
            "The in-memory store has no declarative query engine (query: '{query}')"
        )))
    }
}
