//! The traversal engine.
//!
//! [`collect`] walks typed edges from a set of seeded paths, consulting the
//! selector hook and the filter carried in each path's [`PathInfo`], and
//! emits every accepted edge to a [`TraverseVisitor`]. Concrete visitors
//! (view updater, cycle collector, path-existence probe) are alternative
//! implementations of the visitor capability set, not engine subclasses.

use enumset::EnumSet;
use std::collections::{BTreeSet, VecDeque};

use crate::{
    config::WorkspaceConfig,
    error::DepGraphError,
    path::{CyclePath, GraphPath, PathInfo},
    rel::{EdgeKind, Relationship},
    store::{GraphStore, Nid, Rid},
    view::ViewParams,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
}

/// How often one relationship may be crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Uniqueness {
    /// At most once per path; distinct paths may share edges. Used for
    /// per-view path caching.
    #[default]
    RelationshipPath,
    /// At most once in the whole traversal. Used for global scans.
    RelationshipGlobal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    BreadthFirst,
    DepthFirst,
}

#[derive(Debug, Clone)]
pub struct TraversalSpec {
    pub direction: Direction,
    pub uniqueness: Uniqueness,
    pub order: Order,
    /// Skip edges marked as cycle injectors. When false, in-progress cycles
    /// are reported to the visitor instead.
    pub avoid_cycles: bool,
    /// Order candidate edges by (kind priority, declaring, index, target).
    pub sorted: bool,
    /// Edge kinds to fetch, normally implied by the view filter.
    pub kinds: EnumSet<EdgeKind>,
}

impl Default for TraversalSpec {
    fn default() -> Self {
        TraversalSpec {
            direction: Direction::default(),
            uniqueness: Uniqueness::default(),
            order: Order::default(),
            avoid_cycles: true,
            sorted: false,
            kinds: EnumSet::all(),
        }
    }
}

impl TraversalSpec {
    pub fn for_view(params: &ViewParams) -> Self {
        TraversalSpec {
            kinds: params.filter().edge_kinds(),
            ..TraversalSpec::default()
        }
    }
}

/// A traversal starting point: a node together with the path and state that
/// reached it. Fresh traversals seed the view roots with empty paths;
/// cache-extension traversals seed previously cached paths.
#[derive(Debug, Clone)]
pub struct Seed {
    pub node: Nid,
    pub path: GraphPath,
    pub info: Option<PathInfo>,
}

impl Seed {
    pub fn root(node: Nid, info: PathInfo) -> Self {
        Seed {
            node,
            path: GraphPath::empty(),
            info: Some(info),
        }
    }

    pub fn cached(node: Nid, path: GraphPath, info: PathInfo) -> Self {
        Seed {
            node,
            path,
            info: Some(info),
        }
    }
}

/// Selection hook consulted for every candidate edge. The engine's
/// implementation applies ad-hoc view selections and the path's selector,
/// materializing substitution edges in the store.
pub trait EdgeSelect<S: GraphStore> {
    fn select(
        &self,
        store: &mut S,
        rid: Rid,
        info: &PathInfo,
        path: &GraphPath,
    ) -> Result<Option<Rid>, DepGraphError>;
}

/// Lets every edge pass unchanged. Marked selection edges are still skipped
/// by the engine loop: they are never followed on their own merit.
#[derive(Debug, Clone, Default)]
pub struct PassthroughSelect;

impl<S: GraphStore> EdgeSelect<S> for PassthroughSelect {
    fn select(
        &self,
        _store: &mut S,
        rid: Rid,
        _info: &PathInfo,
        _path: &GraphPath,
    ) -> Result<Option<Rid>, DepGraphError> {
        Ok(Some(rid))
    }
}

/// Visitor capability set driven by [`collect`].
#[allow(unused_variables)]
pub trait TraverseVisitor<S: GraphStore> {
    /// Gate on whether a dequeued path should expand at all.
    fn is_enabled_for(&self, path: &GraphPath) -> bool {
        true
    }

    /// Redundant-path suppression; currently a declared no-op until a
    /// concrete policy exists.
    fn avoid_redundant_paths(&self) -> bool {
        false
    }

    /// Hook allowing a visitor to rewrite the effective path before lookup.
    fn splice_path(&self, path: GraphPath) -> GraphPath {
        path
    }

    fn splice_path_info(&self, info: PathInfo) -> PathInfo {
        info
    }

    /// Supply state for a seed that carries none (edgeless initial paths).
    fn initialize_path_info(&mut self, store: &S, root: Nid) -> Option<PathInfo> {
        None
    }

    /// Deduplication; returning true drops the dequeued path.
    fn has_seen(&mut self, store: &S, path: &GraphPath, info: &PathInfo) -> bool {
        false
    }

    /// Final say on expanding a path's children.
    fn include_children(&mut self, store: &S, path: &GraphPath, info: &PathInfo) -> bool {
        true
    }

    /// An edge was accepted: `path` is the extended path ending at the edge,
    /// `info` the state that will govern its children.
    fn including_child(
        &mut self,
        store: &mut S,
        rid: Rid,
        path: &GraphPath,
        info: &PathInfo,
        parent: &GraphPath,
    ) -> Result<(), DepGraphError>;

    /// Called for each in-progress cycle when the traversal does not avoid
    /// them.
    fn cycle_detected(&mut self, store: &mut S, cycle: &CyclePath) -> Result<(), DepGraphError> {
        Ok(())
    }

    fn traverse_complete(&mut self, store: &mut S) -> Result<(), DepGraphError> {
        Ok(())
    }
}

/// Multi-pass traversal consumer for the engine's `traverse` entry point.
/// Passes run sequentially, each with its own lifecycle.
#[allow(unused_variables)]
pub trait GraphTraversal {
    fn required_passes(&self) -> usize {
        1
    }

    fn order(&self, pass: usize) -> Order {
        Order::BreadthFirst
    }

    fn start_pass(&mut self, pass: usize) {}

    /// Return false to stop expanding below this edge.
    fn traverse_edge(&mut self, rel: &Relationship, path: &[Relationship], pass: usize) -> bool;

    fn edge_traversed(&mut self, rel: &Relationship, path: &[Relationship], pass: usize) {}

    fn end_pass(&mut self, pass: usize) {}
}

/// The node sequence a path visits, start node first.
fn path_nodes<S: GraphStore>(store: &S, path: &GraphPath, direction: Direction) -> Vec<Nid> {
    let mut nodes = Vec::with_capacity(path.len() + 1);
    for (idx, rid) in path.iter().enumerate() {
        if let Some((from, to)) = store.endpoints(rid) {
            let (head, tail) = match direction {
                Direction::Outgoing => (from, to),
                Direction::Incoming => (to, from),
            };
            if idx == 0 {
                nodes.push(head);
            }
            nodes.push(tail);
        }
    }
    nodes
}

fn sort_candidates<S: GraphStore>(store: &S, candidates: &mut [Rid]) {
    candidates.sort_by(|a, b| {
        let rel_a = store.edge(*a).map(|rec| &rec.rel);
        let rel_b = store.edge(*b).map(|rec| &rec.rel);
        match (rel_a, rel_b) {
            (Some(ra), Some(rb)) => (
                ra.edge_kind().priority(),
                ra.declaring().clone(),
                ra.index(),
                ra.target().clone(),
            )
                .cmp(&(
                    rb.edge_kind().priority(),
                    rb.declaring().clone(),
                    rb.index(),
                    rb.target().clone(),
                )),
            _ => std::cmp::Ordering::Equal,
        }
    });
}

/// Walk the graph from `seeds`, driving `visitor` with every accepted edge.
///
/// Each dequeued path goes through the visitor gates (`is_enabled_for`,
/// splice hooks, `has_seen`, `include_children`); each candidate edge then
/// passes, in order: path/global uniqueness, the cycle-injector skip, the
/// selector hook, the selection-edge rule, provenance acceptance, and the
/// filter carried in the path state. Survivors are emitted and enqueued.
pub fn collect<S, V>(
    store: &mut S,
    params: &ViewParams,
    workspace: &WorkspaceConfig,
    spec: &TraversalSpec,
    seeds: Vec<Seed>,
    select: &dyn EdgeSelect<S>,
    visitor: &mut V,
) -> Result<(), DepGraphError>
where
    S: GraphStore,
    V: TraverseVisitor<S>,
{
    let mut frontier: VecDeque<(GraphPath, PathInfo, Nid)> = VecDeque::new();
    for seed in seeds {
        let info = match seed.info {
            Some(info) => info,
            None => match visitor.initialize_path_info(store, seed.node) {
                Some(info) => info,
                None => {
                    tracing::debug!("no initial path state for seed {}; skipping", seed.node);
                    continue;
                }
            },
        };
        frontier.push_back((seed.path, info, seed.node));
    }

    let mut crossed: BTreeSet<Rid> = BTreeSet::new();

    while let Some((path, info, node)) = match spec.order {
        Order::BreadthFirst => frontier.pop_front(),
        Order::DepthFirst => frontier.pop_back(),
    } {
        if !visitor.is_enabled_for(&path) {
            tracing::debug!("visitor disabled, not expanding: {}", path);
            continue;
        }

        let path = visitor.splice_path(path);
        let info = visitor.splice_path_info(info);

        if visitor.has_seen(store, &path, &info) {
            tracing::debug!("already seen: {}", path);
            continue;
        }

        if visitor.avoid_redundant_paths() {
            // no concrete suppression policy exists yet; paths that merely
            // pass through another start node are left alone
        }

        if !spec.avoid_cycles && !path.is_empty() {
            let nodes = path_nodes(store, &path, spec.direction);
            // the last entry is the terminal node; an earlier occurrence
            // means the final edge closed a loop
            if nodes.len() > 1 {
                let terminal = nodes[nodes.len() - 1];
                if let Some(at) = nodes[..nodes.len() - 1].iter().position(|n| *n == terminal) {
                    let rids: Vec<Rid> = path.iter().collect();
                    let cycle = CyclePath::new(
                        GraphPath::from_rids(rids[at..rids.len() - 1].iter().copied()),
                        rids[rids.len() - 1],
                    );
                    tracing::debug!("detected cycle in progress at {}: {}", path, cycle);
                    visitor.cycle_detected(store, &cycle)?;
                    continue;
                }
            }
        }

        if !visitor.include_children(store, &path, &info) {
            tracing::debug!("children not being returned for: {}", path);
            continue;
        }

        let mut candidates = match spec.direction {
            Direction::Outgoing => store.outgoing(node, spec.kinds),
            Direction::Incoming => store.incoming(node, spec.kinds),
        };
        if spec.sorted {
            sort_candidates(store, &mut candidates);
        }

        for rid in candidates {
            match spec.uniqueness {
                Uniqueness::RelationshipPath => {
                    if path.contains(rid) {
                        continue;
                    }
                }
                Uniqueness::RelationshipGlobal => {
                    if !crossed.insert(rid) {
                        continue;
                    }
                }
            }

            let Some(record) = store.edge(rid) else {
                continue;
            };
            if spec.avoid_cycles && record.cycle_injected {
                tracing::debug!("skipping marked cycle injector {} from {}", rid, path);
                continue;
            }

            let Some(selected) = select.select(store, rid, &info, &path)? else {
                tracing::debug!("selection rejected {} at {}", rid, path);
                continue;
            };

            let Some(record) = store.edge(selected) else {
                continue;
            };
            if selected == rid && record.selection {
                // selection edges are only followed when a selector chose
                // them for this traversal
                tracing::debug!("{} is a selection edge not chosen here; skipping", rid);
                continue;
            }
            let rel = record.rel.clone();

            if !params.accepts_edge(&rel, workspace) {
                tracing::debug!(
                    "{} not accepted: incompatible POM location or source URI",
                    rel
                );
                continue;
            }

            let Some(child_info) = info.child_path_info(&rel, &path) else {
                tracing::debug!("filter rejected {} at {}", rel, path);
                continue;
            };

            let new_path = path.append(selected);
            let Some((from, to)) = store.endpoints(selected) else {
                continue;
            };
            let next_node = match spec.direction {
                Direction::Outgoing => to,
                Direction::Incoming => from,
            };

            visitor.including_child(store, selected, &new_path, &child_info, &path)?;
            frontier.push_back((new_path, child_info, next_node));
        }
    }

    visitor.traverse_complete(store)
}
