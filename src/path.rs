//! Paths through the graph and the filter/selector state attached to them.
//!
//! A [`GraphPath`] is the ordered sequence of edge identifiers from a view
//! root to the current node; the empty path denotes the root itself. Paths
//! are structural values: equality, ordering and the cache key all derive
//! from the identifier sequence alone.
//!
//! [`PathInfo`] is the traversal state accumulated along a path: the filter
//! and selector that apply to edges expanded from the path's target node.
//! Descending one edge narrows both via [`PathInfo::child_path_info`].

use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use crate::{
    filter::RelationFilter, rel::Relationship, selector::VersionSelector, store::Rid,
    view::ViewId,
};

/// Ordered sequence of edge identifiers from a root.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GraphPath(Vec<Rid>);

impl GraphPath {
    pub fn empty() -> Self {
        GraphPath(Vec::new())
    }

    pub fn from_rids<I: IntoIterator<Item = Rid>>(rids: I) -> Self {
        GraphPath(rids.into_iter().collect())
    }

    /// A new path extended by one edge. O(len) copy; paths stay short.
    pub fn append(&self, rid: Rid) -> Self {
        let mut rids = self.0.clone();
        rids.push(rid);
        GraphPath(rids)
    }

    pub fn last(&self) -> Option<Rid> {
        self.0.last().copied()
    }

    pub fn first(&self) -> Option<Rid> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Rid> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, rid: Rid) -> bool {
        self.0.contains(&rid)
    }

    /// The leading sub-path of the given length.
    pub fn prefix(&self, len: usize) -> Self {
        GraphPath(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Deterministic serialization of the identifier sequence.
    pub fn cache_key(&self) -> String {
        let mut key = String::new();
        for (idx, rid) in self.0.iter().enumerate() {
            if idx > 0 {
                key.push(',');
            }
            key.push_str(&rid.to_string());
        }
        key
    }
}

impl Display for GraphPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.cache_key())
    }
}

impl FromIterator<Rid> for GraphPath {
    fn from_iter<I: IntoIterator<Item = Rid>>(iter: I) -> Self {
        GraphPath(iter.into_iter().collect())
    }
}

/// A minimal cycle: the path tail from the first occurrence of the repeated
/// node, plus the edge that closed the loop.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CyclePath {
    pub path: GraphPath,
    pub injector: Rid,
}

impl CyclePath {
    pub fn new(path: GraphPath, injector: Rid) -> Self {
        CyclePath { path, injector }
    }

    /// All edge identifiers of the closed loop, injector last.
    pub fn rids(&self) -> Vec<Rid> {
        let mut rids: Vec<Rid> = self.path.iter().collect();
        rids.push(self.injector);
        rids
    }

    /// Rotation-independent identity: the same loop entered at a different
    /// node yields the same key.
    pub fn loop_key(&self) -> Vec<Rid> {
        let mut rids = self.rids();
        rids.sort();
        rids
    }
}

impl Display for CyclePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{} +{}]", self.path.cache_key(), self.injector)
    }
}

/// Filter + selector state attached to one cached path.
#[derive(Debug, Clone)]
pub struct PathInfo {
    view: ViewId,
    filter: Arc<dyn RelationFilter>,
    selector: Arc<dyn VersionSelector>,
}

impl PathInfo {
    pub fn new(
        view: ViewId,
        filter: Arc<dyn RelationFilter>,
        selector: Arc<dyn VersionSelector>,
    ) -> Self {
        PathInfo {
            view,
            filter,
            selector,
        }
    }

    pub fn view(&self) -> &ViewId {
        &self.view
    }

    pub fn filter(&self) -> &Arc<dyn RelationFilter> {
        &self.filter
    }

    pub fn selector(&self) -> &Arc<dyn VersionSelector> {
        &self.selector
    }

    /// The state that applies to edges expanded from `rel`'s target, or
    /// `None` when the filter rejects the edge and the branch ends here.
    pub fn child_path_info(&self, rel: &Relationship, path: &GraphPath) -> Option<PathInfo> {
        let child_filter = self.filter.accept(rel, path, self)?;
        let child_selector = self.selector.child(rel);
        Some(PathInfo {
            view: self.view.clone(),
            filter: child_filter,
            selector: child_selector,
        })
    }
}
