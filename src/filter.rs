//! Relationship filters.
//!
//! A filter is a pure predicate over a candidate edge plus its traversal
//! context. Accepting an edge yields the *child filter* that governs edges
//! expanded from the accepted edge's target, so filters narrow as traversal
//! descends. Filters also declare the [`EdgeKind`] set they could ever
//! accept, letting the traversal engine restrict the edges it even fetches.

use enumset::EnumSet;
use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{
    path::{GraphPath, PathInfo},
    rel::{DependencyScope, EdgeKind, RelationKind, Relationship},
};

pub trait RelationFilter: fmt::Debug + Send + Sync {
    /// Accept or reject a candidate edge. On accept, return the filter that
    /// applies one level deeper. Must not read mutable state.
    fn accept(
        &self,
        rel: &Relationship,
        path: &GraphPath,
        info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>>;

    /// The edge kinds this filter could ever accept. Used to restrict which
    /// edges the store is asked for during traversal.
    fn edge_kinds(&self) -> EnumSet<EdgeKind>;

    /// Deterministic descriptor, hashed into the owning view's short id.
    fn describe(&self) -> String;
}

/// Accepts every edge; the child filter is itself.
#[derive(Debug, Clone, Default)]
pub struct AcceptAll;

impl RelationFilter for AcceptAll {
    fn accept(
        &self,
        _rel: &Relationship,
        _path: &GraphPath,
        _info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>> {
        Some(Arc::new(AcceptAll))
    }

    fn edge_kinds(&self) -> EnumSet<EdgeKind> {
        EnumSet::all()
    }

    fn describe(&self) -> String {
        "any".to_string()
    }
}

/// Accepts edges whose storage kind is in the given set.
#[derive(Debug, Clone)]
pub struct KindFilter {
    kinds: EnumSet<EdgeKind>,
}

impl KindFilter {
    pub fn new(kinds: EnumSet<EdgeKind>) -> Self {
        KindFilter { kinds }
    }

    /// Convenience constructor from relationship kinds plus the
    /// managed/concrete switches.
    pub fn of(kinds: &[RelationKind], include_managed: bool, include_concrete: bool) -> Self {
        KindFilter {
            kinds: EdgeKind::for_kinds(kinds, include_managed, include_concrete),
        }
    }
}

impl RelationFilter for KindFilter {
    fn accept(
        &self,
        rel: &Relationship,
        _path: &GraphPath,
        _info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>> {
        if self.kinds.contains(rel.edge_kind()) {
            Some(Arc::new(self.clone()))
        } else {
            None
        }
    }

    fn edge_kinds(&self) -> EnumSet<EdgeKind> {
        self.kinds
    }

    fn describe(&self) -> String {
        let mut tags: Vec<String> = self.kinds.iter().map(|k| format!("{k:?}")).collect();
        tags.sort();
        format!("kind({})", tags.join("|"))
    }
}

/// Accepts structural edges plus dependencies in the given scopes.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    scopes: BTreeSet<DependencyScope>,
    include_managed: bool,
}

impl ScopeFilter {
    pub fn new<I: IntoIterator<Item = DependencyScope>>(scopes: I, include_managed: bool) -> Self {
        ScopeFilter {
            scopes: scopes.into_iter().collect(),
            include_managed,
        }
    }
}

impl RelationFilter for ScopeFilter {
    fn accept(
        &self,
        rel: &Relationship,
        _path: &GraphPath,
        _info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>> {
        let accepted = match rel.kind() {
            RelationKind::Dependency { scope } => {
                self.scopes.contains(scope) && (self.include_managed || !rel.managed())
            }
            kind => kind.is_structural(),
        };
        accepted.then(|| Arc::new(self.clone()) as Arc<dyn RelationFilter>)
    }

    fn edge_kinds(&self) -> EnumSet<EdgeKind> {
        let mut kinds = EdgeKind::Parent | EdgeKind::Bom | EdgeKind::Dependency;
        if self.include_managed {
            kinds |= EdgeKind::ManagedDependency;
        }
        kinds
    }

    fn describe(&self) -> String {
        let scopes: Vec<String> = self.scopes.iter().map(|s| s.to_string()).collect();
        format!("scope({};managed={})", scopes.join("|"), self.include_managed)
    }
}

/// Accepts iff every member accepts; the child is the conjunction of the
/// members' children.
#[derive(Debug, Clone)]
pub struct AllOf {
    filters: Vec<Arc<dyn RelationFilter>>,
}

impl RelationFilter for AllOf {
    fn accept(
        &self,
        rel: &Relationship,
        path: &GraphPath,
        info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>> {
        let mut children = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            children.push(filter.accept(rel, path, info)?);
        }
        Some(Arc::new(AllOf { filters: children }))
    }

    fn edge_kinds(&self) -> EnumSet<EdgeKind> {
        self.filters
            .iter()
            .fold(EnumSet::all(), |acc, f| acc & f.edge_kinds())
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.filters.iter().map(|f| f.describe()).collect();
        format!("all({})", parts.join(","))
    }
}

/// Accepts iff any member accepts; the child is the disjunction of the
/// accepting members' children.
#[derive(Debug, Clone)]
pub struct AnyOf {
    filters: Vec<Arc<dyn RelationFilter>>,
}

impl RelationFilter for AnyOf {
    fn accept(
        &self,
        rel: &Relationship,
        path: &GraphPath,
        info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>> {
        let children: Vec<Arc<dyn RelationFilter>> = self
            .filters
            .iter()
            .filter_map(|f| f.accept(rel, path, info))
            .collect();
        if children.is_empty() {
            None
        } else {
            Some(Arc::new(AnyOf { filters: children }))
        }
    }

    fn edge_kinds(&self) -> EnumSet<EdgeKind> {
        self.filters
            .iter()
            .fold(EnumSet::empty(), |acc, f| acc | f.edge_kinds())
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.filters.iter().map(|f| f.describe()).collect();
        format!("any({})", parts.join(","))
    }
}

/// Inverts the wrapped filter. The child is the same inversion: negation
/// cannot narrow.
#[derive(Debug, Clone)]
pub struct Not {
    filter: Arc<dyn RelationFilter>,
}

impl RelationFilter for Not {
    fn accept(
        &self,
        rel: &Relationship,
        path: &GraphPath,
        info: &PathInfo,
    ) -> Option<Arc<dyn RelationFilter>> {
        if self.filter.accept(rel, path, info).is_none() {
            Some(Arc::new(self.clone()))
        } else {
            None
        }
    }

    fn edge_kinds(&self) -> EnumSet<EdgeKind> {
        // The inverse of a kind set cannot be computed through the wrapped
        // filter's contract, so a negation never restricts edge fetch.
        EnumSet::all()
    }

    fn describe(&self) -> String {
        format!("not({})", self.filter.describe())
    }
}

pub fn all_of(filters: Vec<Arc<dyn RelationFilter>>) -> Arc<dyn RelationFilter> {
    Arc::new(AllOf { filters })
}

pub fn any_of(filters: Vec<Arc<dyn RelationFilter>>) -> Arc<dyn RelationFilter> {
    Arc::new(AnyOf { filters })
}

pub fn not(filter: Arc<dyn RelationFilter>) -> Arc<dyn RelationFilter> {
    Arc::new(Not { filter })
}
