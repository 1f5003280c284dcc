//! Version-selection policies.
//!
//! A selector inspects each candidate edge together with the path that led
//! to it and either lets the edge pass, substitutes a different relationship
//! (which the engine materializes as a selection edge), or rejects the
//! branch. Selector state travels inside [`PathInfo`](crate::path::PathInfo):
//! each accepted edge produces the child selector that applies one level
//! deeper, so decisions can depend on earlier path choices.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    ident::ProjectKey,
    path::GraphPath,
    rel::Relationship,
};

pub trait VersionSelector: fmt::Debug + Send + Sync {
    /// Decide the fate of a candidate edge.
    ///
    /// - `Some(rel)` equal to the input: traversal continues through the
    ///   original edge.
    /// - `Some(rel)` different from the input: the engine resolves or
    ///   creates the substitute edge and traversal continues through it.
    /// - `None`: the branch is rejected.
    fn select(&self, rel: &Relationship, path: &GraphPath) -> Option<Relationship>;

    /// The selector that applies to edges expanded from `rel`'s target.
    fn child(&self, rel: &Relationship) -> Arc<dyn VersionSelector>;

    /// Deterministic descriptor, hashed into the owning view's short id.
    fn describe(&self) -> String;
}

/// Lets every edge pass unchanged.
#[derive(Debug, Clone, Default)]
pub struct NoopSelector;

impl VersionSelector for NoopSelector {
    fn select(&self, rel: &Relationship, _path: &GraphPath) -> Option<Relationship> {
        Some(rel.clone())
    }

    fn child(&self, _rel: &Relationship) -> Arc<dyn VersionSelector> {
        Arc::new(NoopSelector)
    }

    fn describe(&self) -> String {
        "noop".to_string()
    }
}

/// First-win version pinning: the first version of a group:artifact seen
/// along a path wins, and later occurrences on the same path are rewritten
/// to it.
#[derive(Debug, Clone, Default)]
pub struct FirstWinSelector {
    pinned: BTreeMap<ProjectKey, String>,
}

impl FirstWinSelector {
    pub fn new() -> Self {
        FirstWinSelector::default()
    }
}

impl VersionSelector for FirstWinSelector {
    fn select(&self, rel: &Relationship, _path: &GraphPath) -> Option<Relationship> {
        let target = rel.target();
        match self.pinned.get(&target.key()) {
            Some(version) if version != target.version() => {
                let substituted = rel.select_target(target.with_version(version.clone()));
                tracing::debug!(
                    "pinning {} to first-seen version {}: {} -> {}",
                    target.key(),
                    version,
                    rel,
                    substituted
                );
                Some(substituted)
            }
            _ => Some(rel.clone()),
        }
    }

    fn child(&self, rel: &Relationship) -> Arc<dyn VersionSelector> {
        let target = rel.target();
        let mut pinned = self.pinned.clone();
        pinned
            .entry(target.key())
            .or_insert_with(|| target.version().to_string());
        Arc::new(FirstWinSelector { pinned })
    }

    fn describe(&self) -> String {
        "first-win".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ident::Coordinate, rel::RelationKind};
    use std::collections::BTreeSet;
    use url::Url;

    fn dep(declaring: &str, target: &str) -> Relationship {
        Relationship::new(
            RelationKind::dependency(),
            Coordinate::try_from(declaring).unwrap(),
            Coordinate::try_from(target).unwrap(),
            BTreeSet::from([Url::parse("https://repo.example.org/central").unwrap()]),
            0,
            false,
        )
        .unwrap()
    }

    #[test]
    fn first_win_rewrites_later_versions() {
        let selector = FirstWinSelector::new();
        let first = dep("g:root:1", "g:lib:1.0");
        let path = GraphPath::empty();

        // first sighting passes through and pins 1.0
        assert_eq!(selector.select(&first, &path), Some(first.clone()));
        let child = selector.child(&first);

        // a deeper edge to g:lib:2.0 is rewritten to 1.0
        let conflicting = dep("g:mid:1", "g:lib:2.0");
        let selected = child.select(&conflicting, &path).unwrap();
        assert_eq!(selected.target().version(), "1.0");
        assert_ne!(selected, conflicting);

        // an edge already at the pinned version passes unchanged
        let agreeing = dep("g:mid:1", "g:lib:1.0");
        assert_eq!(child.select(&agreeing, &path), Some(agreeing.clone()));
    }
}
