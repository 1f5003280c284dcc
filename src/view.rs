//! Views: the unit users query against.
//!
//! A view is a set of root coordinates, a filter, a version-selection policy
//! and the acceptance sets (active sources, active POM locations) that gate
//! which edges the view can see. Its [`ViewId`] is a deterministic hash of
//! that configuration and names the view's caches inside the store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display, Formatter},
    sync::Arc,
};
use url::Url;

use crate::{
    config::WorkspaceConfig,
    filter::{AcceptAll, RelationFilter},
    ident::{Coordinate, ProjectKey},
    path::PathInfo,
    rel::Relationship,
    selector::{NoopSelector, VersionSelector},
};

/// Short identifier of a view; also the key of the view's store caches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ViewId(String);

pub const GLOBAL_VIEW_ID: &str = "_global";

impl ViewId {
    /// The reserved id of the rootless global view. Global queries bypass
    /// the per-view caches.
    pub fn global() -> Self {
        ViewId(GLOBAL_VIEW_ID.to_string())
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_VIEW_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration of one view.
#[derive(Debug, Clone)]
pub struct ViewParams {
    roots: BTreeSet<Coordinate>,
    filter: Arc<dyn RelationFilter>,
    selector: Arc<dyn VersionSelector>,
    active_sources: BTreeSet<Url>,
    active_pom_locations: BTreeSet<Url>,
}

impl ViewParams {
    pub fn new<I: IntoIterator<Item = Coordinate>>(roots: I) -> Self {
        ViewParams {
            roots: roots.into_iter().collect(),
            filter: Arc::new(AcceptAll),
            selector: Arc::new(NoopSelector),
            active_sources: BTreeSet::new(),
            active_pom_locations: BTreeSet::new(),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn RelationFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_selector(mut self, selector: Arc<dyn VersionSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_active_sources<I: IntoIterator<Item = Url>>(mut self, sources: I) -> Self {
        self.active_sources = sources.into_iter().collect();
        self
    }

    pub fn with_active_pom_locations<I: IntoIterator<Item = Url>>(mut self, locations: I) -> Self {
        self.active_pom_locations = locations.into_iter().collect();
        self
    }

    pub fn roots(&self) -> &BTreeSet<Coordinate> {
        &self.roots
    }

    pub fn filter(&self) -> &Arc<dyn RelationFilter> {
        &self.filter
    }

    pub fn selector(&self) -> &Arc<dyn VersionSelector> {
        &self.selector
    }

    pub fn active_sources(&self) -> &BTreeSet<Url> {
        &self.active_sources
    }

    pub fn active_sources_mut(&mut self) -> &mut BTreeSet<Url> {
        &mut self.active_sources
    }

    pub fn active_pom_locations(&self) -> &BTreeSet<Url> {
        &self.active_pom_locations
    }

    pub fn active_pom_locations_mut(&mut self) -> &mut BTreeSet<Url> {
        &mut self.active_pom_locations
    }

    /// Deterministic JSON descriptor of the full configuration. This is the
    /// form an on-disk store would persist on the view node.
    pub fn describe(&self) -> String {
        serde_json::json!({
            "roots": self.roots.iter().map(|c| c.to_string()).collect::<Vec<String>>(),
            "filter": self.filter.describe(),
            "selector": self.selector.describe(),
            "sources": self.active_sources.iter().map(|u| u.to_string()).collect::<Vec<String>>(),
            "pom_locations": self
                .active_pom_locations
                .iter()
                .map(|u| u.to_string())
                .collect::<Vec<String>>(),
        })
        .to_string()
    }

    /// The stable short id: first 16 hex chars of SHA-256 over the JSON
    /// descriptor.
    pub fn short_id(&self) -> ViewId {
        let digest = Sha256::digest(self.describe().as_bytes());
        let mut hex = String::with_capacity(16);
        for byte in digest.iter().take(8) {
            hex.push_str(&format!("{byte:02x}"));
        }
        ViewId(hex)
    }

    /// The path info attached to the view's synthetic root paths.
    pub fn initial_path_info(&self, view: ViewId) -> PathInfo {
        PathInfo::new(view, self.filter.clone(), self.selector.clone())
    }

    /// Acceptance gate on declaration provenance: the edge's sources must
    /// intersect the effective active-source set and its POM location must
    /// be in the effective active-location set. Empty sets accept
    /// everything; view-level sets shadow the workspace defaults.
    pub fn accepts_edge(&self, rel: &Relationship, workspace: &WorkspaceConfig) -> bool {
        let sources = if self.active_sources.is_empty() {
            &workspace.active_sources
        } else {
            &self.active_sources
        };
        if !sources.is_empty() && rel.sources().is_disjoint(sources) {
            return false;
        }

        let locations = if self.active_pom_locations.is_empty() {
            &workspace.active_pom_locations
        } else {
            &self.active_pom_locations
        };
        if !locations.is_empty() {
            if let Some(location) = rel.pom_location() {
                if !locations.contains(location) {
                    return false;
                }
            }
        }
        true
    }
}

/// Registered view: configuration plus the mutable per-view state that lives
/// on the view node.
#[derive(Debug, Clone)]
pub struct ViewState {
    params: ViewParams,
    /// Ad-hoc version selections, keyed by group:artifact.
    selections: BTreeMap<ProjectKey, String>,
    properties: BTreeMap<String, String>,
    last_access: Option<i64>,
}

impl ViewState {
    pub fn new(params: ViewParams) -> Self {
        ViewState {
            params,
            selections: BTreeMap::new(),
            properties: BTreeMap::new(),
            last_access: None,
        }
    }

    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ViewParams {
        &mut self.params
    }

    pub fn selections(&self) -> &BTreeMap<ProjectKey, String> {
        &self.selections
    }

    pub fn set_selection(&mut self, key: ProjectKey, version: String) {
        self.selections.insert(key, version);
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }

    pub fn last_access(&self) -> Option<i64> {
        self.last_access
    }

    pub fn set_last_access(&mut self, stamp: i64) {
        self.last_access = Some(stamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_stable_and_configuration_sensitive() {
        let a = ViewParams::new([Coordinate::new("g", "a", "1")]);
        let b = ViewParams::new([Coordinate::new("g", "a", "1")]);
        let c = ViewParams::new([Coordinate::new("g", "a", "2")]);

        assert_eq!(a.short_id(), b.short_id());
        assert_ne!(a.short_id(), c.short_id());
        assert_eq!(a.short_id().as_str().len(), 16);

        // the hashed descriptor is a well-formed JSON document
        let descriptor: serde_json::Value = serde_json::from_str(&a.describe()).unwrap();
        assert_eq!(descriptor["roots"][0], "g:a:1");
        assert_eq!(descriptor["filter"], "any");
    }

    #[test]
    fn source_acceptance_uses_workspace_fallback() {
        use crate::rel::RelationKind;
        let central = Url::parse("https://repo.example.org/central").unwrap();
        let mirror = Url::parse("https://mirror.example.org/repo").unwrap();
        let rel = Relationship::new(
            RelationKind::dependency(),
            Coordinate::new("g", "a", "1"),
            Coordinate::new("g", "b", "1"),
            BTreeSet::from([central.clone()]),
            0,
            false,
        )
        .unwrap();

        let view = ViewParams::new([Coordinate::new("g", "a", "1")]);
        let mut workspace = WorkspaceConfig::new();
        assert!(view.accepts_edge(&rel, &workspace));

        workspace.active_sources.insert(mirror.clone());
        assert!(!view.accepts_edge(&rel, &workspace));

        let view = view.with_active_sources([central]);
        assert!(view.accepts_edge(&rel, &workspace));
    }
}
