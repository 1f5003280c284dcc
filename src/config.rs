//! Workspace-level configuration.
//!
//! The workspace config node carries the defaults every view falls back to:
//! the active source URIs and POM locations that gate edge acceptance, plus
//! free-form properties and the last-access stamp maintained by callers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Source URIs an edge must intersect to be accepted. Empty = accept all.
    #[serde(default)]
    pub active_sources: BTreeSet<Url>,
    /// POM locations an edge's declaration must come from. Empty = accept
    /// all.
    #[serde(default)]
    pub active_pom_locations: BTreeSet<Url>,
    /// Free-form key/value configuration.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Caller-maintained last-access stamp (milliseconds).
    #[serde(default)]
    pub last_access: Option<i64>,
}

impl WorkspaceConfig {
    pub fn new() -> Self {
        WorkspaceConfig::default()
    }
}
