//! Typed, directed relationships between project coordinates.
//!
//! A [`Relationship`] is a value: one declared association between a declaring
//! project and a target, tagged with a [`RelationKind`], declaration metadata
//! (source URIs, POM location, declaration index) and the managed flag.
//! Relationship identity is carried by [`Relationship::key`]; mutation always
//! goes through the pure constructors (`add_source`, `select_target`, ...)
//! which return a new value.
//!
//! [`EdgeKind`] is the storage projection of kind x managed, used to restrict
//! traversals and direct-neighbor queries to a typed subset of edges.

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
};
use url::Url;

use crate::{error::DepGraphError, ident::Coordinate};

/// Resolution scope of a dependency declaration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    #[default]
    Compile,
    Provided,
    Runtime,
    System,
    Test,
    Import,
}

impl Display for DependencyScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencyScope::Compile => "compile",
            DependencyScope::Provided => "provided",
            DependencyScope::Runtime => "runtime",
            DependencyScope::System => "system",
            DependencyScope::Test => "test",
            DependencyScope::Import => "import",
        };
        write!(f, "{label}")
    }
}

/// The semantic kind of a relationship, as declared in the originating POM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Dependency { scope: DependencyScope },
    Plugin,
    PluginDep,
    Parent,
    Bom,
    Extension,
}

impl RelationKind {
    pub fn dependency() -> Self {
        RelationKind::Dependency {
            scope: DependencyScope::default(),
        }
    }

    /// Kind tag without scope, used for identity keys and managed-GA lookups.
    pub fn tag(&self) -> &'static str {
        match self {
            RelationKind::Dependency { .. } => "dependency",
            RelationKind::Plugin => "plugin",
            RelationKind::PluginDep => "plugin-dep",
            RelationKind::Parent => "parent",
            RelationKind::Bom => "bom",
            RelationKind::Extension => "extension",
        }
    }

    /// Parent and BOM edges are structural: they stay concrete even though a
    /// BOM is declared inside a management section.
    pub fn is_structural(&self) -> bool {
        matches!(self, RelationKind::Parent | RelationKind::Bom)
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Dependency { scope } => write!(f, "dependency({scope})"),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// Storage-level edge type: the (kind, managed) projection of a relationship.
#[derive(EnumSetType, Debug, Hash)]
pub enum EdgeKind {
    Parent,
    Bom,
    Extension,
    Dependency,
    ManagedDependency,
    Plugin,
    ManagedPlugin,
    PluginDep,
    ManagedPluginDep,
}

impl EdgeKind {
    pub fn map(kind: &RelationKind, managed: bool) -> EdgeKind {
        match (kind, managed) {
            (RelationKind::Parent, _) => EdgeKind::Parent,
            (RelationKind::Bom, _) => EdgeKind::Bom,
            (RelationKind::Extension, _) => EdgeKind::Extension,
            (RelationKind::Dependency { .. }, false) => EdgeKind::Dependency,
            (RelationKind::Dependency { .. }, true) => EdgeKind::ManagedDependency,
            (RelationKind::Plugin, false) => EdgeKind::Plugin,
            (RelationKind::Plugin, true) => EdgeKind::ManagedPlugin,
            (RelationKind::PluginDep, false) => EdgeKind::PluginDep,
            (RelationKind::PluginDep, true) => EdgeKind::ManagedPluginDep,
        }
    }

    pub fn is_managed(&self) -> bool {
        matches!(
            self,
            EdgeKind::ManagedDependency | EdgeKind::ManagedPlugin | EdgeKind::ManagedPluginDep
        )
    }

    /// Sort weight for ordered traversal: structural kinds expand before
    /// concrete declarations, managed variants last.
    pub fn priority(&self) -> u8 {
        match self {
            EdgeKind::Parent => 0,
            EdgeKind::Bom => 1,
            EdgeKind::Extension => 2,
            EdgeKind::Dependency => 3,
            EdgeKind::Plugin => 4,
            EdgeKind::PluginDep => 5,
            EdgeKind::ManagedDependency => 6,
            EdgeKind::ManagedPlugin => 7,
            EdgeKind::ManagedPluginDep => 8,
        }
    }

    /// The edge-kind set implied by a list of relationship kinds plus
    /// managed/concrete switches, as used by direct-neighbor queries.
    pub fn for_kinds(
        kinds: &[RelationKind],
        include_managed: bool,
        include_concrete: bool,
    ) -> EnumSet<EdgeKind> {
        let mut set = EnumSet::empty();
        for kind in kinds {
            if include_concrete {
                set.insert(EdgeKind::map(kind, false));
            }
            if include_managed {
                set.insert(EdgeKind::map(kind, true));
            }
        }
        set
    }
}

/// A typed, directed association between two coordinates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relationship {
    kind: RelationKind,
    declaring: Coordinate,
    target: Coordinate,
    managed: bool,
    sources: BTreeSet<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pom_location: Option<Url>,
    index: u32,
}

impl Relationship {
    /// Construct a relationship. At least one source URI is required; parent
    /// and BOM edges are forced concrete regardless of the managed argument.
    pub fn new(
        kind: RelationKind,
        declaring: Coordinate,
        target: Coordinate,
        sources: BTreeSet<Url>,
        index: u32,
        managed: bool,
    ) -> Result<Self, DepGraphError> {
        if sources.is_empty() {
            return Err(DepGraphError::InvalidArgument(format!(
                "Relationship {kind} [{declaring} => {target}] requires at least one source URI"
            )));
        }
        Ok(Relationship {
            managed: managed && !kind.is_structural(),
            kind,
            declaring,
            target,
            sources,
            pom_location: None,
            index,
        })
    }

    pub fn with_pom_location(mut self, pom_location: Url) -> Self {
        self.pom_location = Some(pom_location);
        self
    }

    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }

    pub fn declaring(&self) -> &Coordinate {
        &self.declaring
    }

    pub fn target(&self) -> &Coordinate {
        &self.target
    }

    pub fn managed(&self) -> bool {
        self.managed
    }

    /// Parent and BOM edges are concrete by construction; everything else is
    /// concrete unless it came from a management section.
    pub fn concrete(&self) -> bool {
        self.kind.is_structural() || !self.managed
    }

    pub fn sources(&self) -> &BTreeSet<Url> {
        &self.sources
    }

    pub fn pom_location(&self) -> Option<&Url> {
        self.pom_location.as_ref()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// The artifact actually consumed through this edge. Structural edges
    /// (parent, BOM) consume the target's POM artifact.
    pub fn target_artifact(&self) -> Coordinate {
        if self.kind.is_structural() {
            self.target.as_pom_artifact()
        } else {
            self.target.clone()
        }
    }

    /// A parent edge pointing back at its own declaring project marks the
    /// top of an inheritance chain rather than a real association.
    pub fn is_terminus(&self) -> bool {
        matches!(self.kind, RelationKind::Parent) && self.declaring.gav() == self.target.gav()
    }

    pub fn edge_kind(&self) -> EdgeKind {
        EdgeKind::map(&self.kind, self.managed)
    }

    /// Deterministic identity of this relationship within the store. Sources
    /// and POM location do not participate: re-adding the same declaration
    /// from another source unions onto one edge.
    pub fn key(&self) -> String {
        let scope = match &self.kind {
            RelationKind::Dependency { scope } => scope.to_string(),
            _ => String::new(),
        };
        format!(
            "{}:{}:{}|{}>{}|{}",
            self.kind.tag(),
            scope,
            self.managed,
            self.declaring,
            self.target,
            self.index
        )
    }

    /// A copy of this relationship carrying one additional source URI.
    pub fn add_source(&self, source: Url) -> Self {
        let mut sources = self.sources.clone();
        sources.insert(source);
        Relationship {
            sources,
            ..self.clone()
        }
    }

    /// A copy of this relationship carrying the union of source URIs.
    pub fn add_sources<I: IntoIterator<Item = Url>>(&self, sources: I) -> Self {
        let mut merged = self.sources.clone();
        merged.extend(sources);
        Relationship {
            sources: merged,
            ..self.clone()
        }
    }

    /// Substitute the declaring coordinate, preserving all other attributes.
    pub fn select_declaring(&self, declaring: Coordinate) -> Self {
        Relationship {
            declaring,
            ..self.clone()
        }
    }

    /// Substitute the target coordinate, preserving all other attributes.
    pub fn select_target(&self, target: Coordinate) -> Self {
        Relationship {
            target,
            ..self.clone()
        }
    }

    /// Re-home the declaration under another declaring project, keeping the
    /// POM location. Used when an inherited section is materialized for a
    /// child project.
    pub fn clone_for(&self, declaring: Coordinate) -> Self {
        self.select_declaring(declaring)
    }
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} => {}]{}",
            self.kind,
            self.declaring,
            self.target,
            if self.managed { " (managed)" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn source() -> BTreeSet<Url> {
        BTreeSet::from([Url::parse("https://repo.example.org/central").unwrap()])
    }

    fn coord(gav: &str) -> Coordinate {
        Coordinate::try_from(gav).unwrap()
    }

    #[test]
    fn bom_is_concrete_and_unmanaged() {
        let bom = Relationship::new(
            RelationKind::Bom,
            coord("org.acme:parent:1"),
            coord("org.acme:platform:2"),
            source(),
            0,
            true,
        )
        .unwrap();
        assert!(bom.concrete());
        assert!(!bom.managed());
        assert_eq!(bom.target_artifact().extension(), Some("pom"));
    }

    #[test]
    fn select_endpoints_preserve_attributes() {
        let rel = Relationship::new(
            RelationKind::Bom,
            coord("g:p:1"),
            coord("g:q:1"),
            source(),
            3,
            false,
        )
        .unwrap();
        let moved = rel.select_declaring(coord("g:p2:1"));
        assert_eq!(moved.declaring().gav(), "g:p2:1");
        assert_eq!(moved.target(), rel.target());
        assert_eq!(moved.index(), 3);
        assert_eq!(moved.sources(), rel.sources());
    }

    #[test]
    fn sources_are_required_and_unioned() {
        let err = Relationship::new(
            RelationKind::dependency(),
            coord("g:a:1"),
            coord("g:b:1"),
            BTreeSet::new(),
            0,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DepGraphError::InvalidArgument(_)));

        let rel = Relationship::new(
            RelationKind::dependency(),
            coord("g:a:1"),
            coord("g:b:1"),
            source(),
            0,
            false,
        )
        .unwrap();
        let other = Url::parse("https://mirror.example.org/repo").unwrap();
        let merged = rel.add_source(other.clone());
        assert_eq!(merged.sources().len(), 2);
        assert!(merged.sources().contains(&other));
        // identity is unchanged by source union
        assert_eq!(merged.key(), rel.key());
    }

    #[test]
    fn parent_terminus_detection() {
        let terminus = Relationship::new(
            RelationKind::Parent,
            coord("g:a:1"),
            coord("g:a:1"),
            source(),
            0,
            false,
        )
        .unwrap();
        assert!(terminus.is_terminus());

        let real = terminus.select_target(coord("g:parent:1"));
        assert!(!real.is_terminus());
    }

    #[test]
    fn edge_kind_projection() {
        assert_eq!(
            EdgeKind::map(&RelationKind::dependency(), true),
            EdgeKind::ManagedDependency
        );
        let set = EdgeKind::for_kinds(&[RelationKind::dependency(), RelationKind::Plugin], true, false);
        assert!(set.contains(EdgeKind::ManagedDependency));
        assert!(set.contains(EdgeKind::ManagedPlugin));
        assert!(!set.contains(EdgeKind::Dependency));
    }
}
