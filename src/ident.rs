//! Coordinate identities for build artifacts.
//!
//! A [`Coordinate`] names one project release: group, artifact, version, plus
//! an optional classifier and packaging extension. A [`ProjectKey`] is the
//! version-less projection (group + artifact) used for managed-version lookups
//! and ad-hoc selections.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::DepGraphError;

/// Matches version ranges (`[1.0,2.0)`, `(,1.5]`) and unresolved property
/// expressions (`${project.version}`).
static VARIABLE_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\[(].*[\])]$|\$\{[^}]*\}")
        .expect("the variable-version pattern to be a valid regex")
});

/// Version-less identity of a project: group + artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectKey {
    group: String,
    artifact: String,
}

impl ProjectKey {
    pub fn new<G: Into<String>, A: Into<String>>(group: G, artifact: A) -> Self {
        ProjectKey {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }
}

impl Display for ProjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl TryFrom<&str> for ProjectKey {
    type Error = DepGraphError;

    fn try_from(string: &str) -> Result<Self, Self::Error> {
        let mut parts = string.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(g), Some(a), None) if !g.is_empty() && !a.is_empty() => {
                Ok(ProjectKey::new(g, a))
            }
            _ => Err(DepGraphError::InvalidArgument(format!(
                "Not a 'group:artifact' key: '{string}'"
            ))),
        }
    }
}

/// Full coordinate of a build artifact.
///
/// Canonical rendering is `group:artifact:version`, extended with
/// `:extension` and `:extension:classifier` segments when present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    group: String,
    artifact: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extension: Option<String>,
}

impl Coordinate {
    pub fn new<G, A, V>(group: G, artifact: A, version: V) -> Self
    where
        G: Into<String>,
        A: Into<String>,
        V: Into<String>,
    {
        Coordinate {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            extension: None,
        }
    }

    pub fn with_classifier<C: Into<String>>(mut self, classifier: C) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_extension<E: Into<String>>(mut self, extension: E) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// The same coordinate at a different version. Classifier and extension
    /// are preserved.
    pub fn with_version<V: Into<String>>(&self, version: V) -> Self {
        Coordinate {
            version: version.into(),
            ..self.clone()
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Project to the version-less group:artifact key.
    pub fn key(&self) -> ProjectKey {
        ProjectKey::new(self.group.clone(), self.artifact.clone())
    }

    /// `group:artifact` rendering used by the GA index.
    pub fn ga(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// `group:artifact:version` rendering used by the GAV index. Classifier
    /// and extension do not participate, mirroring node interning: all
    /// artifacts of one release share a node.
    pub fn gav(&self) -> String {
        format!("{}:{}:{}", self.group, self.artifact, self.version)
    }

    /// The POM artifact of this release, used as the structural target of
    /// parent and BOM edges.
    pub fn as_pom_artifact(&self) -> Coordinate {
        Coordinate {
            classifier: None,
            extension: Some("pom".to_string()),
            ..self.clone()
        }
    }

    /// True when the version is a range or an unresolved expression rather
    /// than a single literal.
    pub fn is_variable(&self) -> bool {
        VARIABLE_VERSION.is_match(&self.version)
    }

    /// Check that the coordinate is usable as a graph node identity.
    pub fn validate(&self) -> Result<(), DepGraphError> {
        if self.group.trim().is_empty() || self.artifact.trim().is_empty() {
            return Err(DepGraphError::InvalidArgument(format!(
                "Coordinate must carry a group and artifact: '{self}'"
            )));
        }
        if self.version.trim().is_empty() {
            return Err(DepGraphError::InvalidVersion {
                coordinate: self.ga(),
                reason: "version is empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(ext) = &self.extension {
            write!(f, ":{ext}")?;
            if let Some(cls) = &self.classifier {
                write!(f, ":{cls}")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<&str> for Coordinate {
    type Error = DepGraphError;

    fn try_from(string: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = string.split(':').collect();
        let coordinate = match parts.as_slice() {
            [g, a, v] => Coordinate::new(*g, *a, *v),
            [g, a, v, ext] => Coordinate::new(*g, *a, *v).with_extension(*ext),
            [g, a, v, ext, cls] => Coordinate::new(*g, *a, *v)
                .with_extension(*ext)
                .with_classifier(*cls),
            _ => {
                return Err(DepGraphError::InvalidArgument(format!(
                    "Not a coordinate: '{string}'"
                )))
            }
        };
        coordinate.validate()?;
        Ok(coordinate)
    }
}
