use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::DepsError;

/// Root of the tree printed by `npm ls --json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyRoot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Option<DependencyNodes>,
}

/// One position in the installed tree, keyed by its declared name in the parent map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyNode {
    #[serde(default)]
    pub resolved: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: Option<DependencyNodes>,
}

/// Children of a tree node in the order the package manager printed them.
#[derive(Debug, Clone, Default)]
pub struct DependencyNodes(pub Vec<(String, DependencyNode)>);

impl DependencyNodes {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DependencyNode)> {
        self.0.iter().map(|(name, node)| (name.as_str(), node))
    }
}

impl<'de> Deserialize<'de> for DependencyNodes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodesVisitor;

        impl<'de> Visitor<'de> for NodesVisitor {
            type Value = DependencyNodes;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of dependency names to tree nodes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut nodes = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, node)) = map.next_entry::<String, DependencyNode>()? {
                    nodes.push((name, node));
                }
                Ok(DependencyNodes(nodes))
            }
        }

        deserializer.deserialize_map(NodesVisitor)
    }
}

/// A deduplicated `(name, version)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySimple {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    pub version: String,
    pub nodes_nr: usize,
}

/// A [`DependencySimple`] enriched with manifest and repository metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAdvanced {
    #[serde(flatten)]
    pub simple: DependencySimple,
    pub esm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spdx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub package: Package,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_readme_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_license_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_license: Option<String>,
}

impl DependencyAdvanced {
    pub fn name(&self) -> &str {
        &self.simple.name
    }

    pub fn version(&self) -> &str {
        &self.simple.version
    }
}

/// An installed `package.json`. Only the fields the pipeline reads are typed;
/// everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Package {
    pub fn description(&self) -> Option<&str> {
        self.extra
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The manifest's own license declaration, accepting both the string form and
    /// the legacy `{ "type": "MIT" }` object form.
    pub fn license_id(&self) -> Option<&str> {
        match self.license.as_ref()? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("type").and_then(Value::as_str),
            _ => None,
        }
        .filter(|s| !s.is_empty())
    }
}

/// The `repository` field of a manifest: `"owner/repo"`, a URL, or `{ "url": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryField {
    Url(String),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl RepositoryField {
    pub fn url(&self) -> Option<&str> {
        match self {
            RepositoryField::Url(url) => Some(url.as_str()),
            RepositoryField::Object { url, .. } => url.as_deref(),
        }
    }
}

/// Repository metadata as returned by `GET https://api.github.com/repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub owner: Option<RepositoryOwner>,
    #[serde(default)]
    pub issues_url: Option<String>,
    #[serde(default)]
    pub pulls_url: Option<String>,
    #[serde(default)]
    pub license: Option<RepositoryLicense>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryLicense {
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A file fetched from a repository's raw content host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub url: String,
    pub content: String,
}

/// Which part of the dependency tree to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Prod,
    Dev,
}

impl Scope {
    /// `--prod` and `--dev` together cancel out to the whole tree.
    pub fn from_flags(prod: bool, dev: bool) -> Self {
        match (prod, dev) {
            (true, false) => Scope::Prod,
            (false, true) => Scope::Dev,
            _ => Scope::All,
        }
    }

    pub fn npm_flag(&self) -> &'static str {
        match self {
            Scope::All => "--all",
            Scope::Prod => "--prod",
            Scope::Dev => "--dev",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Prod => write!(f, "prod"),
            Scope::Dev => write!(f, "dev"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Simple,
    Advanced,
    Esm,
    License,
    GitHub,
    Owner,
    Duplicates,
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Simple,
        ReportKind::Advanced,
        ReportKind::Esm,
        ReportKind::License,
        ReportKind::GitHub,
        ReportKind::Owner,
        ReportKind::Duplicates,
    ];

    /// Every report except `simple` needs the enriched dependency list.
    pub fn needs_enrichment(&self) -> bool {
        !matches!(self, ReportKind::Simple)
    }
}

impl FromStr for ReportKind {
    type Err = DepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| DepsError::UnsupportedReport(s.to_string()))
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Simple => write!(f, "simple"),
            ReportKind::Advanced => write!(f, "advanced"),
            ReportKind::Esm => write!(f, "esm"),
            ReportKind::License => write!(f, "license"),
            ReportKind::GitHub => write!(f, "github"),
            ReportKind::Owner => write!(f, "owner"),
            ReportKind::Duplicates => write!(f, "duplicates"),
        }
    }
}
