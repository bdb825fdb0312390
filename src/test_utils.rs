//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::analyzer::PackageManager;
use crate::models::{DependencyRoot, DependencySimple, Package, Repository, Scope};
use crate::registry::RepositoryHost;

pub fn manifest(json: &str) -> Package {
    serde_json::from_str(json).unwrap()
}

pub fn simple(name: &str, version: &str, registry: Option<&str>) -> DependencySimple {
    DependencySimple {
        id: format!("{}^{}", name, version),
        name: name.to_string(),
        registry: registry.map(str::to_string),
        version: version.to_string(),
        nodes_nr: 1,
    }
}

/// Serves canned metadata and files and counts every request.
#[derive(Default)]
pub struct StubHost {
    metadata: HashMap<String, Repository>,
    files: HashMap<String, String>,
    requests: AtomicUsize,
}

impl StubHost {
    pub fn with_metadata(mut self, api_url: &str, spdx_id: Option<&str>) -> Self {
        let repository = serde_json::from_value(serde_json::json!({
            "description": format!("{} description", api_url),
            "topics": ["cli"],
            "stargazers_count": 10,
            "html_url": api_url.replace("api.github.com/repos", "github.com"),
            "license": spdx_id.map(|id| serde_json::json!({ "spdx_id": id })),
        }))
        .unwrap();
        self.metadata.insert(api_url.to_string(), repository);
        self
    }

    pub fn with_file(mut self, url: &str, content: &str) -> Self {
        self.files.insert(url.to_string(), content.to_string());
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryHost for StubHost {
    async fn metadata(&self, api_url: &str) -> Result<Option<Repository>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.metadata.get(api_url).cloned())
    }

    async fn fetch_file(&self, url: &str) -> Result<Option<String>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.get(url).cloned())
    }
}

/// A package manager backed by fixtures instead of `npm`.
#[derive(Default)]
pub struct StubManager {
    tree: Option<String>,
    packages: Vec<Package>,
    queries: HashMap<String, Package>,
    tree_calls: Mutex<Vec<Scope>>,
}

impl StubManager {
    pub fn with_tree(mut self, json: &str) -> Self {
        self.tree = Some(json.to_string());
        self
    }

    pub fn with_packages(mut self, packages: Vec<Package>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_query(mut self, pkg: Package) -> Self {
        self.queries
            .insert(format!("{}^{}", pkg.name, pkg.version), pkg);
        self
    }

    pub fn tree_calls(&self) -> Vec<Scope> {
        self.tree_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageManager for StubManager {
    async fn tree(&self, scope: Scope) -> Result<DependencyRoot> {
        self.tree_calls.lock().unwrap().push(scope);
        match &self.tree {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(DependencyRoot::default()),
        }
    }

    async fn packages(&self) -> Result<Vec<Package>> {
        Ok(self.packages.clone())
    }

    async fn query(&self, name: &str, version: &str) -> Result<Option<Package>> {
        Ok(self.queries.get(&format!("{}^{}", name, version)).cloned())
    }
}
