use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::DepsError;
use crate::models::{DependencyRoot, Package, Scope};

/// Talks to `npm` inside a project directory.
pub struct Npm {
    project_dir: PathBuf,
}

impl Npm {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }
}

#[async_trait]
impl super::PackageManager for Npm {
    async fn tree(&self, scope: Scope) -> Result<DependencyRoot> {
        debug!(%scope, "running npm ls");
        let output = Command::new("npm")
            .args(["ls", scope.npm_flag(), "--all", "--json"])
            .current_dir(&self.project_dir)
            .output()
            .await
            .context("Failed to run `npm ls`")?;

        // `npm ls` exits non-zero on peer or extraneous problems but still prints the tree.
        parse_tree(&output.stdout, &output.stderr)
    }

    async fn packages(&self) -> Result<Vec<Package>> {
        let node_modules = self.project_dir.join("node_modules");
        let packages = tokio::task::spawn_blocking(move || collect_packages(&node_modules))
            .await
            .context("Manifest scan panicked")?;
        debug!(count = packages.len(), "collected installed manifests");
        Ok(packages)
    }

    async fn query(&self, name: &str, version: &str) -> Result<Option<Package>> {
        let selector = format!("#{}@{}", name, version);
        debug!(%selector, "running npm query");
        let output = Command::new("npm")
            .args(["query", &selector])
            .current_dir(&self.project_dir)
            .output()
            .await
            .context("Failed to run `npm query`")?;

        Ok(parse_query(&output.stdout))
    }
}

fn parse_tree(stdout: &[u8], stderr: &[u8]) -> Result<DependencyRoot> {
    serde_json::from_slice(stdout).map_err(|e| {
        let stderr = String::from_utf8_lossy(stderr);
        let message = match stderr.lines().find(|l| !l.trim().is_empty()) {
            Some(line) => line.trim().to_string(),
            None => e.to_string(),
        };
        DepsError::TreeCommand(message).into()
    })
}

fn parse_query(stdout: &[u8]) -> Option<Package> {
    let results: Vec<Value> = serde_json::from_slice(stdout).ok()?;
    results
        .into_iter()
        .next()
        .and_then(|first| serde_json::from_value(first).ok())
}

/// Read every `package.json` below `dir` that looks like a real manifest.
///
/// Unreadable files and documents without a string `name` and `version` are skipped.
pub fn collect_packages(dir: &Path) -> Vec<Package> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "package.json")
        .filter_map(|entry| read_package(entry.path()))
        .collect()
}

fn read_package(path: &Path) -> Option<Package> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
