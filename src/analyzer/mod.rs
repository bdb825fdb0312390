use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DependencyRoot, Package, Scope};

pub mod npm;

/// The host package manager: source of the installed tree and its manifests.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// The installed dependency tree for `scope`.
    async fn tree(&self, scope: Scope) -> Result<DependencyRoot>;

    /// Every manifest installed under the project's dependency directory.
    async fn packages(&self) -> Result<Vec<Package>>;

    /// The installed manifest for one exact `name@version`, if any.
    async fn query(&self, name: &str, version: &str) -> Result<Option<Package>>;
}
