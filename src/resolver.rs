use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::analyzer::PackageManager;
use crate::cache::Cache;
use crate::error::DepsError;
use crate::license::spdx::derive_spdx;
use crate::models::{DependencyAdvanced, DependencySimple, Package, RemoteFile, Repository};
use crate::registry::github::{
    fetch_first, metadata_url, owner_and_repo, repository_url, LICENSE_CANDIDATES,
    README_CANDIDATES,
};
use crate::registry::RepositoryHost;

/// Enriches one canonical dependency with manifest and repository metadata.
pub struct Resolver {
    manager: Arc<dyn PackageManager>,
    host: Arc<dyn RepositoryHost>,
    cache: Cache,
}

impl Resolver {
    pub fn new(manager: Arc<dyn PackageManager>, host: Arc<dyn RepositoryHost>, cache: Cache) -> Self {
        Self {
            manager,
            host,
            cache,
        }
    }

    /// Build the enriched record for `simple`.
    ///
    /// Fails only when no manifest can be found for the dependency. Every
    /// network-derived field is optional and simply left empty on failure.
    pub async fn resolve(
        &self,
        simple: &DependencySimple,
        packages: &[Package],
        index: &HashMap<String, Package>,
    ) -> Result<DependencyAdvanced> {
        let pkg = self.locate_package(simple, packages, index).await?;

        let repository_url = repository_url(simple.registry.as_deref(), &pkg);
        let (owner, repo) = repository_url.as_deref().and_then(owner_and_repo).unzip();

        let (readme, license, repository) = match repository_url.as_deref() {
            Some(url) => {
                tokio::join!(
                    self.readme(&simple.id, url),
                    self.license(&simple.id, url),
                    self.metadata(&simple.id, url),
                )
            }
            None => (None, None, None),
        };

        let spdx = derive_spdx(
            &pkg,
            repository.as_ref(),
            license.as_ref().map(|file| file.content.as_str()),
        );
        let (repository_readme_url, repository_readme) =
            readme.map(|file| (file.url, file.content)).unzip();
        let (repository_license_url, repository_license) =
            license.map(|file| (file.url, file.content)).unzip();

        Ok(DependencyAdvanced {
            simple: simple.clone(),
            esm: is_esm(&pkg),
            spdx,
            owner,
            repo,
            package: pkg,
            repository,
            repository_url,
            repository_readme_url,
            repository_readme,
            repository_license_url,
            repository_license,
        })
    }

    /// Manifest lookup: exact id, then a manifest whose name appears in the resolved
    /// location, then a direct query to the package manager.
    async fn locate_package(
        &self,
        simple: &DependencySimple,
        packages: &[Package],
        index: &HashMap<String, Package>,
    ) -> Result<Package> {
        if let Some(pkg) = index.get(&simple.id) {
            return Ok(pkg.clone());
        }

        if let Some(pkg) = match_registry(simple.registry.as_deref(), packages) {
            debug!(id = %simple.id, manifest = %pkg.name, "matched manifest by location");
            return Ok(pkg.clone());
        }

        let missing = || DepsError::MissingPackage {
            id: simple.id.clone(),
        };

        match self.manager.query(&simple.name, &simple.version).await {
            Ok(Some(pkg)) => Ok(pkg),
            Ok(None) => Err(missing().into()),
            Err(e) => Err(e.context(missing())),
        }
    }

    async fn readme(&self, id: &str, url: &str) -> Option<RemoteFile> {
        self.cache
            .cached(&format!("readme_{}", id), || {
                fetch_first(self.host.as_ref(), url, &README_CANDIDATES)
            })
            .await
    }

    async fn license(&self, id: &str, url: &str) -> Option<RemoteFile> {
        self.cache
            .cached(&format!("license_{}", id), || {
                fetch_first(self.host.as_ref(), url, &LICENSE_CANDIDATES)
            })
            .await
    }

    async fn metadata(&self, id: &str, url: &str) -> Option<Repository> {
        self.cache
            .cached(&format!("metadata_{}", id), || async {
                match self.host.metadata(&metadata_url(url)).await {
                    Ok(repository) => repository,
                    Err(e) => {
                        warn!(url, error = %e, "failed to fetch repository metadata");
                        None
                    }
                }
            })
            .await
    }
}

/// Among installed manifests, the one whose name appears as `/<name>.` in the
/// resolved location. The shortest name wins when several do.
fn match_registry<'a>(registry: Option<&str>, packages: &'a [Package]) -> Option<&'a Package> {
    let registry = registry?;
    packages
        .iter()
        .filter(|pkg| registry.contains(&format!("/{}.", pkg.name)))
        .min_by_key(|pkg| pkg.name.len())
}

pub fn is_esm(pkg: &Package) -> bool {
    pkg.module_type.as_ref().and_then(Value::as_str) == Some("module")
}
