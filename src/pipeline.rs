use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::analyzer::PackageManager;
use crate::cache::Cache;
use crate::config::Config;
use crate::enrich::enrich_all;
use crate::models::{ReportKind, Scope};
use crate::registry::RepositoryHost;
use crate::report::{self, Report};
use crate::resolver::Resolver;
use crate::tree::flatten;

/// Produces reports for one project.
///
/// Every call to [`Pipeline::generate`] reads the tree and the installed
/// manifests again; only the network lookups inside enrichment are cached.
pub struct Pipeline {
    manager: Arc<dyn PackageManager>,
    resolver: Resolver,
    scope: Scope,
    concurrency: usize,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        manager: Arc<dyn PackageManager>,
        host: Arc<dyn RepositoryHost>,
        show_progress: bool,
    ) -> Self {
        let cache = Cache::new(&config.cache_dir, config.fresh);
        Self {
            resolver: Resolver::new(manager.clone(), host, cache),
            manager,
            scope: config.scope,
            concurrency: config.concurrency,
            show_progress,
        }
    }

    pub async fn generate(&self, kind: ReportKind) -> Result<Report> {
        let root = self.manager.tree(self.scope).await?;
        let simples = flatten(&root);
        info!(
            project = root.name.as_deref().unwrap_or("-"),
            version = root.version.as_deref().unwrap_or("-"),
            report = %kind,
            scope = %self.scope,
            dependencies = simples.len(),
            "flattened dependency tree"
        );

        if !kind.needs_enrichment() {
            return Ok(Report::Simple(simples));
        }

        let packages = self.manager.packages().await?;
        debug!(manifests = packages.len(), "collected manifests");

        let advanceds = enrich_all(
            &self.resolver,
            &simples,
            &packages,
            self.concurrency,
            self.show_progress,
        )
        .await?;

        Ok(report::build(kind, advanceds))
    }
}
