use std::collections::HashMap;

use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::collate::locale_cmp;
use crate::models::{DependencyAdvanced, DependencySimple, Package};
use crate::resolver::Resolver;
use crate::tree::dependency_id;

/// Index installed manifests by dependency id. The first manifest seen for an id wins.
pub fn index_packages(packages: &[Package]) -> HashMap<String, Package> {
    let mut index = HashMap::with_capacity(packages.len());
    for pkg in packages {
        index
            .entry(dependency_id(&pkg.name, &pkg.version))
            .or_insert_with(|| pkg.clone());
    }
    index
}

/// Resolve every dependency concurrently and return them sorted by name.
///
/// At most `concurrency` resolutions are in flight at once (`0` means no bound).
/// Results keep input order before sorting, so equal names stay in a stable
/// order regardless of which lookups finish first. Any failed resolution fails
/// the whole call.
pub async fn enrich_all(
    resolver: &Resolver,
    simples: &[DependencySimple],
    packages: &[Package],
    concurrency: usize,
    show_progress: bool,
) -> Result<Vec<DependencyAdvanced>> {
    let index = index_packages(packages);
    let limit = match concurrency {
        0 => simples.len().max(1),
        n => n,
    };
    debug!(dependencies = simples.len(), limit, "enriching dependencies");

    let pb = if show_progress {
        let pb = ProgressBar::new(simples.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let index = &index;
    let pb_ref = pb.as_ref();
    let mut advanceds: Vec<DependencyAdvanced> = stream::iter(simples)
        .map(|simple| async move {
            let result = resolver.resolve(simple, packages, index).await;
            if let Some(pb) = pb_ref {
                pb.inc(1);
            }
            result
        })
        .buffered(limit)
        .try_collect()
        .await?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    advanceds.sort_by(|a, b| locale_cmp(a.name(), b.name()));
    Ok(advanceds)
}
