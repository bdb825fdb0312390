//! `depsman`: inspect the installed dependency tree of an npm project.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and load the config file ([`config::load_config`]).
//! 2. Read the dependency tree from `npm ls` ([`analyzer`]).
//! 3. Collapse it into one entry per package version ([`tree::flatten`]).
//! 4. For every report but `simple`, resolve manifests and GitHub metadata
//!    concurrently ([`enrich`], [`resolver`], [`registry`]), cached on disk ([`cache`]).
//! 5. Shape the requested report ([`report`]) and print it as tables or JSON.
//! 6. Exit `0`, or `1` with a single message when any step fails.

mod analyzer;
mod cache;
mod cli;
mod collate;
mod config;
mod enrich;
mod error;
mod license;
mod models;
mod pipeline;
mod registry;
mod report;
mod resolver;
mod tree;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use analyzer::npm::Npm;
use cli::Cli;
use config::{load_config, Config};
use pipeline::Pipeline;
use registry::github::GitHub;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("depsman=debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    // Resolve project path
    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());

    let file_config = load_config(&path, cli.config.as_deref())?;
    let config = Config::resolve(&path, file_config, cli.overrides());
    debug!(
        scope = %config.scope,
        cache = %config.cache_dir.display(),
        authenticated = config.token.is_some(),
        "resolved configuration"
    );

    if !config.color {
        colored::control::set_override(false);
    }

    let manager = Arc::new(Npm::new(&config.project_dir));
    let host = Arc::new(GitHub::new(config.token.clone(), config.timeout)?);
    let show_progress = !cli.quiet && !cli.json;
    let pipeline = Pipeline::new(&config, manager, host, show_progress);

    let report = pipeline.generate(cli.report).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::terminal::render(&report, &path, cli.quiet, config.color)?;
    }

    Ok(())
}
