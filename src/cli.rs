use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::Overrides;
use crate::models::{ReportKind, Scope};

#[derive(Parser, Debug)]
#[command(
    name = "depsman",
    about = "Report on the installed dependency tree of an npm project",
    version
)]
pub struct Cli {
    /// Project path to inspect
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Report to produce: simple, advanced, esm, license, github, owner, duplicates
    #[arg(long, default_value = "simple", value_name = "REPORT")]
    pub report: ReportKind,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Ignore cached lookups (fresh results are still cached)
    #[arg(long)]
    pub fresh: bool,

    /// Only production dependencies
    #[arg(long)]
    pub prod: bool,

    /// Only development dependencies
    #[arg(long)]
    pub dev: bool,

    /// GitHub token for repository lookups
    #[arg(long, visible_alias = "github-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file [default: ./.depsman/config.toml, fallback ~/.config/depsman/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable coloured output (also disabled when NO_COLOR is set)
    #[arg(long)]
    pub no_color: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only, no progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            token: self.token.clone(),
            scope: Scope::from_flags(self.prod, self.dev),
            fresh: self.fresh,
            no_color: color_disabled(self.no_color, std::env::var_os("NO_COLOR")),
        }
    }
}

/// Any `NO_COLOR` value counts, including empty, `0` and `false`.
fn color_disabled(flag: bool, no_color_env: Option<OsString>) -> bool {
    flag || no_color_env.is_some()
}
