use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};

use super::RepositoryHost;
use crate::models::{Package, RemoteFile, Repository};

const USER_AGENT: &str = concat!("depsman/", env!("CARGO_PKG_VERSION"));

/// Branches probed for raw files, in order.
pub const BRANCHES: [&str; 2] = ["master", "main"];

pub const README_CANDIDATES: [&str; 9] = [
    "README.md",
    "readme.md",
    "Readme.md",
    "README.txt",
    "readme.txt",
    "Readme.txt",
    "README",
    "readme",
    "Readme",
];

pub const LICENSE_CANDIDATES: [&str; 9] = [
    "LICENSE",
    "license",
    "License",
    "LICENSE.md",
    "license.md",
    "License.md",
    "LICENSE.txt",
    "license.txt",
    "License.txt",
];

/// `github.com/<owner>/<repo>.git` inside a resolved tarball or git URL.
static REGISTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([\w-]+)/([\w.-]+)\.git").unwrap());

/// Any spelling of a GitHub repository location once shorthands are expanded:
/// `https://github.com/o/r`, `git@github.com:o/r.git`, `git://www.github.com/o/r#x`.
static MANIFEST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[/@.])github\.com[:/]([\w-]+)/([\w.-]+?)(?:\.git)?(?:[/#?]|$)").unwrap()
});

static SHORTHAND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+/[\w.-]+$").unwrap());

static OWNER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([\w-]+)/([\w.-]+)").unwrap());

/// GitHub client for the REST API and `raw.githubusercontent.com`.
pub struct GitHub {
    client: Client,
    token: Option<String>,
}

impl GitHub {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, token })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RepositoryHost for GitHub {
    async fn metadata(&self, api_url: &str) -> Result<Option<Repository>> {
        let response = self
            .get(api_url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            debug!(url = api_url, status = %response.status(), "no repository metadata");
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }

    async fn fetch_file(&self, url: &str) -> Result<Option<String>> {
        let response = self.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}

/// Locate the GitHub repository of a dependency.
///
/// A GitHub URL embedded in the resolved location wins; otherwise the manifest's
/// `repository` field is used. Anything not hosted on GitHub yields `None`.
pub fn repository_url(registry: Option<&str>, pkg: &Package) -> Option<String> {
    if let Some(caps) = registry.and_then(|r| REGISTRY_REGEX.captures(r)) {
        return Some(format!("https://github.com/{}/{}", &caps[1], &caps[2]));
    }

    pkg.repository
        .as_ref()
        .and_then(|field| field.url())
        .and_then(normalize_repository)
}

/// Normalize a manifest `repository` value to `https://github.com/<owner>/<repo>`.
///
/// Accepts full URLs with `git+`, `git://`, `ssh://git@` or scp-style prefixes as
/// well as the `github:owner/repo` and bare `owner/repo` shorthands.
pub fn normalize_repository(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    let url = url.strip_prefix("git+").unwrap_or(url);

    let expanded = if let Some(rest) = url.strip_prefix("github:") {
        format!("github.com/{}", rest)
    } else if SHORTHAND_REGEX.is_match(url) {
        format!("github.com/{}", url)
    } else {
        url.to_string()
    };

    MANIFEST_REGEX
        .captures(&expanded)
        .map(|caps| format!("https://github.com/{}/{}", &caps[1], &caps[2]))
}

pub fn owner_and_repo(repository_url: &str) -> Option<(String, String)> {
    OWNER_REGEX
        .captures(repository_url)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

pub fn metadata_url(repository_url: &str) -> String {
    repository_url.replacen("github.com", "api.github.com/repos", 1)
}

pub fn content_url(repository_url: &str) -> String {
    repository_url.replacen("github.com", "raw.githubusercontent.com", 1)
}

/// Probe `candidates` on each of [`BRANCHES`] and return the first file served.
///
/// A transport error ends the probe early; the file is then reported as absent.
pub async fn fetch_first(
    host: &dyn RepositoryHost,
    repository_url: &str,
    candidates: &[&str],
) -> Option<RemoteFile> {
    let base = content_url(repository_url);

    for branch in BRANCHES {
        for file_name in candidates {
            let url = format!("{}/{}/{}", base, branch, file_name);
            match host.fetch_file(&url).await {
                Ok(Some(content)) => return Some(RemoteFile { url, content }),
                Ok(None) => continue,
                Err(e) => {
                    warn!(url = %url, error = %e, "giving up on repository file");
                    return None;
                }
            }
        }
    }

    None
}
