//! Async access to remote repository hosts.
//!
//! A [`RepositoryHost`] answers two questions: "what does the host know about this
//! repository?" and "what is in this file?". Both return `Ok(None)` when the host
//! answers with anything other than `200 OK`, and `Err` only on transport failures.
//! Callers treat both as an absent value.

pub mod github;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Repository;

#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Fetch repository metadata from the host's API endpoint.
    async fn metadata(&self, api_url: &str) -> Result<Option<Repository>>;

    /// Fetch the body of a raw file.
    async fn fetch_file(&self, url: &str) -> Result<Option<String>>;
}
