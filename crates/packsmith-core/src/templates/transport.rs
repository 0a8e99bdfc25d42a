//! Network access for remote and registry templates
//!
//! Every byte that crosses the network goes through [`Transport`], which keeps
//! the offline guarantee checkable: a transport that counts calls must see
//! none during an offline run.

use crate::error::{Result, ScaffoldError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use super::source::git_clone_url;

/// git diagnostics that mean "the repository is not there". Only matched on
/// `fatal:` and `remote:` lines.
const GIT_NOT_FOUND_MARKERS: &[&str] = &[
    "repository not found",
    "does not appear to be a git repository",
    "could not read username",
];

/// Opaque fetch service used by the template fetcher
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download the resource at `url`.
    ///
    /// A missing resource is `RemoteTemplateNotFound`; anything else that
    /// goes wrong on the wire is `Network`.
    async fn get(&self, url: &Url) -> Result<Vec<u8>>;

    /// Shallow-clone a git repository into `dest`, which must not exist yet.
    async fn clone_repo(&self, url: &Url, dest: &Path) -> Result<()>;
}

/// Production transport: reqwest for HTTP, the `git` executable for clones
pub struct NetTransport {
    client: reqwest::Client,
}

impl NetTransport {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

fn network_error(url: &Url, message: impl Into<String>) -> ScaffoldError {
    ScaffoldError::Network {
        url: url.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl Transport for NetTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| network_error(url, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ScaffoldError::RemoteTemplateNotFound {
                identifier: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(network_error(url, format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn clone_repo(&self, url: &Url, dest: &Path) -> Result<()> {
        let clone_url = git_clone_url(url);
        tracing::debug!(url = %clone_url, dest = %dest.display(), "git clone");

        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--quiet", &clone_url])
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| network_error(url, format!("failed to run git: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_git_failure(url, &stderr))
    }
}

/// Map `git clone` diagnostics onto not-found versus network failure.
fn classify_git_failure(url: &Url, stderr: &str) -> ScaffoldError {
    let missing = stderr
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| line.starts_with("fatal:") || line.starts_with("remote:"))
        .any(|line| GIT_NOT_FOUND_MARKERS.iter().any(|m| line.contains(m)));
    if missing {
        ScaffoldError::RemoteTemplateNotFound {
            identifier: url.to_string(),
        }
    } else {
        network_error(url, stderr.trim().to_string())
    }
}
