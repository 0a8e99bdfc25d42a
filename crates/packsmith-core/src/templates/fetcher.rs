//! Template fetching from local directories, remote URLs, or the registry
//!
//! Remote and registry templates are zip archives (or git repositories for
//! VCS URLs); local templates are read from disk. Every path ends in the
//! same validated [`TemplateContents`].

use super::archive::{self, FileTree};
use super::cache::{is_cacheable_name, TemplateCache};
use super::manifest::{PackManifest, RegistryCatalog, CATALOG_FILE, MANIFEST_FILE};
use super::source::{is_git_url, SourceKind, TemplateSource};
use super::transport::{NetTransport, Transport};
use crate::config::Settings;
use crate::error::{Result, ScaffoldError};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use url::Url;

/// A fetched template: its validated manifest plus every file
#[derive(Debug, Clone)]
pub struct TemplateContents {
    /// Template display name
    pub name: String,
    pub description: Option<String>,
    pub manifest: PackManifest,
    pub files: FileTree,
}

impl TemplateContents {
    /// Validate a file tree: the manifest must exist and parse, and a declared
    /// entry file must be present. The error is a human-readable reason.
    pub(crate) fn from_files(
        fallback_name: &str,
        files: FileTree,
    ) -> std::result::Result<Self, String> {
        let raw = files
            .get(MANIFEST_FILE)
            .ok_or_else(|| format!("missing {}", MANIFEST_FILE))?;
        let text = std::str::from_utf8(raw)
            .map_err(|_| format!("{} is not valid UTF-8", MANIFEST_FILE))?;
        let manifest = PackManifest::parse(text)
            .map_err(|e| format!("failed to parse {}: {}", MANIFEST_FILE, e))?;

        if let Some(entry) = manifest.entry() {
            let entry = entry.trim_start_matches("./");
            if !files.contains_key(entry) {
                return Err(format!("declared entry file '{}' is missing", entry));
            }
        }

        Ok(Self {
            name: manifest.template_name(fallback_name).to_string(),
            description: manifest.template_description().map(str::to_string),
            manifest,
            files,
        })
    }
}

/// Template fetcher - handles retrieving templates from every source kind
pub struct TemplateFetcher {
    transport: Arc<dyn Transport>,
    registry_url: Url,
    cache: Option<TemplateCache>,
}

impl TemplateFetcher {
    pub fn new(transport: Arc<dyn Transport>, registry_url: Url) -> Self {
        Self {
            transport,
            registry_url,
            cache: None,
        }
    }

    /// Production fetcher: network transport plus the local template cache
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(NetTransport::new(&settings.user_agent)),
            settings.registry_url.clone(),
        )
        .with_cache(TemplateCache::new(&settings.template_dir))
    }

    /// Store registry templates in `cache` after a successful fetch
    pub fn with_cache(mut self, cache: TemplateCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn registry_url(&self) -> &Url {
        &self.registry_url
    }

    /// Build a URL by appending a path segment, preserving query parameters
    fn build_url(base: &Url, path_segment: &str) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ScaffoldError::InvalidOptions {
                message: format!("URL cannot have path segments: {}", base),
            })?
            .pop_if_empty()
            .push(path_segment);
        Ok(url)
    }

    /// Fetch a template. Offline mode never reaches the transport: any
    /// non-local source fails before I/O.
    pub async fn fetch(&self, source: &TemplateSource, offline: bool) -> Result<TemplateContents> {
        if offline && source.kind() != SourceKind::Local {
            return Err(ScaffoldError::OfflineRestriction {
                identifier: source.to_string(),
            });
        }

        match source {
            TemplateSource::Local(path) => self.fetch_local(path).await,
            TemplateSource::Remote(url) => self.fetch_remote(url).await,
            TemplateSource::Registry(name) => self.fetch_registry(name).await,
        }
    }

    async fn fetch_local(&self, path: &Path) -> Result<TemplateContents> {
        let not_found = |reason: &str| ScaffoldError::LocalTemplateNotFound {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(not_found("path does not exist"))
            }
            Err(e) => return Err(ScaffoldError::io(path, e)),
        };
        if !metadata.is_dir() {
            return Err(not_found("not a directory"));
        }

        tracing::debug!(path = %path.display(), "reading local template");
        let files = archive::read_tree(path)?;
        let fallback = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("template");
        TemplateContents::from_files(fallback, files).map_err(|reason| not_found(&reason))
    }

    async fn fetch_remote(&self, url: &Url) -> Result<TemplateContents> {
        let fallback = url_template_name(url);

        let files = if is_git_url(url) {
            let scratch = tempfile::tempdir().map_err(|e| ScaffoldError::io("<tempdir>", e))?;
            let checkout = scratch.path().join("template");
            self.transport.clone_repo(url, &checkout).await?;
            archive::read_tree(&checkout)?
        } else {
            let bytes = self.transport.get(url).await?;
            archive::extract(&bytes, url.as_str())?
        };

        TemplateContents::from_files(&fallback, files).map_err(|reason| {
            ScaffoldError::InvalidTemplate {
                identifier: url.to_string(),
                reason,
            }
        })
    }

    /// Fetch the registry catalog listing available templates
    pub async fn fetch_catalog(&self) -> Result<RegistryCatalog> {
        let url = Self::build_url(&self.registry_url, CATALOG_FILE)?;
        let bytes = self.transport.get(&url).await?;
        let text = String::from_utf8_lossy(&bytes);
        serde_yaml::from_str(&text).map_err(|e| ScaffoldError::InvalidTemplate {
            identifier: url.to_string(),
            reason: format!("failed to parse registry catalog: {}", e),
        })
    }

    async fn fetch_registry(&self, name: &str) -> Result<TemplateContents> {
        let remote_not_found = || ScaffoldError::RemoteTemplateNotFound {
            identifier: name.to_string(),
        };

        // A registry without a catalog has no templates at all
        let catalog = match self.fetch_catalog().await {
            Err(ScaffoldError::RemoteTemplateNotFound { identifier }) => {
                tracing::debug!(template = name, catalog = %identifier, "registry catalog missing");
                return Err(remote_not_found());
            }
            other => other?,
        };
        if !catalog.contains(name) {
            tracing::debug!(
                template = name,
                available = ?catalog.templates,
                "not in registry catalog"
            );
            return Err(remote_not_found());
        }

        let zip_url = Self::build_url(&self.registry_url, &format!("{}.zip", name))?;
        tracing::info!(template = name, url = %zip_url, "fetching registry template");
        let bytes = match self.transport.get(&zip_url).await {
            Err(ScaffoldError::RemoteTemplateNotFound { .. }) => return Err(remote_not_found()),
            other => other?,
        };

        let files = archive::extract(&bytes, name)?;
        let contents = TemplateContents::from_files(name, files).map_err(|reason| {
            ScaffoldError::InvalidTemplate {
                identifier: name.to_string(),
                reason,
            }
        })?;

        if let Some(cache) = &self.cache {
            if is_cacheable_name(name) {
                if let Err(e) = cache.store(name, &contents.files).await {
                    tracing::warn!(template = name, error = %e, "failed to cache template");
                }
            }
        }

        Ok(contents)
    }
}

/// Last path segment of a URL without archive/VCS suffixes
fn url_template_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.trim_end_matches(".zip").trim_end_matches(".git").to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "template".to_string())
}
