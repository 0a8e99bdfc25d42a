//! Local template cache
//!
//! Registry templates fetched online are kept under `<root>/<name>` so that a
//! later offline run can resolve the same name from disk.

use super::archive::FileTree;
use crate::error::{Result, ScaffoldError};
use crate::names::NameGenerator;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct TemplateCache {
    root: PathBuf,
}

impl TemplateCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `name` lives (or would live) in the cache
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Replace the cached copy of `name` with `files`.
    ///
    /// Files are written to a staging directory first and swapped in with a
    /// rename, so readers never see a half-written template. The previous copy
    /// is moved aside before the swap and put back if the swap fails.
    pub async fn store(&self, name: &str, files: &FileTree) -> Result<PathBuf> {
        if !is_cacheable_name(name) {
            return Err(ScaffoldError::InvalidOptions {
                message: format!("'{}' cannot be used as a cache entry name", name),
            });
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ScaffoldError::io(&self.root, e))?;

        let staging_name = NameGenerator::new(format!(".{}-staging-", name)).generate()?;
        let staging = self.root.join(staging_name);

        if let Err(e) = write_files(&staging, files).await {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        let target = self.path_for(name);
        let previous = match self.move_aside(name, &target).await {
            Ok(previous) => previous,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_dir_all(&staging).await;
            if let Some(previous) = &previous {
                if let Err(restore) = fs::rename(previous, &target).await {
                    tracing::warn!(
                        template = name,
                        path = %previous.display(),
                        error = %restore,
                        "failed to restore previous cache entry"
                    );
                }
            }
            return Err(ScaffoldError::io(&target, e));
        }

        if let Some(previous) = previous {
            if let Err(e) = fs::remove_dir_all(&previous).await {
                tracing::warn!(
                    path = %previous.display(),
                    error = %e,
                    "stale cache entry left behind"
                );
            }
        }

        tracing::debug!(template = name, path = %target.display(), "cached template");
        Ok(target)
    }

    /// Rename an existing entry out of the way; `None` when there is none.
    async fn move_aside(&self, name: &str, target: &Path) -> Result<Option<PathBuf>> {
        if !fs::try_exists(target).await.unwrap_or(false) {
            return Ok(None);
        }
        let aside = self
            .root
            .join(NameGenerator::new(format!(".{}-old-", name)).generate()?);
        fs::rename(target, &aside)
            .await
            .map_err(|e| ScaffoldError::io(target, e))?;
        Ok(Some(aside))
    }
}

async fn write_files(dir: &Path, files: &FileTree) -> Result<()> {
    for (relative, contents) in files {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScaffoldError::io(parent, e))?;
        }
        fs::write(&path, contents)
            .await
            .map_err(|e| ScaffoldError::io(&path, e))?;
    }
    Ok(())
}

/// A single plain path segment: no separators, no `.`/`..`
pub fn is_cacheable_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}
