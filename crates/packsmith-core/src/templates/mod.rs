//! Template resolution, fetching, and materialization
//!
//! This module provides:
//! - Identifier classification (local path, remote URL, registry name)
//! - The `Transport` seam for network access
//! - Template fetching with offline enforcement and a local template cache
//! - Writing templates into a project directory with placeholder substitution
//! - Registry archive building

pub mod archive;
pub mod cache;
pub mod fetcher;
pub mod manifest;
pub mod materializer;
pub mod source;
pub mod transport;
pub mod version;

use crate::error::{Result, ScaffoldError};
use std::path::{Path, PathBuf};

pub use cache::TemplateCache;
pub use fetcher::{TemplateContents, TemplateFetcher};
pub use manifest::{PackManifest, RegistryCatalog, SharedFile, CATALOG_FILE, MANIFEST_FILE};
pub use materializer::materialize;
pub use source::{SourceKind, TemplateSource};
pub use transport::{NetTransport, Transport};
pub use version::check_compatibility;

/// Result of building one registry archive
#[derive(Debug)]
pub struct BuiltArchive {
    pub template: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Build `<name>.zip` for every template listed in `<dir>/template.yaml`,
/// so the directory can be served as a registry.
///
/// Templates whose directory is missing are skipped with a warning; any
/// other failure aborts the build.
pub fn build_registry(dir: &Path) -> Result<Vec<BuiltArchive>> {
    if !dir.is_dir() {
        return Err(ScaffoldError::InvalidOptions {
            message: format!("Template directory not found: {}", dir.display()),
        });
    }

    let catalog_path = dir.join(CATALOG_FILE);
    let catalog_content = std::fs::read_to_string(&catalog_path)
        .map_err(|e| ScaffoldError::io(&catalog_path, e))?;
    let catalog: RegistryCatalog =
        serde_yaml::from_str(&catalog_content).map_err(|e| ScaffoldError::InvalidTemplate {
            identifier: catalog_path.display().to_string(),
            reason: format!("failed to parse registry catalog: {}", e),
        })?;

    let mut built = Vec::new();
    for template_name in &catalog.templates {
        let template_path = dir.join(template_name);
        if !template_path.is_dir() {
            tracing::warn!(path = %template_path.display(), "template directory not found");
            continue;
        }

        let zip_bytes = archive::build_template_zip(dir, template_name, &catalog.shared_files)?;
        let zip_path = dir.join(format!("{}.zip", template_name));
        std::fs::write(&zip_path, &zip_bytes).map_err(|e| ScaffoldError::io(&zip_path, e))?;
        tracing::info!(template = %template_name, bytes = zip_bytes.len(), "built archive");

        built.push(BuiltArchive {
            template: template_name.clone(),
            path: zip_path,
            size: zip_bytes.len(),
        });
    }

    Ok(built)
}
