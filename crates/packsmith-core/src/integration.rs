//! Post-generate integration steps
//!
//! Integrations run after the template is written and are skipped entirely
//! in generate-only mode. They are how a product hooks external concerns
//! (toolchain checks, follow-up instructions) onto a scaffold run.

use crate::error::Result;
use crate::runtime::{check_runtime, RuntimeInfo};
use crate::templates::TemplateContents;
use crate::workdir::with_working_dir;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Integration: Send + Sync {
    /// Called once with the populated project directory.
    async fn after_generate(&self, project_dir: &Path, template: &TemplateContents) -> Result<()>;
}

/// Does nothing
pub struct NoIntegration;

#[async_trait]
impl Integration for NoIntegration {
    async fn after_generate(
        &self,
        _project_dir: &Path,
        _template: &TemplateContents,
    ) -> Result<()> {
        Ok(())
    }
}

/// Checks that the runtime declared in the manifest is installed.
///
/// The check runs from inside the project directory so per-directory version
/// managers (nvm, pyenv) resolve the project's toolchain. Advisory only: a
/// missing runtime is logged, never an error.
pub struct RuntimeCheck;

impl RuntimeCheck {
    /// `None` when the manifest declares no runtime we know how to check
    pub fn detect(template: &TemplateContents) -> Option<RuntimeInfo> {
        template.manifest.runtime().map(check_runtime)
    }
}

#[async_trait]
impl Integration for RuntimeCheck {
    async fn after_generate(&self, project_dir: &Path, template: &TemplateContents) -> Result<()> {
        let Some(runtime) = template.manifest.runtime() else {
            if let Some(spec) = &template.manifest.runtime {
                tracing::warn!(runtime = spec.name(), "unknown runtime, skipping check");
            }
            return Ok(());
        };

        let info = match with_working_dir(project_dir, || check_runtime(runtime)) {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(error = %e, "checking runtime from the current directory");
                check_runtime(runtime)
            }
        };
        if info.available {
            tracing::info!(
                runtime = info.name,
                version = info.version.as_deref().unwrap_or("unknown"),
                "runtime available"
            );
        } else {
            tracing::warn!(
                runtime = info.name,
                hint = runtime.install_hint(),
                "runtime not installed"
            );
        }
        Ok(())
    }
}
