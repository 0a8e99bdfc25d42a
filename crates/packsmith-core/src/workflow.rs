//! Scaffold workflow orchestration
//!
//! A run moves through
//! `Start → Classified → Fetched → Materialized → [GenerateOnlySkip] → Done`.
//! Any failure ends the run in `Errored` with the original error kind
//! untouched. Generate-only still writes files; it only skips the
//! post-generate [`Integration`].

use crate::config::Settings;
use crate::error::{Result, ScaffoldError};
use crate::integration::{Integration, NoIntegration};
use crate::names::NameGenerator;
use crate::runtime::Runtime;
use crate::templates::materializer::{self, create_private_dir};
use crate::templates::{check_compatibility, TemplateFetcher, TemplateSource};
use crate::workdir;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Longest accepted project name
const MAX_PROJECT_NAME_LEN: usize = 100;

/// Per-run configuration, consumed by name at each decision point
#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    /// Resolve local sources only; never touch the network
    pub offline: bool,
    /// Write files but skip post-generate integration
    pub generate_only: bool,
    /// Target directory; a fresh one under the temp root when absent
    pub destination: Option<PathBuf>,
    /// Absolute directory that relative paths resolve against; a snapshot
    /// of the working directory when absent
    pub base_dir: Option<PathBuf>,
    /// Project name for `${PROJECT}`; defaults to the destination's name
    pub name: Option<String>,
    /// Project description for `${DESCRIPTION}`
    pub description: Option<String>,
    /// Explicit values for declared template variables
    pub variables: BTreeMap<String, String>,
    /// Upper bound on the whole run
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    Classified,
    Fetched,
    Materialized,
    GenerateOnlySkip,
    Done,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationStatus {
    Ran,
    Skipped,
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub destination: PathBuf,
    /// Source actually fetched (after the offline registry mapping)
    pub source: TemplateSource,
    pub template_name: String,
    pub template_description: Option<String>,
    /// Runtime declared by the manifest, when recognized
    pub runtime: Option<Runtime>,
    /// Relative paths written, in write order
    pub files: Vec<String>,
    pub integration: IntegrationStatus,
    /// Compatibility warning, when the template wants a newer tool
    pub version_warning: Option<String>,
    /// States visited, in order
    pub states: Vec<WorkflowState>,
}

pub struct ScaffoldWorkflow {
    settings: Settings,
    fetcher: TemplateFetcher,
    names: NameGenerator,
    integration: Arc<dyn Integration>,
}

impl ScaffoldWorkflow {
    /// Workflow with the network transport and the local template cache
    pub fn new(settings: Settings) -> Self {
        let fetcher = TemplateFetcher::from_settings(&settings);
        Self::with_fetcher(settings, fetcher)
    }

    pub fn with_fetcher(settings: Settings, fetcher: TemplateFetcher) -> Self {
        Self {
            settings,
            fetcher,
            names: NameGenerator::default(),
            integration: Arc::new(NoIntegration),
        }
    }

    pub fn with_integration(mut self, integration: Arc<dyn Integration>) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_name_generator(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run to completion (bounded only by `options.timeout`).
    pub async fn run(&self, identifier: &str, options: &ScaffoldOptions) -> Result<ScaffoldReport> {
        self.run_until(identifier, options, std::future::pending::<()>())
            .await
    }

    /// Run until done or until `cancel` resolves, whichever is first.
    ///
    /// Cancellation and an elapsed `timeout` both yield `Cancelled`. A
    /// cancelled run may leave the destination partially written.
    pub async fn run_until<F>(
        &self,
        identifier: &str,
        options: &ScaffoldOptions,
        cancel: F,
    ) -> Result<ScaffoldReport>
    where
        F: Future<Output = ()>,
    {
        let work = async {
            match options.timeout {
                Some(limit) => tokio::time::timeout(limit, self.execute(identifier, options))
                    .await
                    .unwrap_or(Err(ScaffoldError::Cancelled)),
                None => self.execute(identifier, options).await,
            }
        };

        let result = tokio::select! {
            result = work => result,
            _ = cancel => Err(ScaffoldError::Cancelled),
        };

        if let Err(e) = &result {
            tracing::debug!(state = ?WorkflowState::Errored, error = %e, "workflow failed");
        }
        result
    }

    async fn execute(&self, identifier: &str, options: &ScaffoldOptions) -> Result<ScaffoldReport> {
        let mut states = Vec::new();
        let mut enter = |state: WorkflowState| {
            tracing::debug!(?state, "workflow transition");
            states.push(state);
        };

        enter(WorkflowState::Start);
        validate(identifier, options)?;
        let base = match &options.base_dir {
            Some(dir) => dir.clone(),
            None => workdir::current_dir()?,
        };
        let destination = self.prepare_destination(options, &base).await?;

        let mut source = TemplateSource::classify_in(identifier, &base);
        if options.offline {
            source = source.offline_fallback(&workdir::resolve(&base, &self.settings.template_dir));
        }
        tracing::info!(
            template = identifier,
            source = %source,
            kind = ?source.kind(),
            "resolved template source"
        );
        enter(WorkflowState::Classified);

        let contents = self.fetcher.fetch(&source, options.offline).await?;
        enter(WorkflowState::Fetched);

        let version_warning = contents.manifest.min_cli_version().and_then(|min| {
            check_compatibility(&self.settings.cli_version, min, &self.settings.upgrade_command)
        });
        if let Some(warning) = &version_warning {
            tracing::warn!("{}", warning);
        }

        let project_name = match &options.name {
            Some(name) => name.clone(),
            None => dir_name(&destination),
        };
        let values = materializer::resolve_variables(
            &contents.manifest.variables(),
            &project_name,
            options.description.as_deref(),
            &options.variables,
        );
        let files = materializer::materialize(&destination, &contents, &values).await?;
        enter(WorkflowState::Materialized);

        let integration = if options.generate_only {
            enter(WorkflowState::GenerateOnlySkip);
            IntegrationStatus::Skipped
        } else {
            self.integration
                .after_generate(&destination, &contents)
                .await?;
            IntegrationStatus::Ran
        };
        enter(WorkflowState::Done);

        tracing::info!(
            dest = %destination.display(),
            files = files.len(),
            template = %contents.name,
            "project created"
        );

        Ok(ScaffoldReport {
            destination,
            source,
            runtime: contents.manifest.runtime(),
            template_name: contents.name,
            template_description: contents.description,
            files,
            integration,
            version_warning,
            states,
        })
    }

    /// The caller's destination resolved against `base`, or a freshly
    /// created owner-only directory under the temp root.
    ///
    /// A generated directory is created before classification and is never
    /// removed by the workflow, whatever the outcome.
    async fn prepare_destination(&self, options: &ScaffoldOptions, base: &Path) -> Result<PathBuf> {
        if let Some(dest) = &options.destination {
            return Ok(workdir::resolve(base, dest));
        }

        let root = workdir::resolve(base, &self.settings.temp_root);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| ScaffoldError::io(&root, e))?;

        let dest = root.join(self.names.generate()?);
        match create_private_dir(&dest).await {
            Ok(()) => {
                tracing::debug!(dest = %dest.display(), "created workspace");
                Ok(dest)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ScaffoldError::DestinationExists { path: dest })
            }
            Err(e) => Err(ScaffoldError::io(&dest, e)),
        }
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string()
}

fn validate(identifier: &str, options: &ScaffoldOptions) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(ScaffoldError::InvalidOptions {
            message: "a template name, path, or URL is required".to_string(),
        });
    }
    if let Some(name) = &options.name {
        validate_project_name(name)?;
    }
    if let Some(dir) = options.base_dir.as_ref().filter(|d| !d.is_absolute()) {
        return Err(ScaffoldError::InvalidOptions {
            message: format!("base directory must be absolute: {}", dir.display()),
        });
    }
    Ok(())
}

/// Non-empty, at most 100 chars of ASCII alphanumerics, `-`, `_`, `.`
pub fn validate_project_name(name: &str) -> Result<()> {
    let invalid = |why: &str| ScaffoldError::InvalidOptions {
        message: format!("invalid project name '{}': {}", name, why),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_PROJECT_NAME_LEN {
        return Err(invalid("must be 100 characters or fewer"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid(
            "may only contain alphanumerics, hyphens, underscores, and periods",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_rules() {
        assert!(validate_project_name("aws-policies").is_ok());
        assert!(validate_project_name("pack_v1.2").is_ok());
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("has space").is_err());
        assert!(validate_project_name("slash/name").is_err());
        assert!(validate_project_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_blank_identifier_rejected() {
        let err = validate("  ", &ScaffoldOptions::default()).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidOptions { .. }));
    }

    #[test]
    fn test_relative_base_dir_rejected() {
        let options = ScaffoldOptions {
            base_dir: Some(PathBuf::from("relative")),
            ..Default::default()
        };
        let err = validate("aws-javascript", &options).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidOptions { .. }));
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(
            dir_name(Path::new("/tmp/test-0123456789abcdef")),
            "test-0123456789abcdef"
        );
        assert_eq!(dir_name(Path::new("/")), "project");
    }
}
