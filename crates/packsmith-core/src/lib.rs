//! Packsmith Core - template resolution and scaffolding for policy packs
//!
//! Turns a template identifier (a local path, a remote URL, or a registry
//! name) into a populated project directory. The pieces are layered:
//!
//! - **Templates** - classification, fetching, archive handling, and
//!   materialization ([`templates`])
//! - **Workflow** - the ordered scaffold run with offline, generate-only,
//!   and cancellation handling ([`ScaffoldWorkflow`])
//! - **Product** - a binary's identity and defaults ([`ProductConfig`])
//!
//! # Example
//!
//! ```ignore
//! use packsmith_core::{ScaffoldOptions, ScaffoldWorkflow, Settings};
//!
//! let settings = Settings::from_config(&MyConfig, env!("CARGO_PKG_VERSION"))?;
//! let workflow = ScaffoldWorkflow::new(settings);
//! let report = workflow.run("aws-javascript", &ScaffoldOptions::default()).await?;
//! println!("created {}", report.destination.display());
//! ```

pub mod config;
pub mod error;
pub mod integration;
pub mod names;
pub mod product;
pub mod runtime;
pub mod templates;
pub mod workdir;
pub mod workflow;

pub use config::Settings;
pub use error::{ErrorKind, Result, ScaffoldError};
pub use integration::{Integration, NoIntegration, RuntimeCheck};
pub use names::NameGenerator;
pub use product::ProductConfig;
pub use runtime::{check_runtime, Runtime, RuntimeInfo};
pub use templates::{
    build_registry, BuiltArchive, NetTransport, PackManifest, SourceKind, TemplateContents,
    TemplateFetcher, TemplateSource, Transport,
};
pub use workdir::{with_working_dir, WorkingDirGuard};
pub use workflow::{
    IntegrationStatus, ScaffoldOptions, ScaffoldReport, ScaffoldWorkflow, WorkflowState,
};
