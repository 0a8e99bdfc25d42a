//! Error types for template resolution and scaffolding.
//!
//! Every failure is surfaced with its specific kind preserved. Callers use
//! [`ScaffoldError::kind`] (or the `is_*` helpers) to decide whether a retry
//! makes sense: only [`ErrorKind::Network`] is retryable.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for scaffolding operations.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// A local template path is missing or is not a valid template.
    #[error("Local template not found: {path}: {reason}")]
    LocalTemplateNotFound { path: PathBuf, reason: String },

    /// A remote or registry template was reachable but does not exist.
    #[error("Remote template not found: {identifier}")]
    RemoteTemplateNotFound { identifier: String },

    /// Offline mode forbids resolving a non-local source.
    #[error("Cannot fetch '{identifier}' in offline mode: only local templates are available")]
    OfflineRestriction { identifier: String },

    /// Connectivity or transport failure.
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The template was fetched but its contents are malformed.
    #[error("Invalid template '{identifier}': {reason}")]
    InvalidTemplate { identifier: String, reason: String },

    /// The destination exists and already has content.
    #[error("Destination already exists and is not empty: {path}")]
    DestinationExists { path: PathBuf },

    /// Disk failure. `written` lists the files completed before the failure.
    #[error("I/O error at {path} ({} file(s) written before failure): {source}", .written.len())]
    Io {
        path: PathBuf,
        written: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the run or its deadline elapsed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The OS entropy source could not produce random bytes.
    #[error("Random source unavailable: {0}")]
    RandomSource(String),

    /// Options rejected before any work started.
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },
}

/// Discriminant of [`ScaffoldError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LocalTemplateNotFound,
    RemoteTemplateNotFound,
    OfflineRestriction,
    Network,
    InvalidTemplate,
    DestinationExists,
    Io,
    Cancelled,
    RandomSource,
    InvalidOptions,
}

impl ScaffoldError {
    /// Shorthand for an I/O failure with no files written.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            written: Vec::new(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LocalTemplateNotFound { .. } => ErrorKind::LocalTemplateNotFound,
            Self::RemoteTemplateNotFound { .. } => ErrorKind::RemoteTemplateNotFound,
            Self::OfflineRestriction { .. } => ErrorKind::OfflineRestriction,
            Self::Network { .. } => ErrorKind::Network,
            Self::InvalidTemplate { .. } => ErrorKind::InvalidTemplate,
            Self::DestinationExists { .. } => ErrorKind::DestinationExists,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::RandomSource(_) => ErrorKind::RandomSource,
            Self::InvalidOptions { .. } => ErrorKind::InvalidOptions,
        }
    }

    /// True for both the local and the remote not-found kinds.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::LocalTemplateNotFound | ErrorKind::RemoteTemplateNotFound
        )
    }

    /// Only transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

/// Result type alias for scaffolding operations.
pub type Result<T> = std::result::Result<T, ScaffoldError>;
