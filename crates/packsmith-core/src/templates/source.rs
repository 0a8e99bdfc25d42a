//! Template identifier classification
//!
//! `classify` decides, without touching the network or writing anything,
//! where a template identifier points. Rules apply in order:
//!
//! 1. an existing filesystem path is [`TemplateSource::Local`]
//! 2. a URL with a recognized scheme (or an scp-like git address) is
//!    [`TemplateSource::Remote`]
//! 3. anything else is a [`TemplateSource::Registry`] name

use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::workdir;

/// URL schemes accepted for remote templates
const REMOTE_SCHEMES: &[&str] = &["http", "https", "git", "ssh", "git+ssh", "git+https"];

/// Schemes that are always fetched with git
const GIT_SCHEMES: &[&str] = &["git", "ssh", "git+ssh", "git+https"];

/// Which of the three sources an identifier resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Local,
    Remote,
    Registry,
}

/// Template source - a local directory, a remote URL, or a registry name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Local(PathBuf),
    Remote(Url),
    Registry(String),
}

impl TemplateSource {
    /// Classify an identifier, resolving relative paths against a snapshot
    /// of the working directory.
    pub fn classify(identifier: &str) -> Self {
        let base = workdir::current_dir().unwrap_or_default();
        Self::classify_in(identifier, &base)
    }

    /// Classify an identifier, resolving relative paths against `base`.
    ///
    /// Filesystem checks are read-only. A local match is returned as an
    /// absolute path; with a relative `base` the path rule is skipped.
    pub fn classify_in(identifier: &str, base: &Path) -> Self {
        let trimmed = identifier.trim();

        if !trimmed.is_empty() {
            let candidate = workdir::resolve(base, Path::new(trimmed));
            if candidate.is_absolute() && candidate.exists() {
                return Self::Local(candidate);
            }
        }

        if let Ok(url) = Url::parse(trimmed) {
            if REMOTE_SCHEMES.contains(&url.scheme()) {
                return Self::Remote(url);
            }
        }

        if let Some(url) = parse_scp_like(trimmed) {
            return Self::Remote(url);
        }

        Self::Registry(trimmed.to_string())
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Local(_) => SourceKind::Local,
            Self::Remote(_) => SourceKind::Remote,
            Self::Registry(_) => SourceKind::Registry,
        }
    }

    /// The local path for this source, with a registry name mapped into the
    /// local template cache. Remote URLs have no local counterpart.
    pub fn offline_fallback(self, template_dir: &Path) -> Self {
        match self {
            Self::Registry(name) => Self::Local(template_dir.join(name)),
            other => other,
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
            Self::Registry(name) => write!(f, "{}", name),
        }
    }
}

/// True when a remote URL should be cloned rather than downloaded
pub fn is_git_url(url: &Url) -> bool {
    GIT_SCHEMES.contains(&url.scheme()) || url.path().trim_end_matches('/').ends_with(".git")
}

/// The URL handed to `git clone` (`git+https://...` becomes `https://...`)
pub fn git_clone_url(url: &Url) -> String {
    let raw = url.as_str();
    raw.strip_prefix("git+").unwrap_or(raw).to_string()
}

/// `user@host:path` becomes `ssh://user@host/path`
fn parse_scp_like(identifier: &str) -> Option<Url> {
    if identifier.contains("://") {
        return None;
    }
    let (user_host, path) = identifier.split_once(':')?;
    let (user, host) = user_host.split_once('@')?;
    if user.is_empty() || host.is_empty() || path.is_empty() || host.contains('/') {
        return None;
    }
    Url::parse(&format!("ssh://{}@{}/{}", user, host, path.trim_start_matches('/'))).ok()
}
