//! Product configuration trait for CLI binaries
//!
//! A binary implements this trait to supply its identity and the defaults the
//! scaffolding engine resolves against (registry location, cache directory,
//! environment variable names).

use crate::runtime::Runtime;
use std::path::Path;

/// Configuration trait for a scaffolding product
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for the cache directory and user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Default base URL of the template registry
    fn default_registry_url(&self) -> &'static str;

    /// Environment variable name for overriding the registry URL
    fn registry_url_env(&self) -> &'static str;

    /// Environment variable name for overriding the local template cache
    fn template_dir_env(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// Instructions printed after a project is created
    fn next_steps(&self, dir: &Path, runtime: Option<Runtime>) -> Vec<String>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
