//! Policy pack manifest and registry catalog types

use crate::runtime::Runtime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest file at the root of every template and every scaffolded project
pub const MANIFEST_FILE: &str = "PolicyPack.yaml";

/// Catalog file at the root of a registry
pub const CATALOG_FILE: &str = "template.yaml";

/// The `runtime` field: either a bare name or a name with options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuntimeSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        options: serde_yaml::Mapping,
    },
}

impl RuntimeSpec {
    pub fn name(&self) -> &str {
        match self {
            RuntimeSpec::Name(name) => name,
            RuntimeSpec::Detailed { name, .. } => name,
        }
    }
}

/// Template-only metadata inside the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSection {
    /// Display name of the template
    #[serde(default)]
    pub name: Option<String>,

    /// What the template provides
    #[serde(default)]
    pub description: Option<String>,

    /// Entry-point file; must exist in the template when declared
    #[serde(default)]
    pub entry: Option<String>,

    /// Oldest tool version the template supports
    #[serde(default)]
    pub min_cli_version: Option<String>,

    /// Declared `${NAME}` placeholders and their defaults
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// `PolicyPack.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackManifest {
    /// Project name (usually `${PROJECT}` in a template)
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateSection>,
}

impl PackManifest {
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Known runtime declared by the manifest, if any
    pub fn runtime(&self) -> Option<Runtime> {
        self.runtime.as_ref().and_then(|r| Runtime::parse(r.name()))
    }

    pub fn entry(&self) -> Option<&str> {
        self.template.as_ref().and_then(|t| t.entry.as_deref())
    }

    pub fn min_cli_version(&self) -> Option<&str> {
        self.template
            .as_ref()
            .and_then(|t| t.min_cli_version.as_deref())
    }

    /// Declared placeholders; empty means "copy verbatim"
    pub fn variables(&self) -> BTreeMap<String, String> {
        self.template
            .as_ref()
            .map(|t| t.variables.clone())
            .unwrap_or_default()
    }

    /// Template display name, falling back to the given identifier
    pub fn template_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.template
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or(fallback)
    }

    /// Template description, falling back to the project description
    pub fn template_description(&self) -> Option<&str> {
        self.template
            .as_ref()
            .and_then(|t| t.description.as_deref())
            .or(self.description.as_deref())
    }
}

/// A shared file from the registry root that gets bundled into every template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedFile {
    /// Source path relative to the registry directory
    pub source: String,

    /// Destination path in each template (defaults to source if not specified)
    #[serde(default)]
    pub dest: Option<String>,
}

impl SharedFile {
    /// Get the destination path (falls back to source if dest not specified)
    pub fn destination(&self) -> &str {
        self.dest.as_deref().unwrap_or(&self.source)
    }
}

/// Registry catalog (`<registry>/template.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryCatalog {
    /// Template names served by the registry
    pub templates: Vec<String>,

    /// Files bundled into every template archive at build time
    #[serde(default)]
    pub shared_files: Vec<SharedFile>,
}

impl RegistryCatalog {
    pub fn contains(&self, name: &str) -> bool {
        self.templates.iter().any(|t| t == name)
    }
}
