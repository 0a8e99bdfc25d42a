//! Runtime detection for Node.js and Python

use std::fmt;
use std::process::Command;

/// Runtimes a policy pack manifest can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    NodeJs,
    Python,
}

impl Runtime {
    /// Parse the manifest `runtime` value (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nodejs" | "node" | "javascript" | "typescript" => Some(Runtime::NodeJs),
            "python" | "python3" => Some(Runtime::Python),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Runtime::NodeJs => "Node.js",
            Runtime::Python => "Python 3",
        }
    }

    fn binary(&self) -> &'static str {
        match self {
            Runtime::NodeJs => "node",
            Runtime::Python => "python3",
        }
    }

    /// Where to get the runtime when it is missing
    pub fn install_hint(&self) -> &'static str {
        match self {
            Runtime::NodeJs => "install from https://nodejs.org",
            Runtime::Python => "install from https://python.org",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// Run `<binary> --version`
fn detect(binary: &str, name: &'static str) -> RuntimeInfo {
    match Command::new(binary).arg("--version").output() {
        Ok(out) if out.status.success() => {
            // python3 < 3.4 prints its version on stderr
            let raw = if out.stdout.is_empty() {
                out.stderr
            } else {
                out.stdout
            };
            RuntimeInfo {
                name,
                version: Some(String::from_utf8_lossy(&raw).trim().to_string()),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name,
            version: None,
            available: false,
        },
    }
}

/// Check whether a runtime is installed
pub fn check_runtime(runtime: Runtime) -> RuntimeInfo {
    detect(runtime.binary(), runtime.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_runtime_names() {
        assert_eq!(Runtime::parse("nodejs"), Some(Runtime::NodeJs));
        assert_eq!(Runtime::parse("NodeJS"), Some(Runtime::NodeJs));
        assert_eq!(Runtime::parse("typescript"), Some(Runtime::NodeJs));
        assert_eq!(Runtime::parse("python"), Some(Runtime::Python));
        assert_eq!(Runtime::parse(" python3 "), Some(Runtime::Python));
        assert_eq!(Runtime::parse("dotnet"), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Runtime::NodeJs.to_string(), "Node.js");
        assert_eq!(Runtime::Python.to_string(), "Python 3");
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let info = detect("packsmith-definitely-not-installed", "Nothing");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert_eq!(info.name, "Nothing");
    }
}
