//! Version comparison for tool and template compatibility

use semver::Version;

/// Compare the running tool's version against a template's `min_cli_version`.
/// Returns a warning message if the tool is older than the template expects.
pub fn check_compatibility(
    cli_version: &str,
    min_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    // Unparseable versions can't be compared; skip the warning
    let cli_ver = parse_version(cli_version)?;
    let min_ver = parse_version(min_version)?;

    if cli_ver < min_ver {
        let mut warning = format!(
            "This template was designed for version {} or newer; you are running {}.",
            min_ver, cli_ver
        );
        if !upgrade_command.is_empty() {
            warning.push_str(&format!(" Consider updating: {}", upgrade_command));
        }
        Some(warning)
    } else {
        None
    }
}

/// Parse a version string, tolerating a leading `v`
fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).ok()
}
