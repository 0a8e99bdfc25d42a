//! Writing fetched templates into a project directory

use super::fetcher::TemplateContents;
use crate::error::{Result, ScaffoldError};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Well-known variable holding the project name
pub const PROJECT_VAR: &str = "PROJECT";

/// Well-known variable holding the project description
pub const DESCRIPTION_VAR: &str = "DESCRIPTION";

/// Create a single directory readable only by its owner.
pub(crate) async fn create_private_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(false);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path).await
}

/// Make sure `dest` exists and is empty, creating it when absent.
async fn prepare_destination(dest: &Path) -> Result<()> {
    match fs::metadata(dest).await {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(ScaffoldError::DestinationExists {
                path: dest.to_path_buf(),
            })
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ScaffoldError::io(parent, e))?;
            }
            match create_private_dir(dest).await {
                Ok(()) => return Ok(()),
                // Lost a race with another creator; fall through to the emptiness check
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(ScaffoldError::io(dest, e)),
            }
        }
        Err(e) => return Err(ScaffoldError::io(dest, e)),
    }

    let mut entries = fs::read_dir(dest)
        .await
        .map_err(|e| ScaffoldError::io(dest, e))?;
    if entries
        .next_entry()
        .await
        .map_err(|e| ScaffoldError::io(dest, e))?
        .is_some()
    {
        return Err(ScaffoldError::DestinationExists {
            path: dest.to_path_buf(),
        });
    }
    Ok(())
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await
}

/// Compute the value of every declared variable.
///
/// Precedence: explicit `overrides`, then the well-known project name and
/// description, then the template's declared default. Undeclared variables
/// are never substituted, even when an override names them.
pub fn resolve_variables(
    declared: &BTreeMap<String, String>,
    project_name: &str,
    description: Option<&str>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    declared
        .iter()
        .map(|(name, default)| {
            let value = overrides.get(name).cloned().unwrap_or_else(|| match name.as_str() {
                PROJECT_VAR => project_name.to_string(),
                DESCRIPTION_VAR => description
                    .map(str::to_string)
                    .unwrap_or_else(|| default.clone()),
                _ => default.clone(),
            });
            (name.clone(), value)
        })
        .collect()
}

/// Replace `${NAME}` occurrences for names in `values`, in a single pass.
/// Unknown placeholders are left as written.
pub fn substitute(text: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => match values.get(&after[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str("${");
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Copy template files into `dest`, applying placeholder substitution.
///
/// Fails with `DestinationExists` if `dest` already has content. Writes are
/// not rolled back: on failure the error lists the files already written and
/// the directory is left partially populated.
pub async fn materialize(
    dest: &Path,
    contents: &TemplateContents,
    values: &BTreeMap<String, String>,
) -> Result<Vec<String>> {
    prepare_destination(dest).await?;

    let mut written = Vec::with_capacity(contents.files.len());

    for (relative, bytes) in &contents.files {
        let target_path = dest.join(relative);

        let substituted = if values.is_empty() {
            None
        } else {
            std::str::from_utf8(bytes)
                .ok()
                .map(|text| substitute(text, values))
        };
        let data: &[u8] = substituted.as_deref().map(str::as_bytes).unwrap_or(bytes);

        if let Err(source) = write_file(&target_path, data).await {
            return Err(ScaffoldError::Io {
                path: target_path,
                written,
                source,
            });
        }

        written.push(relative.clone());
    }

    tracing::debug!(dest = %dest.display(), files = written.len(), "materialized template");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::manifest::MANIFEST_FILE;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn contents(manifest: &str, extra: &[(&str, &[u8])]) -> TemplateContents {
        let mut files = crate::templates::archive::FileTree::new();
        files.insert(MANIFEST_FILE.to_string(), manifest.as_bytes().to_vec());
        for (path, data) in extra {
            files.insert(path.to_string(), data.to_vec());
        }
        TemplateContents::from_files("test", files).unwrap()
    }

    #[test]
    fn test_substitute_known_placeholders() {
        let values = vars(&[("PROJECT", "my-pack"), ("DESCRIPTION", "Guards")]);
        assert_eq!(
            substitute("name: ${PROJECT}\ndescription: ${DESCRIPTION}\n", &values),
            "name: my-pack\ndescription: Guards\n"
        );
    }

    #[test]
    fn test_substitute_leaves_unknown_and_unterminated() {
        let values = vars(&[("PROJECT", "p")]);
        assert_eq!(substitute("${OTHER} ${PROJECT}", &values), "${OTHER} p");
        assert_eq!(substitute("cost: ${", &values), "cost: ${");
        assert_eq!(substitute("${PROJECT", &values), "${PROJECT");
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let values = vars(&[("A", "${B}"), ("B", "b")]);
        assert_eq!(substitute("${A}", &values), "${B}");
    }

    #[test]
    fn test_resolve_variables_precedence() {
        let declared = vars(&[
            ("PROJECT", "default-name"),
            ("DESCRIPTION", "default description"),
            ("REGION", "us-east-1"),
        ]);

        let resolved = resolve_variables(&declared, "my-pack", None, &BTreeMap::new());
        assert_eq!(resolved["PROJECT"], "my-pack");
        assert_eq!(resolved["DESCRIPTION"], "default description");
        assert_eq!(resolved["REGION"], "us-east-1");

        let overrides = vars(&[("REGION", "eu-west-1"), ("UNDECLARED", "x")]);
        let resolved = resolve_variables(&declared, "my-pack", Some("Mine"), &overrides);
        assert_eq!(resolved["DESCRIPTION"], "Mine");
        assert_eq!(resolved["REGION"], "eu-west-1");
        assert!(!resolved.contains_key("UNDECLARED"));
    }

    #[test]
    fn test_nothing_declared_resolves_to_nothing() {
        let resolved = resolve_variables(&BTreeMap::new(), "my-pack", None, &BTreeMap::new());
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_materialize_creates_destination_with_substitution() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("nested").join("my-pack");
        let template = contents(
            "name: ${PROJECT}\ntemplate:\n  variables:\n    PROJECT: x\n",
            &[
                ("src/index.js", &b"// ${PROJECT}\n"[..]),
                ("logo.png", &[0x89u8, b'P', 0xff, 0x00][..]),
            ],
        );

        let values = vars(&[("PROJECT", "my-pack")]);
        let written = materialize(&dest, &template, &values).await.unwrap();

        assert_eq!(written.len(), 3);
        let manifest = std::fs::read_to_string(dest.join(MANIFEST_FILE)).unwrap();
        assert!(manifest.starts_with("name: my-pack\n"));
        assert_eq!(
            std::fs::read_to_string(dest.join("src/index.js")).unwrap(),
            "// my-pack\n"
        );
        assert_eq!(
            std::fs::read(dest.join("logo.png")).unwrap(),
            vec![0x89, b'P', 0xff, 0x00]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_created_destination_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("private");
        materialize(&dest, &contents("name: x\n", &[]), &BTreeMap::new())
            .await
            .unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_no_variables_copies_verbatim() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let template = contents("name: ${PROJECT}\n", &[]);

        materialize(&dest, &template, &BTreeMap::new()).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dest.join(MANIFEST_FILE)).unwrap(),
            "name: ${PROJECT}\n"
        );
    }

    #[tokio::test]
    async fn test_existing_empty_destination_is_used() {
        let temp = TempDir::new().unwrap();
        materialize(temp.path(), &contents("name: x\n", &[]), &BTreeMap::new())
            .await
            .unwrap();
        assert!(temp.path().join(MANIFEST_FILE).is_file());
    }

    #[tokio::test]
    async fn test_non_empty_destination_is_left_untouched() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.txt"), "keep me").unwrap();

        let err = materialize(temp.path(), &contents("name: x\n", &[]), &BTreeMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::DestinationExists { .. }));
        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("notes.txt")]);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("notes.txt")).unwrap(),
            "keep me"
        );
    }

    #[tokio::test]
    async fn test_destination_that_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();

        let err = materialize(&file, &contents("name: x\n", &[]), &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::DestinationExists { .. }));
    }

    #[tokio::test]
    async fn test_write_failure_reports_progress() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        // "a.txt" sorts first and is written; "a.txt/b" then needs a.txt to be a directory
        let template = contents("name: x\n", &[("a.txt", &b"a"[..]), ("a.txt/b", &b"b"[..])]);

        let err = materialize(&dest, &template, &BTreeMap::new())
            .await
            .unwrap_err();
        match err {
            ScaffoldError::Io { written, path, .. } => {
                assert!(written.contains(&"a.txt".to_string()));
                assert!(path.ends_with("a.txt/b"));
            }
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
