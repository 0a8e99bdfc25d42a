//! Template file trees and zip archives
//!
//! Remote and registry templates arrive as zip archives; local templates are
//! read straight from disk. Both end up as a [`FileTree`] keyed by
//! `/`-separated relative path.

use super::manifest::{SharedFile, MANIFEST_FILE};
use crate::error::{Result, ScaffoldError};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Relative path -> file contents
pub type FileTree = BTreeMap<String, Vec<u8>>;

/// Directories never copied out of a template
const IGNORED_DIRS: &[&str] = &[".git"];

/// Join path components with `/`, rejecting anything that is not a plain name.
fn to_relative_key(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Read every regular file under `dir`, skipping VCS metadata.
///
/// Symlinks are followed. Dangling links, link cycles and special files are
/// skipped with a warning.
pub fn read_tree(dir: &Path) -> Result<FileTree> {
    let mut files = FileTree::new();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && IGNORED_DIRS
                    .iter()
                    .any(|ignored| entry.file_name() == *ignored))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_broken_link(&e) => {
                tracing::warn!(path = ?e.path(), error = %e, "skipping unreadable link");
                continue;
            }
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                return Err(ScaffoldError::io(path, e.into()));
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_type().is_file() {
            tracing::warn!(path = %entry.path().display(), "skipping special file");
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let Some(key) = to_relative_key(relative) else {
            tracing::warn!(path = %entry.path().display(), "skipping file with non UTF-8 path");
            continue;
        };
        let contents =
            std::fs::read(entry.path()).map_err(|e| ScaffoldError::io(entry.path(), e))?;
        files.insert(key, contents);
    }

    Ok(files)
}

fn is_broken_link(error: &walkdir::Error) -> bool {
    error.loop_ancestor().is_some()
        || error
            .io_error()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

fn invalid(identifier: &str, reason: impl Into<String>) -> ScaffoldError {
    ScaffoldError::InvalidTemplate {
        identifier: identifier.to_string(),
        reason: reason.into(),
    }
}

fn zip_error(identifier: &str, error: ZipError) -> ScaffoldError {
    match error {
        ZipError::Io(e) => ScaffoldError::io(identifier, e),
        other => invalid(identifier, other.to_string()),
    }
}

/// Extract an archive into memory.
///
/// A single top-level directory shared by every entry is stripped, so both
/// `<name>/PolicyPack.yaml` and `PolicyPack.yaml` layouts work.
pub fn extract(zip_bytes: &[u8], identifier: &str) -> Result<FileTree> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
        .map_err(|e| invalid(identifier, format!("not a readable zip archive: {}", e)))?;

    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| zip_error(identifier, e))?;
        if file.is_dir() {
            continue;
        }

        let key = file
            .enclosed_name()
            .as_deref()
            .and_then(to_relative_key)
            .ok_or_else(|| {
                invalid(
                    identifier,
                    format!("archive entry escapes the template root: {}", file.name()),
                )
            })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| ScaffoldError::io(identifier, e))?;
        entries.push((key, contents));
    }

    let prefix = common_root(entries.iter().map(|(k, _)| k.as_str()));
    Ok(entries
        .into_iter()
        .map(|(key, contents)| match &prefix {
            Some(prefix) => (key[prefix.len()..].to_string(), contents),
            None => (key, contents),
        })
        .collect())
}

/// `Some("dir/")` when every path lives under the same first directory.
fn common_root<'a>(mut paths: impl Iterator<Item = &'a str>) -> Option<String> {
    let first = paths.next()?;
    let (root, _) = first.split_once('/')?;
    let prefix = format!("{}/", root);
    if paths.all(|p| p.starts_with(&prefix)) {
        Some(prefix)
    } else {
        None
    }
}

/// Build the registry archive for one template directory.
///
/// Entries are stored under `<name>/`. Shared files from the registry root
/// are added with their destination names; a template's own file wins over
/// a shared file with the same destination.
pub fn build_template_zip(
    registry_dir: &Path,
    template_name: &str,
    shared_files: &[SharedFile],
) -> Result<Vec<u8>> {
    let template_path = registry_dir.join(template_name);
    let mut files = read_tree(&template_path)?;

    if !files.contains_key(MANIFEST_FILE) {
        return Err(invalid(
            template_name,
            format!("missing {} in {}", MANIFEST_FILE, template_path.display()),
        ));
    }

    for shared in shared_files {
        let source_path = registry_dir.join(&shared.source);
        if !source_path.is_file() {
            tracing::warn!(
                shared = %shared.source,
                registry = %registry_dir.display(),
                "shared file not found"
            );
            continue;
        }
        if files.contains_key(shared.destination()) {
            continue;
        }
        let content =
            std::fs::read(&source_path).map_err(|e| ScaffoldError::io(&source_path, e))?;
        files.insert(shared.destination().to_string(), content);
    }

    write_zip(&files, Some(template_name)).map_err(|e| zip_error(template_name, e))
}

/// Serialize a file tree as a deflated zip, optionally under a root directory.
pub fn write_zip(files: &FileTree, root: Option<&str>) -> std::result::Result<Vec<u8>, ZipError> {
    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (path, contents) in files {
            let name = match root {
                Some(root) => format!("{}/{}", root, path),
                None => path.clone(),
            };
            zip.start_file(name, options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
    }
    Ok(zip_buffer)
}
