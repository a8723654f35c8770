//! Template discovery and parsing.
//!
//! A template directory is walked recursively; every `.yml`/`.yaml` file in
//! it may hold several YAML documents, each one issue definition. File and
//! document order never matters to the resulting tree, but loading is kept
//! deterministic (sorted paths) so errors reproduce.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use trellis_core::issue::Issue;

use crate::error::{LoadError, Result};

/// Loads every issue definition under `path`.
///
/// `path` may be a directory (walked recursively, skipping dotfiles and
/// non-YAML files) or a single template file. Duplicate issue names fail
/// with both defining files named.
pub fn load_templates(path: &Path) -> Result<Vec<Issue>> {
    if !path.exists() {
        return Err(LoadError::PathNotFound {
            path: path.to_owned(),
        });
    }

    let mut files = Vec::new();
    if path.is_file() {
        files.push(path.to_owned());
    } else {
        collect_template_files(path, &mut files)?;
        files.sort();
    }

    let mut issues = Vec::new();
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
    for file in files {
        for issue in load_template_file(&file)? {
            if let Some(first) = seen.get(issue.name()) {
                return Err(LoadError::DuplicateName {
                    name: issue.name().to_owned(),
                    path: file.clone(),
                    first: first.clone(),
                });
            }
            seen.insert(issue.name().to_owned(), file.clone());
            issues.push(issue);
        }
    }
    Ok(issues)
}

fn collect_template_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Read {
        path: dir.to_owned(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Read {
            path: dir.to_owned(),
            source,
        })?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_template_files(&path, files)?;
        } else if is_yaml(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Parses every document in one template file. Null documents (e.g. a
/// trailing `---`) are skipped.
fn load_template_file(path: &Path) -> Result<Vec<Issue>> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })?;

    let mut issues = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&text) {
        let value = Value::deserialize(document).map_err(|source| LoadError::Parse {
            path: path.to_owned(),
            source,
        })?;
        if value.is_null() {
            continue;
        }
        let issue = Issue::from_yaml(&value).map_err(|source| LoadError::Issue {
            path: path.to_owned(),
            source,
        })?;
        issues.push(issue);
    }
    Ok(issues)
}
