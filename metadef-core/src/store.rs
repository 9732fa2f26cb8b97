//! Local declaration store.
//!
//! # Layout
//!
//! A declaration set is a YAML mapping of type key to definition. It lives
//! either in a single file or spread across a directory:
//!
//! ```text
//! metaobjects.yaml          (single file: every type in one mapping)
//!
//! metaobjects/              (directory: every *.yaml / *.yml is merged)
//!   color.yaml
//!   hero_banner.yaml
//! ```
//!
//! A type key may appear in only one file of a directory. Comments are
//! allowed anywhere; they are not preserved when the store is rewritten.
//!
//! Writes use the `.tmp` + rename pattern, so a failed write never leaves a
//! truncated declaration file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, StoreError};
use crate::types::{DefinitionMap, TypeKey};

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Load declarations from a file or a directory of YAML files.
///
/// Returns `StoreError::NotFound` if `path` is absent, `StoreError::Parse`
/// (with path + line context) if any file is malformed, and
/// `StoreError::DuplicateType` if a directory declares a type twice.
pub fn load_definitions(path: &Path) -> Result<DefinitionMap, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        load_directory(path)
    } else {
        load_file(path)
    }
}

/// Parse a single declaration file. An empty file is an empty set.
pub fn load_file(path: &Path) -> Result<DefinitionMap, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse_definitions(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse declarations from YAML text.
pub fn parse_definitions(contents: &str) -> Result<DefinitionMap, serde_yaml::Error> {
    if is_blank(contents) {
        return Ok(DefinitionMap::new());
    }
    let parsed: Option<DefinitionMap> = serde_yaml::from_str(contents)?;
    Ok(parsed.unwrap_or_default())
}

// Only whitespace, comments and document markers.
fn is_blank(contents: &str) -> bool {
    contents.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn load_directory(dir: &Path) -> Result<DefinitionMap, StoreError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_yaml(p))
        .collect();
    files.sort();

    let mut merged = DefinitionMap::new();
    let mut origin: BTreeMap<TypeKey, PathBuf> = BTreeMap::new();
    for file in files {
        for (type_key, definition) in load_file(&file)? {
            if let Some(first) = origin.get(&type_key) {
                return Err(StoreError::DuplicateType {
                    type_key,
                    first: first.clone(),
                    second: file,
                });
            }
            origin.insert(type_key.clone(), file.clone());
            merged.insert(type_key, definition);
        }
    }
    tracing::debug!("loaded {} definition(s) from {}", merged.len(), dir.display());
    Ok(merged)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

// ---------------------------------------------------------------------------
// 2. Save (atomic)
// ---------------------------------------------------------------------------

/// Render declarations as YAML text.
pub fn to_yaml(definitions: &DefinitionMap) -> Result<String, StoreError> {
    Ok(serde_yaml::to_string(definitions)?)
}

/// Atomically write every declaration to a single file.
///
/// Write flow: serialize → `<path>.tmp` sibling → `rename`. Parent
/// directories are created if needed.
pub fn save_definitions(path: &Path, definitions: &DefinitionMap) -> Result<(), StoreError> {
    let yaml = to_yaml(definitions)?;
    atomic_write(path, &yaml)
}

/// Atomically write one `<type_key>.yaml` per definition into `dir`.
///
/// Returns the written paths in type-key order. Files for types that are no
/// longer present are left alone.
pub fn save_split(dir: &Path, definitions: &DefinitionMap) -> Result<Vec<PathBuf>, StoreError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let mut written = Vec::with_capacity(definitions.len());
    for (type_key, definition) in definitions {
        let mut single = DefinitionMap::new();
        single.insert(type_key.clone(), definition.clone());
        let path = dir.join(format!("{type_key}.yaml"));
        atomic_write(&path, &to_yaml(&single)?)?;
        written.push(path);
    }
    Ok(written)
}

fn atomic_write(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
