//! Whole-file persistence for the two descriptor files.
//!
//! Reads load the entire file, mutation happens in memory, and the single
//! write goes through a sibling temporary file renamed into place, so a
//! crash mid-write never leaves a half-written descriptor visible.

use crate::error::{PersistenceError, Result};
use crate::topology::DeploymentGraph;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Loads the Deployment Graph. A missing file is its own error so the CLI
/// can tell the user to initialize first instead of silently starting over.
pub fn load_graph(path: &Path) -> Result<DeploymentGraph> {
    if !path.exists() {
        return Err(PersistenceError::MissingGraph {
            path: path.to_path_buf(),
        }
        .into());
    }
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|e| {
        PersistenceError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

pub fn store_graph(path: &Path, graph: &DeploymentGraph) -> Result<()> {
    let text = serde_yaml::to_string(graph)?;
    write_atomic(path, text.as_bytes())
}

/// First-time write of the Deployment Graph. The file is created once at
/// project initialization and never rebuilt from scratch afterwards, so an
/// already-present graph is refused, the mirror image of [`load_graph`]'s
/// missing-file error.
pub fn init_graph(path: &Path, graph: &DeploymentGraph) -> Result<()> {
    if path.exists() {
        return Err(PersistenceError::AlreadyInitialized {
            path: path.to_path_buf(),
        }
        .into());
    }
    store_graph(path, graph)
}

pub fn load_text(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|source| {
            PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
}

pub fn store_text(path: &Path, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp =
        NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new("."))).map_err(|source| {
            PersistenceError::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;
    tmp.write_all(bytes).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.persist(path).map_err(|e| PersistenceError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
