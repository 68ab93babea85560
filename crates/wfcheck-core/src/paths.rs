use crate::error::{Result, WfError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const WORKFLOWS_DIR: &str = ".github/workflows";
pub const POLICY_FILE: &str = ".github/wfcheck.yaml";

const WORKFLOW_EXTENSIONS: &[&str] = &["yml", "yaml"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn workflows_dir(root: &Path) -> PathBuf {
    root.join(WORKFLOWS_DIR)
}

pub fn policy_path(root: &Path) -> PathBuf {
    root.join(POLICY_FILE)
}

pub fn is_workflow_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKFLOW_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Every `*.yml` / `*.yaml` directly under `.github/workflows`, sorted by name.
/// A missing directory yields an empty list.
pub fn discover_workflows(root: &Path) -> Result<Vec<PathBuf>> {
    let dir = workflows_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && is_workflow_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Like [`discover_workflows`], but an empty result is an error.
pub fn require_workflows(root: &Path) -> Result<Vec<PathBuf>> {
    let files = discover_workflows(root)?;
    if files.is_empty() {
        return Err(WfError::NoWorkflows(workflows_dir(root).display().to_string()));
    }
    Ok(files)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
