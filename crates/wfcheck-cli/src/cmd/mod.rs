pub mod check;
pub mod classify;
pub mod diff;
pub mod fix;
pub mod policy;

use anyhow::Context as _;
use std::path::{Path, PathBuf};
use wfcheck_core::classifier::VersionClassifier;
use wfcheck_core::fix::FileUpdates;
use wfcheck_core::policy::{Policy, WarnLevel};
use wfcheck_core::workflow::{WorkflowValidationResult, WorkflowValidator};

/// Global options shared by every subcommand.
pub struct Context {
    pub root: PathBuf,
    pub policy: Option<PathBuf>,
    pub json: bool,
}

impl Context {
    pub fn policy_path(&self) -> PathBuf {
        self.policy
            .clone()
            .unwrap_or_else(|| wfcheck_core::paths::policy_path(&self.root))
    }

    /// Load the effective policy and refuse to run with error-level findings.
    pub fn load_policy(&self) -> anyhow::Result<Policy> {
        let path = self.policy_path();
        let policy = Policy::load_from(&path)
            .with_context(|| format!("failed to load policy from {}", path.display()))?;
        for w in policy.validate() {
            if w.level == WarnLevel::Warning {
                tracing::warn!("policy: {}", w.message);
            }
        }
        policy
            .ensure_valid()
            .with_context(|| format!("policy {} is not usable", path.display()))?;
        Ok(policy)
    }

    pub fn classifier(&self) -> anyhow::Result<VersionClassifier> {
        Ok(VersionClassifier::from_policy(&self.load_policy()?))
    }

    /// Explicit files as given, or every workflow under the root.
    pub fn workflow_files(&self, files: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
        if !files.is_empty() {
            return Ok(files.to_vec());
        }
        let found = wfcheck_core::paths::require_workflows(&self.root)?;
        Ok(found)
    }
}

/// Validate every file, one thread per file. Results keep input order.
pub fn validate_all(
    classifier: &VersionClassifier,
    files: &[PathBuf],
) -> anyhow::Result<Vec<WorkflowValidationResult>> {
    let validator = WorkflowValidator::new(classifier);
    std::thread::scope(|s| {
        let handles: Vec<_> = files
            .iter()
            .map(|path| {
                let validator = &validator;
                s.spawn(move || validate_one(validator, path))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| anyhow::anyhow!("workflow validation thread panicked"))
            })
            .collect()
    })
}

fn validate_one(validator: &WorkflowValidator<'_>, path: &Path) -> WorkflowValidationResult {
    let mut result = validator.validate_file(path);
    result.filename = crate::output::display_path(path);
    result
}

/// Deprecated-reference updates grouped by file, skipping files with none.
pub fn collect_updates(results: &[WorkflowValidationResult]) -> Vec<FileUpdates> {
    results
        .iter()
        .filter_map(|r| {
            let updates = r.updates();
            (!updates.is_empty()).then(|| FileUpdates {
                filename: r.filename.clone(),
                updates,
            })
        })
        .collect()
}
