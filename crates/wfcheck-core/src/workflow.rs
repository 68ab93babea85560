//! Workflow document validation.
//!
//! A workflow file is parsed with `serde_yaml` into a generic [`Value`] tree.
//! Top-level structure is checked first, then every `uses:` reference is run
//! through the [`VersionClassifier`]. Only a document that cannot be read or
//! parsed stops early; a malformed job or step is skipped and scanning
//! continues.

use crate::classifier::{Verdict, Violation, VersionClassifier};
use crate::fix::{self, ActionUpdate};
use crate::reference;
use crate::types::IssueKind;
use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Top-level keys every workflow must declare, in reporting order.
pub const REQUIRED_KEYS: &[&str] = &["name", "on", "jobs"];

// ---------------------------------------------------------------------------
// Issue / Advisory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepLocation {
    pub job: String,
    /// 1-based index within `steps`; `None` for a job-level `uses:`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl fmt::Display for StepLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "job '{}', step {step}", self.job),
            None => write!(f, "job '{}'", self.job),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    /// Best-effort 1-based line in the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<StepLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Full replacement reference, e.g. `actions/checkout@v4`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            location: None,
            reference: None,
            suggested_fix: None,
        }
    }

    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn step(&self) -> Option<usize> {
        self.location.as_ref().and_then(|l| l.step)
    }
}

/// Non-blocking finding: a stale version, a SHA pin, an unmaintained action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub location: StepLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub reference: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// WorkflowValidationResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowValidationResult {
    pub filename: String,
    pub issues: Vec<Issue>,
    pub advisories: Vec<Advisory>,
}

impl WorkflowValidationResult {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            issues: Vec::new(),
            advisories: Vec::new(),
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// One update per deprecated reference whose suggestion differs from
    /// it. The line is the document line when known, otherwise the step
    /// index.
    pub fn updates(&self) -> Vec<ActionUpdate> {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::DeprecatedVersion)
            .filter_map(|i| {
                let old = i.reference.as_ref()?;
                let new = i.suggested_fix.as_ref().filter(|new| *new != old)?;
                let line = i.line.or(i.step()).unwrap_or(0);
                Some(ActionUpdate::new(old.clone(), new.clone(), line))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// WorkflowValidator
// ---------------------------------------------------------------------------

pub struct WorkflowValidator<'a> {
    classifier: &'a VersionClassifier,
}

impl<'a> WorkflowValidator<'a> {
    pub fn new(classifier: &'a VersionClassifier) -> Self {
        Self { classifier }
    }

    /// Read and validate one file. A read failure becomes a single
    /// `FileError` issue.
    pub fn validate_file(&self, path: &Path) -> WorkflowValidationResult {
        let filename = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(text) => self.validate_str(&filename, &text),
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "failed to read workflow file");
                let mut result = WorkflowValidationResult::new(filename);
                result.issues.push(Issue::new(
                    IssueKind::FileError,
                    format!("failed to read workflow file: {e}"),
                ));
                result
            }
        }
    }

    pub fn validate_str(&self, filename: &str, text: &str) -> WorkflowValidationResult {
        let mut result = WorkflowValidationResult::new(filename);

        if text.trim().is_empty() {
            result.issues.push(empty_document());
            return result;
        }

        let doc: Value = match serde_yaml::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                result.issues.push(
                    Issue::new(
                        IssueKind::DocumentSyntax,
                        format!("invalid YAML syntax: {e}"),
                    )
                    .at_line(syntax_error_line(&e)),
                );
                return result;
            }
        };

        match &doc {
            Value::Null => {
                result.issues.push(empty_document());
                return result;
            }
            Value::Mapping(_) => {}
            _ => {
                result.issues.push(
                    Issue::new(
                        IssueKind::DocumentSyntax,
                        "workflow root must be a mapping of keys",
                    )
                    .at_line(Some(1)),
                );
                return result;
            }
        }

        for key in REQUIRED_KEYS {
            if doc.get(*key).is_none() {
                result.issues.push(
                    Issue::new(
                        IssueKind::MissingProperty,
                        format!("missing required property '{key}'"),
                    )
                    .at_line(Some(1)),
                );
            }
        }

        if let Some(jobs) = doc.get("jobs") {
            let mut locator = UsesLocator::new(text);
            self.check_jobs(jobs, &mut locator, &mut result);
        }

        tracing::debug!(
            file = filename,
            issues = result.issues.len(),
            advisories = result.advisories.len(),
            "validated workflow"
        );
        result
    }

    fn check_jobs(
        &self,
        jobs: &Value,
        locator: &mut UsesLocator,
        result: &mut WorkflowValidationResult,
    ) {
        let Some(jobs) = jobs.as_mapping() else {
            result.issues.push(Issue::new(
                IssueKind::DocumentSyntax,
                "'jobs' must be a mapping of job ids to jobs",
            ));
            return;
        };

        for (id, job) in jobs {
            let job_id = key_name(id);
            if !job.is_mapping() {
                tracing::debug!(job = %job_id, "skipping non-mapping job");
                continue;
            }

            // Reusable workflow call: `jobs.<id>.uses`.
            if let Some(uses) = job.get("uses") {
                let location = StepLocation {
                    job: job_id.clone(),
                    step: None,
                };
                self.check_uses(uses, location, locator, result);
            }

            let Some(steps) = job.get("steps").and_then(Value::as_sequence) else {
                continue;
            };
            for (i, step) in steps.iter().enumerate() {
                let Some(uses) = step.as_mapping().and_then(|_| step.get("uses")) else {
                    continue;
                };
                let location = StepLocation {
                    job: job_id.clone(),
                    step: Some(i + 1),
                };
                self.check_uses(uses, location, locator, result);
            }
        }
    }

    fn check_uses(
        &self,
        uses: &Value,
        location: StepLocation,
        locator: &mut UsesLocator,
        result: &mut WorkflowValidationResult,
    ) {
        let Some(raw) = uses.as_str() else {
            let mut issue = Issue::new(
                IssueKind::InvalidVersion,
                "'uses' must be a string reference such as owner/repo@v4",
            );
            issue.location = Some(location);
            result.issues.push(issue);
            return;
        };
        let raw = raw.trim();
        if raw.is_empty() || reference::is_local(raw) {
            return;
        }
        let line = locator.locate(raw);

        let parsed = match reference::parse(raw) {
            Ok(r) => r,
            Err(e) => {
                result
                    .issues
                    .push(violation_issue(Violation::from(e), raw, location, line));
                return;
            }
        };

        match self.classifier.classify_reference(&parsed) {
            Verdict::Valid { advisory: None } => {}
            Verdict::Valid {
                advisory: Some(message),
            }
            | Verdict::Warning { message } => result.advisories.push(Advisory {
                location: location.clone(),
                line,
                reference: raw.to_string(),
                message,
            }),
            Verdict::Deprecated {
                message,
                suggested_version,
            } => result.issues.push(Issue {
                kind: IssueKind::DeprecatedVersion,
                message,
                line,
                location: Some(location.clone()),
                reference: Some(raw.to_string()),
                suggested_fix: Some(fix::replacement_reference(raw, &suggested_version)),
            }),
            Verdict::Invalid { violation } => {
                result
                    .issues
                    .push(violation_issue(violation, raw, location.clone(), line));
            }
        }

        if let Some(message) = self.classifier.maintenance(&parsed) {
            result.advisories.push(Advisory {
                location,
                line,
                reference: raw.to_string(),
                message,
            });
        }
    }
}

fn violation_issue(
    violation: Violation,
    raw: &str,
    location: StepLocation,
    line: Option<usize>,
) -> Issue {
    let kind = match violation {
        Violation::MissingVersion => IssueKind::MissingVersion,
        _ => IssueKind::InvalidVersion,
    };
    Issue {
        kind,
        message: violation.to_string(),
        line,
        location: Some(location),
        reference: Some(raw.to_string()),
        suggested_fix: None,
    }
}

fn empty_document() -> Issue {
    Issue::new(IssueKind::DocumentSyntax, "empty workflow file").at_line(Some(1))
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Line recovery
// ---------------------------------------------------------------------------

static LINE_RE: OnceLock<Regex> = OnceLock::new();

fn line_re() -> &'static Regex {
    LINE_RE.get_or_init(|| Regex::new(r"line (\d+)").unwrap())
}

fn syntax_error_line(e: &serde_yaml::Error) -> Option<usize> {
    e.location()
        .map(|loc| loc.line())
        .or_else(|| line_from_message(&e.to_string()))
}

fn line_from_message(message: &str) -> Option<usize> {
    line_re().captures(message)?.get(1)?.as_str().parse().ok()
}

static USES_RE: OnceLock<Regex> = OnceLock::new();

/// A `uses:` key in block (`- uses: x`) or flow (`{uses: x, ...}`) style and
/// its scalar value, quoted or plain.
fn uses_re() -> &'static Regex {
    USES_RE.get_or_init(|| {
        Regex::new(r#"(?:^|[\s{,-])uses:\s*(?:"([^"]*)"|'([^']*)'|([^\s,}\]#]+))"#).unwrap()
    })
}

/// Finds the document line of each `uses:` value by scanning the raw text.
/// Lookups must be made in document order; each located occurrence is
/// consumed once so repeated references map to successive occurrences.
struct UsesLocator {
    occurrences: Vec<(usize, String)>,
    cursor: usize,
}

impl UsesLocator {
    fn new(text: &str) -> Self {
        let occurrences = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim_start().starts_with('#'))
            .flat_map(|(i, line)| uses_values(line).into_iter().map(move |v| (i + 1, v)))
            .collect();
        Self {
            occurrences,
            cursor: 0,
        }
    }

    fn locate(&mut self, raw: &str) -> Option<usize> {
        let offset = self.occurrences[self.cursor..]
            .iter()
            .position(|(_, value)| value == raw)?;
        let (line, _) = self.occurrences[self.cursor + offset];
        self.cursor += offset + 1;
        Some(line)
    }
}

fn uses_values(line: &str) -> Vec<String> {
    uses_re()
        .captures_iter(line)
        .filter_map(|caps| {
            let value = caps.get(1).or(caps.get(2)).or(caps.get(3))?;
            let value = value.as_str().trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
