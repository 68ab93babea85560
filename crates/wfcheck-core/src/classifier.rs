use crate::cache::{VersionCache, VersionSource};
use crate::policy::{DeprecationCalendar, Policy};
use crate::reference::{self, major_tag, ActionReference, ReferenceError};
use crate::types::ReferenceKind;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// Why a reference was rejected. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    Empty,
    MissingVersion,
    InvalidFormat,
    FloatingBranch(String),
    UnsupportedVersion(String),
    DockerLatestTag,
    DockerMissingTag,
    DockerInvalid,
}

impl From<ReferenceError> for Violation {
    fn from(e: ReferenceError) -> Self {
        match e {
            ReferenceError::Empty => Violation::Empty,
            ReferenceError::MissingVersion => Violation::MissingVersion,
            ReferenceError::InvalidFormat => Violation::InvalidFormat,
            ReferenceError::InvalidDocker => Violation::DockerInvalid,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Empty => f.write_str("action reference is empty"),
            Violation::MissingVersion => {
                f.write_str("missing version: reference should include @<version> (e.g. @v4)")
            }
            Violation::InvalidFormat => {
                f.write_str("invalid format: expected owner/repo@<version>")
            }
            Violation::FloatingBranch(branch) => write!(
                f,
                "floating branch reference '@{branch}' is forbidden; use version tag instead (e.g. @v4)"
            ),
            Violation::UnsupportedVersion(version) => write!(
                f,
                "unsupported version format '{version}'; use a semantic version tag (e.g. v1, v1.0, v1.0.0)"
            ),
            Violation::DockerLatestTag => f.write_str(
                "latest tag is not reproducible; use a specific version tag (e.g. alpine:3.18)",
            ),
            Violation::DockerMissingTag => {
                f.write_str("docker image must include a specific tag (e.g. alpine:3.18)")
            }
            Violation::DockerInvalid => {
                f.write_str("invalid docker reference: expected docker://<image>:<tag>")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Valid {
        #[serde(skip_serializing_if = "Option::is_none")]
        advisory: Option<String>,
    },
    Warning {
        message: String,
    },
    Deprecated {
        message: String,
        suggested_version: String,
    },
    Invalid {
        violation: Violation,
    },
}

impl Verdict {
    pub fn valid() -> Self {
        Verdict::Valid { advisory: None }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid { .. } => "valid",
            Verdict::Warning { .. } => "warning",
            Verdict::Deprecated { .. } => "deprecated",
            Verdict::Invalid { .. } => "invalid",
        }
    }

    /// Deprecated and invalid references fail validation; everything else
    /// is advisory at most.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Deprecated { .. } | Verdict::Invalid { .. })
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Verdict::Valid { advisory } => advisory.clone(),
            Verdict::Warning { message } | Verdict::Deprecated { message, .. } => {
                Some(message.clone())
            }
            Verdict::Invalid { violation } => Some(violation.to_string()),
        }
    }

    pub fn suggested_version(&self) -> Option<&str> {
        match self {
            Verdict::Deprecated {
                suggested_version, ..
            } => Some(suggested_version),
            _ => None,
        }
    }
}

fn invalid(violation: Violation) -> Verdict {
    Verdict::Invalid { violation }
}

// ---------------------------------------------------------------------------
// VersionClassifier
// ---------------------------------------------------------------------------

/// Classifies action references against a known-version source and a
/// deprecation calendar. Lookups of the latest version go through a
/// [`VersionCache`] owned by the classifier.
pub struct VersionClassifier {
    cache: VersionCache,
    calendar: DeprecationCalendar,
    unmaintained: BTreeSet<String>,
}

impl VersionClassifier {
    pub fn new(source: Arc<dyn VersionSource>, calendar: DeprecationCalendar) -> Self {
        Self::with_cache(VersionCache::new(source), calendar)
    }

    pub fn with_cache(cache: VersionCache, calendar: DeprecationCalendar) -> Self {
        Self {
            cache,
            calendar,
            unmaintained: BTreeSet::new(),
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        let classifier = Self::new(Arc::new(policy.registry()), policy.calendar())
            .with_unmaintained(policy.unmaintained.clone());
        classifier.cache.set_ttl(policy.cache.ttl());
        classifier
    }

    pub fn with_unmaintained(mut self, unmaintained: BTreeSet<String>) -> Self {
        self.unmaintained = unmaintained;
        self
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    pub fn latest_version(&self, path: &str) -> Option<String> {
        self.cache.get(path)
    }

    pub fn is_known(&self, path: &str) -> bool {
        self.latest_version(path).is_some()
    }

    pub fn deprecation_dates(&self) -> &BTreeMap<String, NaiveDate> {
        self.calendar.dates()
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    pub fn classify(&self, raw: &str) -> Verdict {
        match reference::parse(raw) {
            Ok(r) => self.classify_reference(&r),
            Err(e) => invalid(e.into()),
        }
    }

    /// Docker-only entry point: anything that is not `docker://...` is invalid.
    pub fn classify_docker(&self, raw: &str) -> Verdict {
        match reference::parse(raw) {
            Ok(r) if r.is_docker() => classify_docker_ref(&r),
            Ok(_) | Err(_) => invalid(Violation::DockerInvalid),
        }
    }

    pub fn classify_reference(&self, r: &ActionReference) -> Verdict {
        if r.is_docker() {
            return classify_docker_ref(r);
        }
        let Some(version) = r.version.as_deref() else {
            return invalid(Violation::MissingVersion);
        };

        // Format checks come before any registry lookup.
        match r.kind {
            ReferenceKind::Sha => {
                return Verdict::Valid {
                    advisory: Some(format!(
                        "pinned to commit SHA; consider using version tag for readability (e.g. {}@v4)",
                        r.path
                    )),
                };
            }
            ReferenceKind::Branch => {
                return invalid(Violation::FloatingBranch(version.to_string()));
            }
            ReferenceKind::Tag | ReferenceKind::DockerImage => {}
        }
        let Some(major) = major_tag(version) else {
            return invalid(Violation::UnsupportedVersion(version.to_string()));
        };

        let Some(latest) = self.latest_version(&r.path) else {
            return Verdict::valid();
        };

        if let Some(since) = self.calendar.deprecated_since(major) {
            return Verdict::Deprecated {
                message: format!(
                    "{} uses deprecated version {version} ({major} deprecated since {since}); latest version is {latest}",
                    r.raw
                ),
                suggested_version: latest,
            };
        }

        if version != latest {
            return Verdict::Warning {
                message: format!(
                    "{} is not using the latest version; newer version {latest} is available",
                    r.raw
                ),
            };
        }

        Verdict::valid()
    }

    /// Advisory for actions the policy lists as unmaintained.
    pub fn maintenance(&self, r: &ActionReference) -> Option<String> {
        if !self.unmaintained.contains(&r.path) {
            return None;
        }
        Some(format!(
            "{} appears unmaintained; consider an alternative action",
            r.path
        ))
    }
}

fn classify_docker_ref(r: &ActionReference) -> Verdict {
    match r.version.as_deref() {
        Some("latest") => invalid(Violation::DockerLatestTag),
        Some(_) => Verdict::valid(),
        None => invalid(Violation::DockerMissingTag),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
