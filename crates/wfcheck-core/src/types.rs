use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ReferenceKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Tag,
    Sha,
    Branch,
    DockerImage,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Tag => "tag",
            ReferenceKind::Sha => "sha",
            ReferenceKind::Branch => "branch",
            ReferenceKind::DockerImage => "docker_image",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IssueKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DocumentSyntax,
    MissingProperty,
    InvalidVersion,
    MissingVersion,
    DeprecatedVersion,
    FileError,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::DocumentSyntax => "document_syntax",
            IssueKind::MissingProperty => "missing_property",
            IssueKind::InvalidVersion => "invalid_version",
            IssueKind::MissingVersion => "missing_version",
            IssueKind::DeprecatedVersion => "deprecated_version",
            IssueKind::FileError => "file_error",
        }
    }

    /// Bracketed category shown in the console report.
    pub fn tag(self) -> &'static str {
        match self {
            IssueKind::DeprecatedVersion => "[DEPRECATED]",
            IssueKind::MissingVersion => "[MISSING VERSION]",
            IssueKind::InvalidVersion => "[INVALID VERSION]",
            IssueKind::DocumentSyntax => "[YAML SYNTAX]",
            IssueKind::MissingProperty => "[MISSING PROPERTY]",
            IssueKind::FileError => "[ERROR]",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
