//! Parsing of `uses:` values into structured action references.
//!
//! Two textual forms are understood:
//!
//! * `owner/repo[/subpath]@<version>` where the version is a tag, a 40-char
//!   commit SHA, or a branch name;
//! * `docker://<image>[:<tag>|@<digest>]`.

use crate::types::ReferenceKind;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

pub const DOCKER_PREFIX: &str = "docker://";

/// Branch names that always float and are never acceptable as a pin.
pub const FLOATING_BRANCHES: &[&str] = &["main", "master", "develop"];

static ACTION_RE: OnceLock<Regex> = OnceLock::new();
static SHA_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn action_re() -> &'static Regex {
    ACTION_RE.get_or_init(|| Regex::new(r"^([^/@\s]+/[^@\s]+)@([^@\s]+)$").unwrap())
}

fn sha_re() -> &'static Regex {
    SHA_RE.get_or_init(|| Regex::new(r"^[a-f0-9]{40}$").unwrap())
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"^v(\d+)(\.\d+)?(\.\d+)?$").unwrap())
}

// ---------------------------------------------------------------------------
// ActionReference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReference {
    pub raw: String,
    /// `owner/repo[/subpath]`, or the image name for Docker references.
    pub path: String,
    /// Always present for action references; the tag or digest for images.
    pub version: Option<String>,
    pub kind: ReferenceKind,
}

impl ActionReference {
    pub fn is_docker(&self) -> bool {
        self.kind == ReferenceKind::DockerImage
    }

    /// `v3` for `v3`, `v3.1` and `v3.1.4`. `None` unless the version is a
    /// well-formed tag.
    pub fn major(&self) -> Option<&str> {
        self.version.as_deref().and_then(major_tag)
    }
}

impl fmt::Display for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// ReferenceError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceError {
    Empty,
    MissingVersion,
    InvalidFormat,
    InvalidDocker,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse(raw: &str) -> Result<ActionReference, ReferenceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ReferenceError::Empty);
    }
    if let Some(image) = raw.strip_prefix(DOCKER_PREFIX) {
        return parse_docker(raw, image);
    }

    let Some(caps) = action_re().captures(raw) else {
        if !raw.contains('@') {
            return Err(ReferenceError::MissingVersion);
        }
        return Err(ReferenceError::InvalidFormat);
    };
    let path = caps[1].to_string();
    let version = caps[2].to_string();

    let kind = if is_sha(&version) {
        ReferenceKind::Sha
    } else if FLOATING_BRANCHES.contains(&version.as_str()) {
        ReferenceKind::Branch
    } else {
        ReferenceKind::Tag
    };

    Ok(ActionReference {
        raw: raw.to_string(),
        path,
        version: Some(version),
        kind,
    })
}

fn parse_docker(raw: &str, image: &str) -> Result<ActionReference, ReferenceError> {
    if image.is_empty() || image.chars().any(char::is_whitespace) {
        return Err(ReferenceError::InvalidDocker);
    }

    // Digest pins: image@sha256:...
    if let Some((name, digest)) = image.split_once('@') {
        if name.is_empty() || digest.is_empty() {
            return Err(ReferenceError::InvalidDocker);
        }
        return Ok(docker_ref(raw, name, Some(digest)));
    }

    // Only a colon after the last slash separates a tag; earlier colons
    // belong to a registry host:port.
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(offset) => {
            let split = name_start + offset;
            let (name, tag) = (&image[..split], &image[split + 1..]);
            if name.is_empty() || tag.is_empty() {
                return Err(ReferenceError::InvalidDocker);
            }
            Ok(docker_ref(raw, name, Some(tag)))
        }
        None => Ok(docker_ref(raw, image, None)),
    }
}

fn docker_ref(raw: &str, name: &str, tag: Option<&str>) -> ActionReference {
    ActionReference {
        raw: raw.to_string(),
        path: name.to_string(),
        version: tag.map(str::to_string),
        kind: ReferenceKind::DockerImage,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Local actions (`./.github/actions/foo`) live in the repository itself and
/// carry no version.
pub fn is_local(raw: &str) -> bool {
    let raw = raw.trim_start();
    raw.starts_with("./") || raw.starts_with("../")
}

pub fn is_sha(version: &str) -> bool {
    sha_re().is_match(version)
}

/// True for `v<major>[.<minor>[.<patch>]]`. Pre-release suffixes are rejected.
pub fn is_version_tag(version: &str) -> bool {
    tag_re().is_match(version)
}

pub fn major_tag(version: &str) -> Option<&str> {
    let caps = tag_re().captures(version)?;
    let end = caps.get(1)?.end();
    Some(&version[..end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
