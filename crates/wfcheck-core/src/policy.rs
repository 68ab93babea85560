use crate::cache::VersionSource;
use crate::error::{Result, WfError};
use crate::paths;
use crate::reference::{is_version_tag, major_tag};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// PolicyWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_ttl_hours() -> u64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours.saturating_mul(60 * 60))
    }
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

fn default_actions() -> BTreeMap<String, String> {
    [
        // GitHub official actions
        ("actions/checkout", "v4"),
        ("actions/setup-java", "v4"),
        ("actions/setup-node", "v4"),
        ("actions/setup-python", "v4"),
        ("actions/upload-artifact", "v4"),
        ("actions/download-artifact", "v4"),
        ("actions/cache", "v4"),
        ("actions/github-script", "v7"),
        ("actions/setup-go", "v5"),
        // Common third-party actions
        ("docker/setup-buildx-action", "v3"),
        ("docker/build-push-action", "v5"),
        ("docker/login-action", "v3"),
        ("docker/setup-qemu-action", "v3"),
        ("docker/metadata-action", "v5"),
        ("dorny/test-reporter", "v1"),
        ("gradle/gradle-build-action", "v3"),
        ("softprops/action-gh-release", "v1"),
        ("sigstore/cosign-installer", "v3"),
        ("anchore/sbom-action", "v0"),
        ("anchore/scan-action", "v3"),
        ("github/codeql-action", "v3"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_deprecations() -> BTreeMap<String, NaiveDate> {
    let mut m = BTreeMap::new();
    if let Some(d) = NaiveDate::from_ymd_opt(2023, 1, 1) {
        m.insert("v2".to_string(), d);
    }
    if let Some(d) = NaiveDate::from_ymd_opt(2023, 9, 1) {
        m.insert("v3".to_string(), d);
    }
    m
}

fn default_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// KnownActionRegistry
// ---------------------------------------------------------------------------

/// `owner/repo` → latest known version. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownActionRegistry {
    latest: BTreeMap<String, String>,
}

impl KnownActionRegistry {
    pub fn new(latest: BTreeMap<String, String>) -> Self {
        Self { latest }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.latest.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.latest.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.latest.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl VersionSource for KnownActionRegistry {
    fn latest_version(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// DeprecationCalendar
// ---------------------------------------------------------------------------

/// Major tag (`v3`) → date after which that major should no longer be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeprecationCalendar {
    dates: BTreeMap<String, NaiveDate>,
}

impl DeprecationCalendar {
    pub fn new(dates: BTreeMap<String, NaiveDate>) -> Self {
        Self { dates }
    }

    pub fn deprecated_since(&self, major: &str) -> Option<NaiveDate> {
        self.dates.get(major).copied()
    }

    pub fn dates(&self) -> &BTreeMap<String, NaiveDate> {
        &self.dates
    }
}

// ---------------------------------------------------------------------------
// Policy (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_actions")]
    pub actions: BTreeMap<String, String>,
    #[serde(default = "default_deprecations")]
    pub deprecations: BTreeMap<String, NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unmaintained: BTreeSet<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache: CacheConfig::default(),
            actions: default_actions(),
            deprecations: default_deprecations(),
            unmaintained: BTreeSet::new(),
        }
    }
}

impl Policy {
    /// Load `.github/wfcheck.yaml` under `root`, or the built-in policy if absent.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(&paths::policy_path(root))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no policy file, using built-in tables");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let policy: Policy = serde_yaml::from_str(data)?;
        Ok(policy)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        self.save_to(&paths::policy_path(root))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let data = self.to_yaml()?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Write the built-in policy to `path` unless a file is already there.
    /// Returns true if written.
    pub fn init_at(path: &Path) -> Result<bool> {
        let data = Self::default().to_yaml()?;
        crate::io::write_if_missing(path, data.as_bytes())
    }

    pub fn registry(&self) -> KnownActionRegistry {
        KnownActionRegistry::new(self.actions.clone())
    }

    pub fn calendar(&self) -> DeprecationCalendar {
        DeprecationCalendar::new(self.deprecations.clone())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<PolicyWarning> {
        let mut warnings = Vec::new();

        for (path, latest) in &self.actions {
            if !path.contains('/') || path.contains('@') {
                warnings.push(PolicyWarning {
                    level: WarnLevel::Error,
                    message: format!("action '{path}' is not of the form owner/repo"),
                });
            }
            if !is_version_tag(latest) {
                warnings.push(PolicyWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "latest version '{latest}' for '{path}' is not a version tag (e.g. v4)"
                    ),
                });
            }
        }

        let today = Utc::now().date_naive();
        for (major, date) in &self.deprecations {
            if major_tag(major) != Some(major.as_str()) {
                warnings.push(PolicyWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "deprecation key '{major}' must be a bare major tag such as v3"
                    ),
                });
            } else if *date > today {
                warnings.push(PolicyWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "deprecation of '{major}' is dated {date} but is already enforced"
                    ),
                });
            }
        }

        if self.cache.ttl_hours == 0 {
            warnings.push(PolicyWarning {
                level: WarnLevel::Warning,
                message: "cache.ttl_hours is 0; every lookup bypasses the cache".to_string(),
            });
        }

        warnings
    }

    /// Fail on the first error-level finding of [`Policy::validate`].
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(WfError::InvalidPolicy(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
