use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `WFCHECK_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.github/workflows/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd)
}

fn find_root_from(start: &Path) -> PathBuf {
    for marker in [wfcheck_core::paths::WORKFLOWS_DIR, ".git"] {
        if let Some(dir) = start.ancestors().find(|d| d.join(marker).is_dir()) {
            return dir.to_path_buf();
        }
    }
    start.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_workflows_dir_above() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".github/workflows")).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(find_root_from(&subdir), dir.path());
    }

    #[test]
    fn workflows_beat_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(project.join(".github/workflows")).unwrap();
        assert_eq!(find_root_from(&project.join("src")), project);
    }

    #[test]
    fn falls_back_to_start() {
        let dir = TempDir::new().unwrap();
        let start = dir.path().join("nowhere");
        assert_eq!(find_root_from(&start), start);
    }
}
