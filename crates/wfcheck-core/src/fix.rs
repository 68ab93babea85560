//! Generation of corrective output: `sed` substitution commands, unified-diff
//! snippets, and a batch shell script. Nothing here touches the filesystem.

use serde::Serialize;

/// One reference replacement within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionUpdate {
    pub old_reference: String,
    pub new_reference: String,
    pub line: usize,
}

impl ActionUpdate {
    pub fn new(old: impl Into<String>, new: impl Into<String>, line: usize) -> Self {
        Self {
            old_reference: old.into(),
            new_reference: new.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUpdates {
    pub filename: String,
    pub updates: Vec<ActionUpdate>,
}

/// `owner/repo@v3` + `v4` → `owner/repo@v4`.
pub fn replacement_reference(old: &str, suggested_version: &str) -> String {
    match old.rfind('@') {
        Some(i) => format!("{}@{suggested_version}", &old[..i]),
        None => format!("{old}@{suggested_version}"),
    }
}

/// Characters that may follow a reference on its line. The match is anchored
/// on one of these (or end of line) so `@v3` never rewrites `@v3.5.2`.
const REFERENCE_END: &str = r#"[[:space:]"'#,}]"#;

pub fn fix_command(filename: &str, old: &str, new: &str) -> String {
    let (pattern, replacement) = (sed_pattern(old), sed_replacement(new));
    let inline = format!("s|{pattern}\\({REFERENCE_END}\\)|{replacement}\\1|g");
    let at_end = format!("s|{pattern}$|{replacement}|");
    format!(
        "sed -i.bak -e {} -e {} {} && rm -f {}",
        single_quote(&inline),
        single_quote(&at_end),
        shell_quote(filename),
        shell_quote(&format!("{filename}.bak"))
    )
}

pub fn diff(filename: &str, updates: &[ActionUpdate]) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- a/{filename}\n"));
    out.push_str(&format!("+++ b/{filename}\n"));
    for u in updates {
        out.push_str(&format!("@@ -{line},1 +{line},1 @@\n", line = u.line));
        out.push_str(&format!("-        uses: {}\n", u.old_reference));
        out.push_str(&format!("+        uses: {}\n", u.new_reference));
    }
    out
}

/// POSIX shell script applying every update, one section per file in input
/// order.
pub fn batch_fix(files: &[FileUpdates]) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    script.push_str("# Apply all fixes: GitHub Actions version updates\n");
    script.push_str("set -e\n\n");

    for file in files {
        script.push_str(&format!(
            "echo {}\n",
            single_quote(&format!("Updating {}...", file.filename))
        ));
        for u in &file.updates {
            script.push_str(&fix_command(
                &file.filename,
                &u.old_reference,
                &u.new_reference,
            ));
            script.push('\n');
        }
        script.push('\n');
    }

    script.push_str("echo 'All fixes applied!'\n");
    script
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Escape for a basic regular expression using `|` as the delimiter.
fn sed_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '|' | '.' | '*' | '[' | ']' | '^' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn sed_replacement(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '|' | '&') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./@+,:=".contains(c));
    if safe {
        s.to_string()
    } else {
        single_quote(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
