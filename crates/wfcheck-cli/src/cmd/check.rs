use super::{validate_all, Context};
use crate::output::print_json;
use std::path::PathBuf;
use wfcheck_core::fix;
use wfcheck_core::workflow::{Advisory, Issue, WorkflowValidationResult};

pub fn run(ctx: &Context, files: &[PathBuf], strict: bool) -> anyhow::Result<()> {
    let classifier = ctx.classifier()?;
    let files = ctx.workflow_files(files)?;
    let results = validate_all(&classifier, &files)?;

    let failed = results
        .iter()
        .filter(|r| r.has_issues() || (strict && !r.advisories.is_empty()))
        .count();

    if ctx.json {
        let value = serde_json::json!({
            "passed": failed == 0,
            "strict": strict,
            "files": results,
        });
        print_json(&value)?;
    } else {
        for result in &results {
            print_report(result);
        }
        println!();
        if failed == 0 {
            println!("All {} workflow file(s) passed validation.", results.len());
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{failed} of {} workflow file(s) failed validation",
            results.len()
        );
    }
    Ok(())
}

fn print_report(result: &WorkflowValidationResult) {
    println!("Validating {}...", result.filename);

    if result.has_issues() {
        println!("✗ Issues found in {}:", result.filename);
        for issue in &result.issues {
            print_issue(&result.filename, issue);
        }
    }

    for advisory in &result.advisories {
        print_advisory(advisory);
    }

    if !result.has_issues() {
        println!("✓ {} validation passed", result.filename);
    }
}

fn print_issue(filename: &str, issue: &Issue) {
    println!("  {} {}{}", issue.kind.tag(), issue_position(issue), issue.message);
    if let (Some(old), Some(new)) = (&issue.reference, &issue.suggested_fix) {
        println!("  → Suggested fix: {old} → {new}");
        if old != new {
            println!("  → Fix command: {}", fix::fix_command(filename, old, new));
        }
    }
}

fn print_advisory(advisory: &Advisory) {
    let position = match advisory.line {
        Some(line) => format!("(line {line}) "),
        None => format!("({}) ", advisory.location),
    };
    println!("  [WARNING] {position}{}", advisory.message);
}

fn issue_position(issue: &Issue) -> String {
    match (issue.line, &issue.location) {
        (Some(line), _) => format!("(line {line}) "),
        (None, Some(location)) => format!("({location}) "),
        (None, None) => String::new(),
    }
}
