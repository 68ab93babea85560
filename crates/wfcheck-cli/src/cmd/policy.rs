use super::Context;
use crate::output::{print_json, print_table};
use anyhow::Context as _;
use clap::Subcommand;
use wfcheck_core::policy::{Policy, WarnLevel};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum PolicySubcommand {
    /// Show the effective policy (built-in tables when no file exists)
    Show,

    /// Validate the policy for common mistakes
    Validate,

    /// Write the built-in policy to the policy file if it does not exist
    Init,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Context, subcmd: PolicySubcommand) -> anyhow::Result<()> {
    match subcmd {
        PolicySubcommand::Show => show(ctx),
        PolicySubcommand::Validate => validate(ctx),
        PolicySubcommand::Init => init(ctx),
    }
}

fn load(ctx: &Context) -> anyhow::Result<Policy> {
    let path = ctx.policy_path();
    Policy::load_from(&path)
        .with_context(|| format!("failed to load policy from {}", path.display()))
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &Context) -> anyhow::Result<()> {
    let policy = load(ctx)?;
    if ctx.json {
        return print_json(&policy);
    }

    let path = ctx.policy_path();
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    println!("Policy: {source}");
    println!("Cache TTL: {}h", policy.cache.ttl_hours);
    println!();

    let rows = policy
        .actions
        .iter()
        .map(|(path, latest)| vec![path.clone(), latest.clone()])
        .collect();
    print_table(&["ACTION", "LATEST"], rows);
    println!();

    let rows = policy
        .deprecations
        .iter()
        .map(|(major, date)| vec![major.clone(), date.to_string()])
        .collect();
    print_table(&["MAJOR", "DEPRECATED SINCE"], rows);

    if !policy.unmaintained.is_empty() {
        println!();
        println!("Unmaintained:");
        for path in &policy.unmaintained {
            println!("  {path}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &Context) -> anyhow::Result<()> {
    let policy = load(ctx)?;
    let warnings = policy.validate();

    if ctx.json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Policy is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("policy validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(ctx: &Context) -> anyhow::Result<()> {
    let path = ctx.policy_path();
    let written = Policy::init_at(&path)
        .with_context(|| format!("failed to write policy to {}", path.display()))?;

    if ctx.json {
        let value = serde_json::json!({
            "path": path.display().to_string(),
            "written": written,
        });
        return print_json(&value);
    }
    if written {
        println!("Wrote default policy to {}", path.display());
    } else {
        println!("Policy already exists at {}", path.display());
    }
    Ok(())
}
