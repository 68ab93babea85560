use super::{collect_updates, validate_all, Context};
use crate::output::print_json;
use anyhow::Context as _;
use std::path::{Path, PathBuf};
use wfcheck_core::{fix, io};

pub fn run(ctx: &Context, files: &[PathBuf], output: Option<&Path>) -> anyhow::Result<()> {
    let classifier = ctx.classifier()?;
    let files = ctx.workflow_files(files)?;
    let results = validate_all(&classifier, &files)?;
    let updates = collect_updates(&results);

    if updates.is_empty() {
        if ctx.json {
            return print_json(&serde_json::json!({ "files": updates, "script": null }));
        }
        println!("No deprecated references to update.");
        return Ok(());
    }

    let script = fix::batch_fix(&updates);
    let count: usize = updates.iter().map(|f| f.updates.len()).sum();

    if let Some(path) = output {
        io::atomic_write(path, script.as_bytes())
            .with_context(|| format!("failed to write fix script to {}", path.display()))?;
        tracing::info!(path = %path.display(), updates = count, "wrote fix script");
    }

    if ctx.json {
        let value = serde_json::json!({
            "files": updates,
            "script": script,
            "output": output.map(|p| p.display().to_string()),
        });
        return print_json(&value);
    }

    match output {
        Some(path) => println!(
            "Wrote {count} update(s) across {} file(s) to {}",
            updates.len(),
            path.display()
        ),
        None => print!("{script}"),
    }
    Ok(())
}
