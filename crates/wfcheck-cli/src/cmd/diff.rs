use super::{collect_updates, validate_all, Context};
use crate::output::print_json;
use std::path::PathBuf;
use wfcheck_core::fix;

pub fn run(ctx: &Context, files: &[PathBuf]) -> anyhow::Result<()> {
    let classifier = ctx.classifier()?;
    let files = ctx.workflow_files(files)?;
    let results = validate_all(&classifier, &files)?;
    let updates = collect_updates(&results);

    if ctx.json {
        let value: Vec<_> = updates
            .iter()
            .map(|f| {
                serde_json::json!({
                    "filename": f.filename,
                    "updates": f.updates,
                    "diff": fix::diff(&f.filename, &f.updates),
                })
            })
            .collect();
        return print_json(&value);
    }

    if updates.is_empty() {
        println!("No deprecated references to update.");
        return Ok(());
    }
    for file in &updates {
        print!("{}", fix::diff(&file.filename, &file.updates));
    }
    Ok(())
}
