use super::Context;
use crate::output::{print_json, print_table};
use serde::Serialize;
use wfcheck_core::classifier::Verdict;
use wfcheck_core::fix::replacement_reference;

#[derive(Serialize)]
struct Classified<'a> {
    reference: &'a str,
    #[serde(flatten)]
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_fix: Option<String>,
}

pub fn run(ctx: &Context, refs: &[String]) -> anyhow::Result<()> {
    let classifier = ctx.classifier()?;

    let classified: Vec<Classified> = refs
        .iter()
        .map(|raw| {
            let verdict = classifier.classify(raw.trim());
            let suggested_fix = verdict
                .suggested_version()
                .map(|v| replacement_reference(raw.trim(), v));
            Classified {
                reference: raw,
                verdict,
                suggested_fix,
            }
        })
        .collect();

    if ctx.json {
        print_json(&classified)?;
    } else {
        let rows = classified
            .iter()
            .map(|c| {
                vec![
                    c.reference.to_string(),
                    c.verdict.as_str().to_string(),
                    c.verdict.message().unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["REFERENCE", "VERDICT", "MESSAGE"], rows);
    }

    let blocking = classified.iter().filter(|c| c.verdict.is_blocking()).count();
    if blocking > 0 {
        anyhow::bail!("{blocking} of {} reference(s) failed classification", refs.len());
    }
    Ok(())
}
