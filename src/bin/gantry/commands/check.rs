//! `gantry check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use crate::commands::{build_context, manifest_path};
use gantry::ops::load::load_declarations;
use gantry::ops::resolve::resolve_all;
use gantry::util::diagnostic::emit;

pub fn execute(args: CheckArgs, color: bool) -> Result<()> {
    let path = manifest_path(args.manifest);
    let context = build_context(&args.context)?;

    let outcome = load_declarations(&path)?;
    for conflict in &outcome.conflicts {
        // Duplicate declarations get the rich report with both
        // declarations rendered; anything else the plain diagnostic.
        match conflict.to_report() {
            Some(report) => eprintln!("{:?}", miette::Report::new(report)),
            None => emit(&conflict.to_diagnostic(), color),
        }
    }

    let report = resolve_all(&outcome.store, &context);

    println!("context: {}", report.context);
    for status in &report.statuses {
        println!("{}", status.summary());
        if let Ok(resolved) = &status.outcome {
            for warning in resolved.warnings() {
                emit(&warning, color);
            }
        }
    }

    let failures = report.failure_count();
    if failures > 0 || !outcome.is_clean() {
        anyhow::bail!(
            "{} of {} targets failed, {} declaration conflicts",
            failures,
            report.statuses.len(),
            outcome.conflicts.len()
        );
    }

    println!("all {} targets resolved", report.statuses.len());
    Ok(())
}
