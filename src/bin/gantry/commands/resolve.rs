//! `gantry resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use crate::commands::{build_context, manifest_path};
use gantry::ops::load::load_declarations;
use gantry::ops::resolve::resolve_target;
use gantry::util::diagnostic::emit;

pub fn execute(args: ResolveArgs, color: bool) -> Result<()> {
    let path = manifest_path(args.manifest);
    let context = build_context(&args.context)?;

    let outcome = load_declarations(&path)?;
    for conflict in &outcome.conflicts {
        emit(&conflict.to_diagnostic(), color);
    }

    let resolved = match resolve_target(&outcome.store, &args.target, &context) {
        Ok(resolved) => resolved,
        Err(err) => {
            emit(&err.to_diagnostic(), color);
            anyhow::bail!("failed to resolve `{}`", args.target);
        }
    };

    for warning in resolved.warnings() {
        emit(&warning, color);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    println!("target {} under {}", resolved.target, resolved.context);
    for module in &resolved.modules {
        let marker = if resolved.disabled_plugins.contains(module) {
            "  (disabled)"
        } else {
            ""
        };
        println!("  {}{}", module, marker);
    }
    if !resolved.dynamic.is_empty() {
        let dynamic: Vec<&str> = resolved.dynamic.iter().map(|n| n.as_str()).collect();
        println!("dynamic: {}", dynamic.join(", "));
    }

    Ok(())
}
