//! Command implementations

use std::path::PathBuf;

use anyhow::Result;

use gantry::core::context::{BuildContext, BuildEnvironment, Configuration, PlatformId};
use gantry::core::manifest::MANIFEST_NAME;

use crate::cli::ContextArgs;

pub mod check;
pub mod completions;
pub mod graph;
pub mod resolve;

/// Resolve the declaration file path, defaulting to ./Modules.toml.
pub fn manifest_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| PathBuf::from(MANIFEST_NAME))
}

/// Build a BuildContext from the shared CLI flags.
pub fn build_context(args: &ContextArgs) -> Result<BuildContext> {
    let platform = PlatformId::parse(&args.platform)
        .ok_or_else(|| anyhow::anyhow!("unknown platform `{}`", args.platform))?;
    let configuration = Configuration::parse(&args.config)
        .ok_or_else(|| anyhow::anyhow!("unknown configuration `{}`", args.config))?;

    let mut ctx = BuildContext::new(platform, configuration).with_editor(args.editor);
    for sanitizer in &args.sanitizer {
        ctx = ctx.with_sanitizer(sanitizer);
    }
    if args.unique_env {
        ctx = ctx.with_environment(BuildEnvironment::Unique);
    }
    Ok(ctx)
}
