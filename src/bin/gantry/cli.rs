//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Gantry - a module and target dependency resolver for game project builds
#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one target and print its ordered module closure
    Resolve(ResolveArgs),

    /// Load all declarations and resolve every target, reporting a status table
    Check(CheckArgs),

    /// Display the dependency tree of a target
    Graph(GraphArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Build-context flags shared by every resolving command.
#[derive(Args)]
pub struct ContextArgs {
    /// Target platform (win64, linux, linuxarm64, mac, android, ios)
    #[arg(long, default_value = "win64")]
    pub platform: String,

    /// Build configuration (debug, development, test, shipping)
    #[arg(long, default_value = "development")]
    pub config: String,

    /// Resolve as an editor build
    #[arg(long)]
    pub editor: bool,

    /// Enable a sanitizer (repeatable, e.g. --sanitizer thread)
    #[arg(long)]
    pub sanitizer: Vec<String>,

    /// Use a unique (monolithic) build environment
    #[arg(long)]
    pub unique_env: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Target name to resolve
    pub target: String,

    /// Declaration file (defaults to Modules.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Emit the resolved graph as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Declaration file (defaults to Modules.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Target name to display
    pub target: String,

    /// Declaration file (defaults to Modules.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
