//! `gantry graph` command

use std::collections::HashSet;

use anyhow::Result;

use crate::cli::GraphArgs;
use crate::commands::{build_context, manifest_path};
use gantry::core::store::DeclarationStore;
use gantry::ops::load::load_declarations;
use gantry::resolver::ModuleGraph;
use gantry::util::Name;

pub fn execute(args: GraphArgs) -> Result<()> {
    let path = manifest_path(args.manifest);
    let context = build_context(&args.context)?;

    let outcome = load_declarations(&path)?;
    let target = outcome
        .store
        .target(Name::new(&args.target))
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .clone();

    let graph = ModuleGraph::build(&outcome.store, &context)
        .map_err(|e| anyhow::anyhow!("{}", e.to_diagnostic()))?;

    println!("{} ({})", target.name, context);

    let max_depth = args.depth.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    for &seed in &target.extra_modules {
        print_tree(&graph, &outcome.store, seed, 1, max_depth, &mut seen);
    }

    Ok(())
}

fn print_tree(
    graph: &ModuleGraph,
    store: &DeclarationStore,
    module: Name,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<Name>,
) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(module);

    let prefix = format!("{}├── ", "│   ".repeat(depth - 1));
    let marker = if !store.has_module(module) {
        " (missing!)"
    } else if is_duplicate {
        " (*)"
    } else {
        ""
    };
    println!("{}{}{}", prefix, module, marker);

    if is_duplicate {
        return;
    }

    for (dep, _visibility) in graph.deps(module) {
        print_tree(graph, store, dep, depth + 1, max_depth, seen);
    }
}
