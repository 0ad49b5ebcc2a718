//! Declaration loading operations.
//!
//! Loading is conflict-tolerant: a duplicate declaration aborts only that
//! one registration, collects a diagnostic, and the rest of the file still
//! loads. Structural parse failures (bad TOML, malformed predicates) abort
//! the whole load since nothing sensible can be registered from them.

use std::path::Path;

use anyhow::Result;

use crate::core::manifest::DeclarationSet;
use crate::core::store::{DeclarationStore, StoreError};

/// A populated store plus the conflicts encountered while filling it.
pub struct LoadOutcome {
    pub store: DeclarationStore,
    pub conflicts: Vec<StoreError>,
}

impl LoadOutcome {
    /// Check whether every declaration registered cleanly.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Load declarations from a file into a fresh store.
pub fn load_declarations(path: &Path) -> Result<LoadOutcome> {
    let set = DeclarationSet::load(path)?;
    register_set(&set)
}

/// Load declarations from TOML text into a fresh store.
pub fn load_declarations_str(text: &str) -> Result<LoadOutcome> {
    let set = DeclarationSet::from_toml_str(text)?;
    register_set(&set)
}

/// Register a parsed declaration set, collecting conflicts.
pub fn register_set(set: &DeclarationSet) -> Result<LoadOutcome> {
    let mut store = DeclarationStore::new();
    let mut conflicts = Vec::new();

    for spec in &set.modules {
        let decl = spec.to_declaration()?;
        if let Err(err) = store.register_module(decl) {
            tracing::warn!("skipping declaration: {}", err);
            conflicts.push(err);
        }
    }

    for spec in &set.targets {
        let decl = spec.to_declaration()?;
        if let Err(err) = store.register_target(decl) {
            tracing::warn!("skipping declaration: {}", err);
            conflicts.push(err);
        }
    }

    tracing::info!(
        "loaded {} modules, {} targets ({} conflicts)",
        store.module_count(),
        store.target_count(),
        conflicts.len()
    );

    Ok(LoadOutcome { store, conflicts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_continues_past_conflict() {
        let outcome = load_declarations_str(
            r#"
            [[module]]
            name = "Core"

            [[module]]
            name = "Core"
            public_deps = ["Json"]

            [[module]]
            name = "Engine"
            public_deps = ["Core"]
            "#,
        )
        .unwrap();

        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.store.module_count(), 2);
        assert!(outcome.store.has_module(crate::util::Name::new("Engine")));
    }

    #[test]
    fn test_clean_load() {
        let outcome = load_declarations_str(
            r#"
            [[module]]
            name = "Core"

            [[target]]
            name = "Game"
            type = "game"
            extra_modules = ["Core"]
            "#,
        )
        .unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.store.target_count(), 1);
    }

    #[test]
    fn test_bad_toml_aborts_load() {
        assert!(load_declarations_str("[[module]\nname = ").is_err());
    }
}
