//! Batch resolution operations.
//!
//! Tooling that drives the resolver usually wants every target's status in
//! one pass: a table of per-target success or failure, with failures kept
//! as typed errors rather than flattened into strings.

use crate::core::context::BuildContext;
use crate::core::store::DeclarationStore;
use crate::resolver::{ResolveError, ResolvedGraph, Resolver};
use crate::util::Name;

/// Per-target outcome of a batch resolution.
pub struct TargetStatus {
    pub target: Name,
    pub outcome: Result<ResolvedGraph, ResolveError>,
}

impl TargetStatus {
    /// One-line summary for the status table.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Ok(resolved) => {
                let mut line = format!(
                    "ok    {}  ({} modules",
                    self.target,
                    resolved.modules.len()
                );
                if !resolved.disabled_plugins.is_empty() {
                    line.push_str(&format!(
                        ", {} disabled plugins",
                        resolved.disabled_plugins.len()
                    ));
                }
                line.push(')');
                line
            }
            Err(err) => format!("FAIL  {}  ({})", self.target, err),
        }
    }
}

/// Result of resolving every target under one context.
pub struct ResolutionReport {
    pub context: BuildContext,
    pub statuses: Vec<TargetStatus>,
}

impl ResolutionReport {
    /// Check whether every target resolved.
    pub fn all_ok(&self) -> bool {
        self.statuses.iter().all(|s| s.outcome.is_ok())
    }

    /// Number of failed targets.
    pub fn failure_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.outcome.is_err()).count()
    }
}

/// Resolve every registered target under one context.
///
/// Targets are resolved in isolation; one failure never blocks the rest.
/// Statuses are reported in name order.
pub fn resolve_all(store: &DeclarationStore, context: &BuildContext) -> ResolutionReport {
    let resolver = Resolver::new(store);
    let results = resolver.resolve_all(context);

    let statuses = results
        .into_iter()
        .map(|(target, outcome)| TargetStatus { target, outcome })
        .collect();

    ResolutionReport {
        context: context.clone(),
        statuses,
    }
}

/// Resolve a single target under one context.
pub fn resolve_target(
    store: &DeclarationStore,
    target: &str,
    context: &BuildContext,
) -> Result<ResolvedGraph, ResolveError> {
    Resolver::new(store).resolve(Name::new(target), context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{Configuration, PlatformId};
    use crate::ops::load::load_declarations_str;

    const DECLS: &str = r#"
        [[module]]
        name = "Core"

        [[module]]
        name = "Engine"
        public_deps = ["Core"]

        [[target]]
        name = "Game"
        type = "game"
        extra_modules = ["Engine"]

        [[target]]
        name = "Broken"
        type = "program"
        extra_modules = ["Nonexistent"]
    "#;

    fn ctx() -> BuildContext {
        BuildContext::new(PlatformId::Win64, Configuration::Development)
    }

    #[test]
    fn test_report_isolates_failures() {
        let outcome = load_declarations_str(DECLS).unwrap();
        let report = resolve_all(&outcome.store, &ctx());

        assert_eq!(report.statuses.len(), 2);
        assert!(!report.all_ok());
        assert_eq!(report.failure_count(), 1);

        // Name order: Broken before Game.
        assert_eq!(report.statuses[0].target.as_str(), "Broken");
        assert!(report.statuses[0].outcome.is_err());
        assert!(report.statuses[1].outcome.is_ok());
    }

    #[test]
    fn test_summaries() {
        let outcome = load_declarations_str(DECLS).unwrap();
        let report = resolve_all(&outcome.store, &ctx());

        assert!(report.statuses[0].summary().starts_with("FAIL  Broken"));
        assert!(report.statuses[1].summary().starts_with("ok    Game"));
        assert!(report.statuses[1].summary().contains("2 modules"));
    }

    #[test]
    fn test_resolve_target_by_str() {
        let outcome = load_declarations_str(DECLS).unwrap();
        let resolved = resolve_target(&outcome.store, "Game", &ctx()).unwrap();
        assert_eq!(resolved.modules.len(), 2);
    }
}
