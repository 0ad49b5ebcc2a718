//! Target resolution - from a (target, context) pair to an ordered closure.
//!
//! Resolution seeds the required set with the target's extra modules, then
//! walks public and private edges depth-first with three-color marking.
//! Postorder emission yields dependency order (a module appears only after
//! everything it depends on); an in-progress node reached again is a cycle,
//! reported with the path from that node back to itself.
//!
//! The store is read-only here, so independent (target, context) pairs
//! resolve in parallel with no locking.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::Serialize;

use crate::core::context::BuildContext;
use crate::core::declaration::PluginDisableRule;
use crate::core::store::DeclarationStore;
use crate::resolver::errors::ResolveError;
use crate::resolver::graph::ModuleGraph;
use crate::util::diagnostic::Diagnostic;
use crate::util::Name;

/// A disabled plugin that is still a structural dependency of the closure.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanedPlugin {
    /// The disabled plugin
    pub plugin: Name,
    /// Closure modules that still depend on it
    pub dependents: Vec<Name>,
}

/// The resolved closure for one (target, context) pair.
///
/// Cheap, stateless, and discardable; built fresh per query and never
/// shared or mutated concurrently.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedGraph {
    /// Target this closure was resolved for
    pub target: Name,

    /// Context it was resolved under
    pub context: BuildContext,

    /// Full closure in dependency order, leaves first
    pub modules: Vec<Name>,

    /// Closure minus disabled plugins, order preserved
    pub enabled: Vec<Name>,

    /// Plugins disabled by the target's rules under this context
    pub disabled_plugins: Vec<Name>,

    /// Dynamically-loaded references of closure modules (not resolved,
    /// not ordered, not cycle-checked)
    pub dynamic: Vec<Name>,

    /// Disabled plugins the closure still structurally requires
    pub orphaned: Vec<OrphanedPlugin>,
}

impl ResolvedGraph {
    /// Warning diagnostics for this closure (currently only orphaned
    /// plugins; never fatal).
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.orphaned
            .iter()
            .map(|orphan| {
                let dependents: Vec<&str> =
                    orphan.dependents.iter().map(|n| n.as_str()).collect();
                Diagnostic::warning(format!(
                    "plugin `{}` is disabled for `{}` but still a structural dependency",
                    orphan.plugin, self.target
                ))
                .with_context(format!("required by: {}", dependents.join(", ")))
                .with_context(format!("under {}", self.context))
                .with_suggestion(
                    "Remove the dependency edges or drop the disable rule".to_string(),
                )
            })
            .collect()
    }
}

/// Three-color DFS marking.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolves targets against an immutable declaration store.
pub struct Resolver<'a> {
    store: &'a DeclarationStore,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a fully-populated store.
    pub fn new(store: &'a DeclarationStore) -> Self {
        Resolver { store }
    }

    /// Resolve one target under one context.
    pub fn resolve(
        &self,
        target: Name,
        context: &BuildContext,
    ) -> Result<ResolvedGraph, ResolveError> {
        let graph = ModuleGraph::build(self.store, context)?;
        self.resolve_with(&graph, target)
    }

    /// Resolve one target against an already-built graph.
    ///
    /// Useful when many targets are resolved under the same context and the
    /// graph build should be paid once.
    pub fn resolve_with(
        &self,
        graph: &ModuleGraph,
        target: Name,
    ) -> Result<ResolvedGraph, ResolveError> {
        let context = graph.context();
        let decl = self
            .store
            .target(target)
            .map_err(|_| ResolveError::UnknownTarget {
                target,
                context: context.clone(),
            })?;

        // Depth-first postorder over the seeds, in declaration order.
        let mut marks: HashMap<Name, Mark> = HashMap::new();
        let mut stack: Vec<Name> = Vec::new();
        let mut order: Vec<Name> = Vec::new();

        for &seed in &decl.extra_modules {
            if !graph.is_declared(seed) {
                return Err(ResolveError::MissingModule {
                    module: seed,
                    required_by: target,
                    target,
                    context: context.clone(),
                });
            }
            visit(graph, seed, target, &mut marks, &mut stack, &mut order)?;
        }

        let disabled = self.disabled_plugins(decl, context)?;

        let enabled: Vec<Name> = order
            .iter()
            .copied()
            .filter(|m| !disabled.contains(m))
            .collect();

        // A disabled plugin that the closure still requires is surfaced as
        // a warning, not a failure; the graph used for ordering keeps it.
        let orphaned: Vec<OrphanedPlugin> = disabled
            .iter()
            .copied()
            .filter(|plugin| order.contains(plugin))
            .map(|plugin| OrphanedPlugin {
                plugin,
                dependents: graph
                    .dependents(plugin)
                    .into_iter()
                    .filter(|d| order.contains(d))
                    .collect(),
            })
            .collect();

        let mut dynamic: Vec<Name> = Vec::new();
        for &module in &order {
            for &dep in graph.dynamic_deps(module) {
                if !dynamic.contains(&dep) {
                    dynamic.push(dep);
                }
            }
        }

        tracing::debug!(
            "resolved `{}` under {}: {} modules, {} disabled",
            target,
            context,
            order.len(),
            disabled.len()
        );

        Ok(ResolvedGraph {
            target,
            context: context.clone(),
            modules: order,
            enabled,
            disabled_plugins: disabled,
            dynamic,
            orphaned,
        })
    }

    /// Resolve every registered target under one context.
    ///
    /// Each target resolves in isolation; one failure never blocks the
    /// others. The graph is built once and shared read-only across the
    /// parallel queries.
    pub fn resolve_all(
        &self,
        context: &BuildContext,
    ) -> BTreeMap<Name, Result<ResolvedGraph, ResolveError>> {
        let targets: Vec<Name> = self.store.targets().map(|t| t.name).collect();

        let graph = match ModuleGraph::build(self.store, context) {
            Ok(graph) => graph,
            Err(err) => {
                // A malformed declaration poisons the whole context; report
                // it for every target rather than silently skipping.
                return targets
                    .into_iter()
                    .map(|name| (name, Err(err.clone())))
                    .collect();
            }
        };

        targets
            .into_par_iter()
            .map(|name| (name, self.resolve_with(&graph, name)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    /// Evaluate the target's plugin-disable rules, in declaration order.
    fn disabled_plugins(
        &self,
        decl: &crate::core::declaration::TargetDeclaration,
        context: &BuildContext,
    ) -> Result<Vec<Name>, ResolveError> {
        let mut disabled: Vec<Name> = Vec::new();
        for rule in &decl.disable_plugins {
            let PluginDisableRule { when, plugins } = rule;
            if let Err(primitive) = when.validate() {
                return Err(ResolveError::UnknownPredicate {
                    primitive,
                    declared_by: decl.name,
                    context: context.clone(),
                });
            }
            if !when.evaluate(context) {
                continue;
            }
            for &plugin in plugins {
                if !disabled.contains(&plugin) {
                    disabled.push(plugin);
                }
            }
        }
        Ok(disabled)
    }
}

/// Three-color depth-first visit emitting postorder.
fn visit(
    graph: &ModuleGraph,
    module: Name,
    target: Name,
    marks: &mut HashMap<Name, Mark>,
    stack: &mut Vec<Name>,
    order: &mut Vec<Name>,
) -> Result<(), ResolveError> {
    match marks.get(&module) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            // Reached an in-progress node: the traversal stack from its
            // first occurrence back to here is the minimal cycle path.
            let pos = stack.iter().position(|&m| m == module).unwrap_or(0);
            let mut cycle: Vec<Name> = stack[pos..].to_vec();
            cycle.push(module);
            return Err(ResolveError::CyclicDependency {
                cycle,
                target,
                context: graph.context().clone(),
            });
        }
        None => {}
    }

    marks.insert(module, Mark::InProgress);
    stack.push(module);

    for (dep, _visibility) in graph.deps(module) {
        if !graph.is_declared(dep) {
            return Err(ResolveError::MissingModule {
                module: dep,
                required_by: module,
                target,
                context: graph.context().clone(),
            });
        }
        visit(graph, dep, target, marks, stack, order)?;
    }

    stack.pop();
    marks.insert(module, Mark::Done);
    order.push(module);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{Configuration, PlatformId};
    use crate::core::declaration::{
        ConditionalRule, ModuleDeclaration, ModuleKind, TargetDeclaration, TargetType, Visibility,
    };
    use crate::core::predicate::Predicate;

    fn ctx() -> BuildContext {
        BuildContext::new(PlatformId::Linux, Configuration::Development)
    }

    fn sample_store() -> DeclarationStore {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("Core"))
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("Engine").public_deps(["Core"]))
            .unwrap();
        store
            .register_module(
                ModuleDeclaration::new("SecretIdentity").public_deps(["Core", "Engine"]),
            )
            .unwrap();
        store
            .register_target(
                TargetDeclaration::new("SecretIdentity", TargetType::Game)
                    .extra_modules(["SecretIdentity"]),
            )
            .unwrap();
        store
    }

    fn position(order: &[Name], name: &str) -> usize {
        order
            .iter()
            .position(|m| m.as_str() == name)
            .unwrap_or_else(|| panic!("`{}` not in order {:?}", name, order))
    }

    #[test]
    fn test_dependency_order() {
        let store = sample_store();
        let resolved = Resolver::new(&store)
            .resolve(Name::new("SecretIdentity"), &ctx())
            .unwrap();

        let core = position(&resolved.modules, "Core");
        let engine = position(&resolved.modules, "Engine");
        let game = position(&resolved.modules, "SecretIdentity");
        assert!(core < game);
        assert!(engine < game);
        assert!(core < engine);
        assert_eq!(resolved.modules.len(), 3);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let store = sample_store();
        let resolver = Resolver::new(&store);
        let a = resolver.resolve(Name::new("SecretIdentity"), &ctx()).unwrap();
        let b = resolver.resolve(Name::new("SecretIdentity"), &ctx()).unwrap();
        assert_eq!(a.modules, b.modules);
        assert_eq!(a.enabled, b.enabled);
    }

    #[test]
    fn test_unknown_target() {
        let store = sample_store();
        let err = Resolver::new(&store)
            .resolve(Name::new("NoSuchTarget"), &ctx())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownTarget { .. }));
    }

    #[test]
    fn test_missing_seed_module() {
        let mut store = DeclarationStore::new();
        store
            .register_target(
                TargetDeclaration::new("Ghost", TargetType::Program).extra_modules(["Phantom"]),
            )
            .unwrap();

        let err = Resolver::new(&store)
            .resolve(Name::new("Ghost"), &ctx())
            .unwrap_err();
        match err {
            ResolveError::MissingModule {
                module, required_by, ..
            } => {
                assert_eq!(module.as_str(), "Phantom");
                assert_eq!(required_by.as_str(), "Ghost");
            }
            other => panic!("expected MissingModule, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_transitive_module() {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("App").public_deps(["Vanished"]))
            .unwrap();
        store
            .register_target(
                TargetDeclaration::new("App", TargetType::Game).extra_modules(["App"]),
            )
            .unwrap();

        let err = Resolver::new(&store)
            .resolve(Name::new("App"), &ctx())
            .unwrap_err();
        match err {
            ResolveError::MissingModule {
                module, required_by, ..
            } => {
                assert_eq!(module.as_str(), "Vanished");
                assert_eq!(required_by.as_str(), "App");
            }
            other => panic!("expected MissingModule, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_detection_names_both_modules() {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("A").public_deps(["B"]))
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("B").public_deps(["A"]))
            .unwrap();
        store
            .register_target(TargetDeclaration::new("T", TargetType::Game).extra_modules(["A"]))
            .unwrap();

        let err = Resolver::new(&store)
            .resolve(Name::new("T"), &ctx())
            .unwrap_err();
        match err {
            ResolveError::CyclicDependency { cycle, .. } => {
                let names: Vec<&str> = cycle.iter().map(|n| n.as_str()).collect();
                assert!(names.contains(&"A"));
                assert!(names.contains(&"B"));
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_conditionally_removed_edge_breaks_cycle() {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("A").public_deps(["B"]))
            .unwrap();
        store
            .register_module(
                ModuleDeclaration::new("B")
                    .public_deps(["A"])
                    .rule(ConditionalRule {
                        when: Predicate::Configuration(Configuration::Shipping),
                        add: vec![],
                        remove: vec![Name::new("A")],
                        visibility: Visibility::Private,
                    }),
            )
            .unwrap();
        store
            .register_target(TargetDeclaration::new("T", TargetType::Game).extra_modules(["A"]))
            .unwrap();

        let resolver = Resolver::new(&store);

        // Development: the cycle exists.
        assert!(matches!(
            resolver.resolve(Name::new("T"), &ctx()),
            Err(ResolveError::CyclicDependency { .. })
        ));

        // Shipping: the removed edge breaks it.
        let shipping = BuildContext::new(PlatformId::Linux, Configuration::Shipping);
        let resolved = resolver.resolve(Name::new("T"), &shipping).unwrap();
        assert!(position(&resolved.modules, "B") < position(&resolved.modules, "A"));
    }

    #[test]
    fn test_dynamic_deps_never_resolved_or_ordered() {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("A").dynamic_deps(["B"]))
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("B").dynamic_deps(["A"]))
            .unwrap();
        store
            .register_target(TargetDeclaration::new("T", TargetType::Game).extra_modules(["A"]))
            .unwrap();

        // A dynamic "cycle" is not a cycle, and B never joins the closure.
        let resolved = Resolver::new(&store)
            .resolve(Name::new("T"), &ctx())
            .unwrap();
        assert_eq!(resolved.modules, vec![Name::new("A")]);
        assert_eq!(resolved.dynamic, vec![Name::new("B")]);
    }

    #[test]
    fn test_editor_only_private_dependency() {
        // CitySampleEditor privately depends on MetasoundEditor only in
        // editor builds.
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("MetasoundEditor"))
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("CitySampleEditor").rule(ConditionalRule {
                when: Predicate::Editor(true),
                add: vec![Name::new("MetasoundEditor")],
                remove: vec![],
                visibility: Visibility::Private,
            }))
            .unwrap();
        store
            .register_target(
                TargetDeclaration::new("EditorTarget", TargetType::Editor)
                    .extra_modules(["CitySampleEditor"]),
            )
            .unwrap();

        let resolver = Resolver::new(&store);

        let game = resolver.resolve(Name::new("EditorTarget"), &ctx()).unwrap();
        assert!(!game.modules.iter().any(|m| m.as_str() == "MetasoundEditor"));

        let editor = resolver
            .resolve(Name::new("EditorTarget"), &ctx().with_editor(true))
            .unwrap();
        assert!(editor.modules.iter().any(|m| m.as_str() == "MetasoundEditor"));
    }

    #[test]
    fn test_disabled_plugin_subtracted_but_ordered() {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("Core"))
            .unwrap();
        store
            .register_module(
                ModuleDeclaration::new("Text3D")
                    .kind(ModuleKind::Plugin)
                    .public_deps(["Core"]),
            )
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("Hud").public_deps(["Text3D"]))
            .unwrap();
        store
            .register_target(
                TargetDeclaration::new("EditorTarget", TargetType::Editor)
                    .extra_modules(["Hud"])
                    .disable_rule(crate::core::declaration::PluginDisableRule {
                        when: Predicate::parse("all(editor, platform(linux), sanitizer(thread))")
                            .unwrap(),
                        plugins: vec![Name::new("Text3D")],
                    }),
            )
            .unwrap();

        let tsan_ctx = ctx().with_editor(true).with_sanitizer("thread");
        let resolved = Resolver::new(&store)
            .resolve(Name::new("EditorTarget"), &tsan_ctx)
            .unwrap();

        // Still ordered (structural dependency), but not enabled.
        assert!(resolved.modules.iter().any(|m| m.as_str() == "Text3D"));
        assert!(!resolved.enabled.iter().any(|m| m.as_str() == "Text3D"));
        assert_eq!(resolved.disabled_plugins, vec![Name::new("Text3D")]);

        // And surfaced as an orphan warning naming the dependent.
        assert_eq!(resolved.orphaned.len(), 1);
        assert_eq!(resolved.orphaned[0].plugin.as_str(), "Text3D");
        assert!(resolved.orphaned[0]
            .dependents
            .iter()
            .any(|d| d.as_str() == "Hud"));
        assert!(!resolved.warnings().is_empty());

        // Without the sanitizer the rule does not fire.
        let plain = Resolver::new(&store)
            .resolve(Name::new("EditorTarget"), &ctx().with_editor(true))
            .unwrap();
        assert!(plain.disabled_plugins.is_empty());
        assert!(plain.enabled.iter().any(|m| m.as_str() == "Text3D"));
    }

    #[test]
    fn test_resolve_all_isolates_failures() {
        let mut store = sample_store();
        store
            .register_target(
                TargetDeclaration::new("Broken", TargetType::Program)
                    .extra_modules(["DoesNotExist"]),
            )
            .unwrap();

        let results = Resolver::new(&store).resolve_all(&ctx());
        assert_eq!(results.len(), 2);
        assert!(results[&Name::new("SecretIdentity")].is_ok());
        assert!(matches!(
            results[&Name::new("Broken")],
            Err(ResolveError::MissingModule { .. })
        ));
    }

    #[test]
    fn test_seed_order_drives_emission_order() {
        let mut store = DeclarationStore::new();
        store
            .register_module(ModuleDeclaration::new("Core"))
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("Game").public_deps(["Core"]))
            .unwrap();
        store
            .register_module(ModuleDeclaration::new("EditorBits").public_deps(["Core"]))
            .unwrap();
        store
            .register_target(
                TargetDeclaration::new("Editor", TargetType::Editor)
                    .extra_modules(["Game", "EditorBits"]),
            )
            .unwrap();

        let resolved = Resolver::new(&store)
            .resolve(Name::new("Editor"), &ctx())
            .unwrap();
        assert_eq!(
            resolved.modules,
            vec![Name::new("Core"), Name::new("Game"), Name::new("EditorBits")]
        );
    }
}
