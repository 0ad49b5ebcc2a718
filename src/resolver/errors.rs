//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::core::context::BuildContext;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::Name;

/// Error during target resolution.
///
/// Every variant carries the build context it occurred under, so a report
/// from a batch run over many contexts stays attributable.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("unknown target `{target}`")]
    UnknownTarget { target: Name, context: BuildContext },

    #[error("module `{module}` required by `{required_by}` has no declaration")]
    MissingModule {
        module: Name,
        required_by: Name,
        target: Name,
        context: BuildContext,
    },

    #[error("cyclic dependency involving `{}`", cycle.first().map(|n| n.as_str()).unwrap_or("?"))]
    CyclicDependency {
        /// Minimal cycle path; first and last element are the same module
        cycle: Vec<Name>,
        target: Name,
        context: BuildContext,
    },

    #[error("unrecognized predicate `{primitive}` in declaration of `{declared_by}`")]
    UnknownPredicate {
        primitive: String,
        declared_by: Name,
        context: BuildContext,
    },
}

impl ResolveError {
    /// The build context the error occurred under.
    pub fn context(&self) -> &BuildContext {
        match self {
            ResolveError::UnknownTarget { context, .. }
            | ResolveError::MissingModule { context, .. }
            | ResolveError::CyclicDependency { context, .. }
            | ResolveError::UnknownPredicate { context, .. } => context,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnknownTarget { target, context } => {
                Diagnostic::error(format!("unknown target `{}`", target))
                    .with_context(format!("while resolving for {}", context))
                    .with_suggestion(suggestions::TARGET_NOT_FOUND.to_string())
            }

            ResolveError::MissingModule {
                module,
                required_by,
                target,
                context,
            } => Diagnostic::error(format!("module `{}` has no declaration", module))
                .with_context(format!("required by `{}`", required_by))
                .with_context(format!("while resolving `{}` for {}", target, context))
                .with_suggestion(suggestions::MISSING_MODULE.to_string()),

            ResolveError::CyclicDependency {
                cycle,
                target,
                context,
            } => {
                let path: Vec<&str> = cycle.iter().map(|n| n.as_str()).collect();
                Diagnostic::error("cyclic dependency in module graph")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_context(format!("while resolving `{}` for {}", target, context))
                    .with_suggestion(suggestions::CYCLE.to_string())
            }

            ResolveError::UnknownPredicate {
                primitive,
                declared_by,
                context,
            } => Diagnostic::error(format!("unrecognized predicate `{}`", primitive))
                .with_context(format!("in declaration of `{}`", declared_by))
                .with_context(format!("while building the graph for {}", context))
                .with_suggestion(
                    "Known primitives: editor, not-editor, platform(<group>), config(<configuration>), \
                     sanitizer(<name>), env(shared|unique), all(...), any(...), not(...)"
                        .to_string(),
                ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{Configuration, PlatformId};

    fn ctx() -> BuildContext {
        BuildContext::new(PlatformId::Linux, Configuration::Development)
    }

    #[test]
    fn test_cycle_diagnostic_names_the_path() {
        let err = ResolveError::CyclicDependency {
            cycle: vec![
                Name::new("WorldAudio"),
                Name::new("MassTraffic"),
                Name::new("WorldAudio"),
            ],
            target: Name::new("CitySample"),
            context: ctx(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("WorldAudio -> MassTraffic -> WorldAudio"));
        assert!(output.contains("CitySample"));
        assert!(output.contains("linux/development"));
    }

    #[test]
    fn test_missing_module_diagnostic_names_requirer() {
        let err = ResolveError::MissingModule {
            module: Name::new("Soundscape"),
            required_by: Name::new("WorldAudio"),
            target: Name::new("CitySample"),
            context: ctx(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("Soundscape"));
        assert!(output.contains("required by `WorldAudio`"));
    }
}
