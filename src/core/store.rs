//! Declaration store - the build-once, read-many registry.
//!
//! All discovered declarations are registered at process start; after that
//! the store is treated as immutable. There is no removal operation.
//! Registration is append-only and conflict-checked: the same name may be
//! registered twice only if the content is identical (idempotent) or the
//! newcomer is an explicit override.

use std::collections::HashMap;

use thiserror::Error;

use crate::core::declaration::{ModuleDeclaration, TargetDeclaration};
use crate::util::diagnostic::{suggestions, Diagnostic, DuplicateDeclarationError};
use crate::util::Name;

/// Error from store registration or lookup.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("conflicting declarations for module `{name}`")]
    DuplicateModule {
        name: Name,
        existing: Box<ModuleDeclaration>,
        incoming: Box<ModuleDeclaration>,
    },

    #[error("conflicting declarations for target `{name}`")]
    DuplicateTarget {
        name: Name,
        existing: Box<TargetDeclaration>,
        incoming: Box<TargetDeclaration>,
    },

    #[error("no module named `{name}` is registered")]
    ModuleNotFound { name: Name },

    #[error("no target named `{name}` is registered")]
    TargetNotFound { name: Name },
}

impl StoreError {
    /// Convert to a user-facing diagnostic. Conflicts carry both
    /// declarations verbatim so the author can diff them directly.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            StoreError::DuplicateModule {
                name,
                existing,
                incoming,
            } => Diagnostic::error(format!("conflicting declarations for module `{}`", name))
                .with_context(format!("first declaration: {:?}", existing))
                .with_context(format!("second declaration: {:?}", incoming))
                .with_suggestion(
                    "Mark the later declaration with `override = true` if it should win"
                        .to_string(),
                )
                .with_suggestion("Remove one of the declarations".to_string()),

            StoreError::DuplicateTarget {
                name,
                existing,
                incoming,
            } => Diagnostic::error(format!("conflicting declarations for target `{}`", name))
                .with_context(format!("first declaration: {:?}", existing))
                .with_context(format!("second declaration: {:?}", incoming))
                .with_suggestion(
                    "Mark the later declaration with `override = true` if it should win"
                        .to_string(),
                )
                .with_suggestion("Remove one of the declarations".to_string()),

            StoreError::ModuleNotFound { name } => {
                Diagnostic::error(format!("no module named `{}` is registered", name))
                    .with_suggestion(suggestions::MISSING_MODULE.to_string())
            }

            StoreError::TargetNotFound { name } => {
                Diagnostic::error(format!("no target named `{}` is registered", name))
                    .with_suggestion(suggestions::TARGET_NOT_FOUND.to_string())
            }
        }
    }

    /// Render a duplicate-name conflict as a rich report, with both
    /// declarations verbatim. `None` for lookup failures.
    pub fn to_report(&self) -> Option<DuplicateDeclarationError> {
        match self {
            StoreError::DuplicateModule {
                name,
                existing,
                incoming,
            } => Some(DuplicateDeclarationError {
                name: name.to_string(),
                existing: format!("{:#?}", existing),
                incoming: format!("{:#?}", incoming),
            }),
            StoreError::DuplicateTarget {
                name,
                existing,
                incoming,
            } => Some(DuplicateDeclarationError {
                name: name.to_string(),
                existing: format!("{:#?}", existing),
                incoming: format!("{:#?}", incoming),
            }),
            _ => None,
        }
    }
}

/// The registry of all module and target declarations.
#[derive(Debug, Default, Clone)]
pub struct DeclarationStore {
    modules: HashMap<Name, ModuleDeclaration>,
    targets: HashMap<Name, TargetDeclaration>,

    /// Registration order, for deterministic iteration
    module_order: Vec<Name>,
    target_order: Vec<Name>,
}

impl DeclarationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module declaration.
    ///
    /// Identical re-registration is accepted silently. Differing content
    /// under the same name fails with `DuplicateModule` unless the incoming
    /// declaration is an explicit override, which replaces the old one.
    pub fn register_module(&mut self, decl: ModuleDeclaration) -> Result<(), StoreError> {
        if let Some(existing) = self.modules.get(&decl.name) {
            if *existing == decl {
                return Ok(());
            }
            if !decl.is_override {
                return Err(StoreError::DuplicateModule {
                    name: decl.name,
                    existing: Box::new(existing.clone()),
                    incoming: Box::new(decl),
                });
            }
            tracing::debug!("module `{}` replaced by explicit override", decl.name);
            self.modules.insert(decl.name, decl);
            return Ok(());
        }

        self.module_order.push(decl.name);
        self.modules.insert(decl.name, decl);
        Ok(())
    }

    /// Register a target declaration. Same conflict rules as modules.
    pub fn register_target(&mut self, decl: TargetDeclaration) -> Result<(), StoreError> {
        if let Some(existing) = self.targets.get(&decl.name) {
            if *existing == decl {
                return Ok(());
            }
            if !decl.is_override {
                return Err(StoreError::DuplicateTarget {
                    name: decl.name,
                    existing: Box::new(existing.clone()),
                    incoming: Box::new(decl),
                });
            }
            tracing::debug!("target `{}` replaced by explicit override", decl.name);
            self.targets.insert(decl.name, decl);
            return Ok(());
        }

        self.target_order.push(decl.name);
        self.targets.insert(decl.name, decl);
        Ok(())
    }

    /// Look up a module declaration.
    pub fn module(&self, name: Name) -> Result<&ModuleDeclaration, StoreError> {
        self.modules
            .get(&name)
            .ok_or(StoreError::ModuleNotFound { name })
    }

    /// Look up a target declaration.
    pub fn target(&self, name: Name) -> Result<&TargetDeclaration, StoreError> {
        self.targets
            .get(&name)
            .ok_or(StoreError::TargetNotFound { name })
    }

    /// Check if a module is declared.
    pub fn has_module(&self, name: Name) -> bool {
        self.modules.contains_key(&name)
    }

    /// Iterate modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDeclaration> {
        self.module_order.iter().map(|name| &self.modules[name])
    }

    /// Iterate targets in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetDeclaration> {
        self.target_order.iter().map(|name| &self.targets[name])
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Number of registered targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
