//! Module and target declarations.
//!
//! These are the already-parsed records the resolver consumes: what a
//! configuration author wrote, with no build context applied yet. A
//! declaration never changes after registration; everything
//! context-dependent happens in the graph builder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::predicate::Predicate;
use crate::util::Name;

/// Whether a dependency edge re-exports to the dependent's own dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Transitively visible to dependents
    Public,
    /// Required for compilation, not re-exposed
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// What kind of compilation unit a module is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Always-linked game or engine code
    Runtime,
    /// Optional plugin that targets may disable
    Plugin,
}

impl Default for ModuleKind {
    fn default() -> Self {
        ModuleKind::Runtime
    }
}

/// A conditional add/remove rule on a module's dependency list.
///
/// Rules apply in declaration order; a later rule may re-add or re-remove
/// an edge touched by an earlier rule (last writer wins per edge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    /// When the rule applies
    pub when: Predicate,

    /// Edges to add, at the rule's visibility
    pub add: Vec<Name>,

    /// Edges to delete from the accumulated set (absent edges are a no-op)
    pub remove: Vec<Name>,

    /// Visibility of added edges
    pub visibility: Visibility,
}

/// A named compilation unit with declared dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    /// Unique, case-sensitive module name
    pub name: Name,

    /// Runtime module or plugin
    pub kind: ModuleKind,

    /// Unconditional public dependency edges, in declaration order
    pub public_deps: Vec<Name>,

    /// Unconditional private dependency edges, in declaration order
    pub private_deps: Vec<Name>,

    /// Modules loaded lazily at runtime; excluded from the static closure
    /// and from cycle detection
    pub dynamic_deps: Vec<Name>,

    /// Conditional rules, in declaration order
    pub rules: Vec<ConditionalRule>,

    /// Later declaration explicitly replaces an earlier one with this name
    pub is_override: bool,
}

impl ModuleDeclaration {
    /// Create a runtime module with no dependencies.
    pub fn new(name: impl Into<Name>) -> Self {
        ModuleDeclaration {
            name: name.into(),
            kind: ModuleKind::Runtime,
            public_deps: Vec::new(),
            private_deps: Vec::new(),
            dynamic_deps: Vec::new(),
            rules: Vec::new(),
            is_override: false,
        }
    }

    /// Set the module kind.
    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add public dependency edges.
    pub fn public_deps<I, N>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.public_deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add private dependency edges.
    pub fn private_deps<I, N>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.private_deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add dynamically-loaded module references.
    pub fn dynamic_deps<I, N>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.dynamic_deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Append a conditional rule.
    pub fn rule(mut self, rule: ConditionalRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Mark this declaration as an explicit override.
    pub fn overriding(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Check if this is a plugin module.
    pub fn is_plugin(&self) -> bool {
        self.kind == ModuleKind::Plugin
    }
}

/// What kind of buildable product a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Game,
    Editor,
    Program,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Game => write!(f, "game"),
            TargetType::Editor => write!(f, "editor"),
            TargetType::Program => write!(f, "program"),
        }
    }
}

/// Version of the default build settings a target opts into.
///
/// Carried verbatim from the declaration; two declarations for one target
/// name that disagree on this are a conflict, not a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsVersion {
    V4,
    V5,
}

impl Default for SettingsVersion {
    fn default() -> Self {
        SettingsVersion::V5
    }
}

/// A conditional plugin-disable rule on a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDisableRule {
    /// When the rule applies
    pub when: Predicate,

    /// Plugins removed from the enabled set
    pub plugins: Vec<Name>,
}

/// A named buildable product seeded by a set of modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDeclaration {
    /// Unique, case-sensitive target name
    pub name: Name,

    /// Game, editor, or standalone program
    pub target_type: TargetType,

    /// Build settings version the target declares
    pub settings_version: SettingsVersion,

    /// Module names seeding the dependency closure, in declaration order
    pub extra_modules: Vec<Name>,

    /// Conditional plugin-disable rules, in declaration order
    pub disable_plugins: Vec<PluginDisableRule>,

    /// Later declaration explicitly replaces an earlier one with this name
    pub is_override: bool,
}

impl TargetDeclaration {
    /// Create a target with no seed modules.
    pub fn new(name: impl Into<Name>, target_type: TargetType) -> Self {
        TargetDeclaration {
            name: name.into(),
            target_type,
            settings_version: SettingsVersion::default(),
            extra_modules: Vec::new(),
            disable_plugins: Vec::new(),
            is_override: false,
        }
    }

    /// Set the settings version.
    pub fn settings_version(mut self, version: SettingsVersion) -> Self {
        self.settings_version = version;
        self
    }

    /// Add seed modules.
    pub fn extra_modules<I, N>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.extra_modules.extend(modules.into_iter().map(Into::into));
        self
    }

    /// Append a plugin-disable rule.
    pub fn disable_rule(mut self, rule: PluginDisableRule) -> Self {
        self.disable_plugins.push(rule);
        self
    }

    /// Mark this declaration as an explicit override.
    pub fn overriding(mut self) -> Self {
        self.is_override = true;
        self
    }
}
