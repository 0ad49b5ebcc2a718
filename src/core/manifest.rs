//! Modules.toml parsing and schema.
//!
//! The declaration file is the on-disk form of module and target
//! declarations. Predicates are written as strings (`"all(editor,
//! platform(linux))"`) and parsed leniently here; unknown primitives are
//! kept verbatim and rejected later, at graph-build time.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::declaration::{
    ConditionalRule, ModuleDeclaration, ModuleKind, PluginDisableRule, SettingsVersion,
    TargetDeclaration, TargetType, Visibility,
};
use crate::core::predicate::Predicate;
use crate::util::Name;

/// Canonical declaration file name.
pub const MANIFEST_NAME: &str = "Modules.toml";

/// A conditional rule as written in the declaration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Predicate expression, e.g. `"all(editor, platform(linux))"`
    pub when: String,

    /// Module names to add when the predicate holds
    #[serde(default)]
    pub add: Vec<String>,

    /// Module names to remove when the predicate holds
    #[serde(default)]
    pub remove: Vec<String>,

    /// Visibility of added edges (defaults to private, matching how
    /// conditional dependencies are overwhelmingly declared)
    #[serde(default = "default_rule_visibility")]
    pub visibility: Visibility,
}

fn default_rule_visibility() -> Visibility {
    Visibility::Private
}

/// A `[[module]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Module name
    pub name: String,

    /// Module kind (defaults to runtime)
    #[serde(default)]
    pub kind: ModuleKind,

    /// Public dependency names
    #[serde(default)]
    pub public_deps: Vec<String>,

    /// Private dependency names
    #[serde(default)]
    pub private_deps: Vec<String>,

    /// Dynamically-loaded module names
    #[serde(default)]
    pub dynamic_deps: Vec<String>,

    /// Conditional rules
    #[serde(default)]
    pub rules: Vec<RuleSpec>,

    /// Explicitly replace an earlier declaration of the same name
    #[serde(default, rename = "override")]
    pub is_override: bool,
}

/// A plugin-disable rule as written in the declaration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisableSpec {
    /// Predicate expression
    pub when: String,

    /// Plugin names to disable when the predicate holds
    pub plugins: Vec<String>,
}

/// A `[[target]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Target name
    pub name: String,

    /// Target type
    #[serde(rename = "type")]
    pub target_type: TargetType,

    /// Build settings version (defaults to v5)
    #[serde(default)]
    pub settings_version: SettingsVersion,

    /// Seed module names
    #[serde(default)]
    pub extra_modules: Vec<String>,

    /// Conditional plugin-disable rules
    #[serde(default)]
    pub disable_plugins: Vec<DisableSpec>,

    /// Explicitly replace an earlier declaration of the same name
    #[serde(default, rename = "override")]
    pub is_override: bool,
}

/// The parsed declaration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationSet {
    /// Module declarations
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,

    /// Target declarations
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetSpec>,
}

impl DeclarationSet {
    /// Parse a declaration set from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse declaration file")
    }

    /// Load a declaration set from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("in declaration file `{}`", path.display()))
    }
}

impl RuleSpec {
    /// Convert to a typed conditional rule.
    pub fn to_rule(&self) -> Result<ConditionalRule> {
        let when = Predicate::parse(&self.when)
            .with_context(|| format!("in rule predicate `{}`", self.when))?;
        Ok(ConditionalRule {
            when,
            add: self.add.iter().map(Name::new).collect(),
            remove: self.remove.iter().map(Name::new).collect(),
            visibility: self.visibility,
        })
    }
}

impl ModuleSpec {
    /// Convert to a module declaration.
    pub fn to_declaration(&self) -> Result<ModuleDeclaration> {
        let mut decl = ModuleDeclaration::new(self.name.as_str())
            .kind(self.kind)
            .public_deps(self.public_deps.iter())
            .private_deps(self.private_deps.iter())
            .dynamic_deps(self.dynamic_deps.iter());
        for rule in &self.rules {
            decl = decl.rule(
                rule.to_rule()
                    .with_context(|| format!("in module `{}`", self.name))?,
            );
        }
        if self.is_override {
            decl = decl.overriding();
        }
        Ok(decl)
    }
}

impl TargetSpec {
    /// Convert to a target declaration.
    pub fn to_declaration(&self) -> Result<TargetDeclaration> {
        let mut decl = TargetDeclaration::new(self.name.as_str(), self.target_type)
            .settings_version(self.settings_version)
            .extra_modules(self.extra_modules.iter());
        for spec in &self.disable_plugins {
            let when = Predicate::parse(&spec.when).with_context(|| {
                format!("in target `{}` disable rule `{}`", self.name, spec.when)
            })?;
            decl = decl.disable_rule(PluginDisableRule {
                when,
                plugins: spec.plugins.iter().map(Name::new).collect(),
            });
        }
        if self.is_override {
            decl = decl.overriding();
        }
        Ok(decl)
    }
}
