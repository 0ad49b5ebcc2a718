//! Core data structures for gantry.
//!
//! This module contains the foundational types used throughout gantry:
//! - Build contexts (platform, configuration, flags)
//! - Conditional rule predicates
//! - Module and target declarations
//! - The declaration store and the Modules.toml schema

pub mod context;
pub mod declaration;
pub mod manifest;
pub mod predicate;
pub mod store;

pub use context::{BuildContext, BuildEnvironment, Configuration, PlatformGroup, PlatformId};
pub use declaration::{
    ConditionalRule, ModuleDeclaration, ModuleKind, PluginDisableRule, SettingsVersion,
    TargetDeclaration, TargetType, Visibility,
};
pub use manifest::{DeclarationSet, MANIFEST_NAME};
pub use predicate::Predicate;
pub use store::{DeclarationStore, StoreError};
