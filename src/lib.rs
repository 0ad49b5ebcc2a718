//! Gantry - a module and target dependency resolver for game project builds
//!
//! This crate consumes declarative build targets and modules (name, kind,
//! conditional dependency lists) and produces per-build-context dependency
//! closures: an ordered module list plus the enabled-plugin set, with
//! deterministic failure on cycles, conflicts, and missing references.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use crate::core::{
    context::BuildContext, declaration::ModuleDeclaration, declaration::TargetDeclaration,
    manifest::DeclarationSet, store::DeclarationStore,
};

pub use crate::resolver::{ResolveError, ResolvedGraph, Resolver};
pub use crate::util::Name;
