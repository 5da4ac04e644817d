//! Module-graph tree-shaking core: cross-module binding resolution,
//! monotonic inclusion propagation, and relevant-dependency selection over
//! parsed ECMAScript modules.

mod ast_effects;
mod bind_references;
mod graph;
mod include;
mod module;
mod render;
mod sort_modules;
mod types;
mod variable;

pub use crate::{
  ast_effects::context::{LiteralValue, ObjectPath, PathSegment, PathTracker},
  graph::{Graph, WarningSink},
  module::{exports::ExportLookup, ExternalModule, Module, NormalModule},
  render::RenderedExports,
  types::{ContextParse, IndexModules, ModuleInput},
  variable::{Variable, VariableDb, VariableKind},
};

pub use lop_common::{
  BuildPhase, EntryPoint, EntryPointKind, ModuleId, ModuleIdx, ModuleInfo, ModuleMeta,
  ModuleSideEffects, NormalizedOptions, ResolvedId, SyntheticNamedExports, VariableRef,
};
pub use lop_error::{BuildError, BuildResult, Diagnostic, DiagnosticCode, Severity};
