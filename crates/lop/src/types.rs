use lop_common::{ModuleId, ModuleIdx, ModuleSideEffects, ResolvedId, SyntheticNamedExports};
use lop_ecmascript::{ParseError, Program};
use lop_utils::rstr::Rstr;
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

use crate::module::Module;

pub type IndexModules = IndexVec<ModuleIdx, Module>;

/// Parser hook: the graph owns no parser of its own; the default is
/// `lop_ecmascript::parse`.
pub type ContextParse = fn(&str) -> Result<Program, ParseError>;

/// What the loader/resolver pipeline hands the core per module.
#[derive(Debug)]
pub struct ModuleInput {
  pub id: ModuleId,
  pub code: String,
  /// specifier -> resolution for everything this module imports.
  pub resolved_ids: FxHashMap<Rstr, ResolvedId>,
  pub module_side_effects: ModuleSideEffects,
  pub synthetic_named_exports: SyntheticNamedExports,
  pub is_entry: bool,
}

impl ModuleInput {
  pub fn new(id: impl Into<ModuleId>, code: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      code: code.into(),
      resolved_ids: FxHashMap::default(),
      module_side_effects: ModuleSideEffects::Analyzed(true),
      synthetic_named_exports: SyntheticNamedExports::Disabled,
      is_entry: false,
    }
  }

  pub fn entry(id: impl Into<ModuleId>, code: impl Into<String>) -> Self {
    Self { is_entry: true, ..Self::new(id, code) }
  }

  pub fn with_resolved(mut self, specifier: impl Into<Rstr>, resolved: ResolvedId) -> Self {
    self.resolved_ids.insert(specifier.into(), resolved);
    self
  }

  pub fn with_side_effects(mut self, side_effects: ModuleSideEffects) -> Self {
    self.module_side_effects = side_effects;
    self
  }

  pub fn with_synthetic_named_exports(mut self, synthetic: SyntheticNamedExports) -> Self {
    self.synthetic_named_exports = synthetic;
    self
  }
}
