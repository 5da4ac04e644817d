use crate::{ModuleId, ModuleSideEffects, SyntheticNamedExports};

/// What the resolver pipeline hands the core for one import specifier.
#[derive(Debug, Clone)]
pub struct ResolvedId {
  pub id: ModuleId,
  pub is_external: bool,
  pub module_side_effects: ModuleSideEffects,
  pub synthetic_named_exports: SyntheticNamedExports,
}

impl ResolvedId {
  pub fn new(id: impl Into<ModuleId>) -> Self {
    Self {
      id: id.into(),
      is_external: false,
      module_side_effects: ModuleSideEffects::Analyzed(true),
      synthetic_named_exports: SyntheticNamedExports::Disabled,
    }
  }

  pub fn external(id: impl Into<ModuleId>) -> Self {
    Self { is_external: true, ..Self::new(id) }
  }
}
