use arcstr::ArcStr;

use crate::{ModuleId, ModuleSideEffects};

/// Public snapshot of one module the renderer and plugins read. The
/// deprecated `hasModuleSideEffects` alias is gone; consumers read
/// `module_side_effects`.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
  pub id: ModuleId,
  pub code: Option<ArcStr>,
  pub is_entry: bool,
  pub is_included: bool,
  pub has_default_export: bool,
  pub module_side_effects: ModuleSideEffects,
  pub importers: Vec<ModuleId>,
  pub dynamic_importers: Vec<ModuleId>,
  pub imported_ids: Vec<ModuleId>,
  pub dynamically_imported_ids: Vec<ModuleId>,
  pub implicitly_loaded_after_one_of: Vec<ModuleId>,
  pub implicitly_loaded_before: Vec<ModuleId>,
}
