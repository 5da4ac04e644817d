use lop_utils::rstr::Rstr;

use crate::{ModuleIdx, Specifier};

/// `import { imported as local } from source` recorded under `local`.
/// `module` is filled by the link phase once specifiers are resolved.
#[derive(Debug, Clone)]
pub struct ImportDescription {
  pub source: Rstr,
  pub imported: Specifier,
  pub module: Option<ModuleIdx>,
  /// Offset of the specifier's declaration, for missing-export reporting.
  pub pos: u32,
}

/// `export { local as exported } from source` / `export * as ns from source`
/// recorded under `exported`.
#[derive(Debug, Clone)]
pub struct ReexportDescription {
  pub source: Rstr,
  pub imported: Specifier,
  pub module: Option<ModuleIdx>,
  pub pos: u32,
}

/// A name in a module's `exports` table.
#[derive(Debug, Clone)]
pub enum ExportDescription {
  Binding {
    local_name: Rstr,
    /// `export default foo` keeps the alias it was assigned through.
    identifier: Option<Rstr>,
  },
  /// Placeholder generated when `shim_missing_exports` is on.
  Shim,
}

impl ExportDescription {
  pub fn local_name(&self) -> Option<&Rstr> {
    match self {
      Self::Binding { local_name, .. } => Some(local_name),
      Self::Shim => None,
    }
  }
}
