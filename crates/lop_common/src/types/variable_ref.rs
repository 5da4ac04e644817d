use oxc_index::Idx;

use crate::{ModuleIdx, VariableIdx};

/// Addresses one variable in the graph-wide variable tables when more than
/// one module is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableRef {
  pub owner: ModuleIdx,
  pub var: VariableIdx,
}

impl Default for VariableRef {
  fn default() -> Self {
    Self { owner: ModuleIdx::from_raw(0), var: VariableIdx::from_raw(0) }
  }
}

impl From<(ModuleIdx, VariableIdx)> for VariableRef {
  fn from(value: (ModuleIdx, VariableIdx)) -> Self {
    Self { owner: value.0, var: value.1 }
  }
}
