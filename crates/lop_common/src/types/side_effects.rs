/// Tri-state side-effect verdict for a module.
///
/// `Analyzed` comes from looking at the module's own statements,
/// `UserDefined` from the resolver/plugin pipeline (e.g. package.json
/// `sideEffects`), and `NoTreeshake` forces the module to be emitted whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSideEffects {
  Analyzed(bool),
  UserDefined(bool),
  NoTreeshake,
}

impl ModuleSideEffects {
  pub fn has_side_effects(&self) -> bool {
    match self {
      Self::Analyzed(v) | Self::UserDefined(v) => *v,
      Self::NoTreeshake => true,
    }
  }

  pub fn is_no_treeshake(&self) -> bool {
    matches!(self, Self::NoTreeshake)
  }
}

impl Default for ModuleSideEffects {
  fn default() -> Self {
    Self::Analyzed(false)
  }
}
