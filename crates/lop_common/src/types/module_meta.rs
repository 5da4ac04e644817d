bitflags::bitflags! {
  #[derive(Debug, Default, Clone, Copy)]
  pub struct ModuleMeta: u8 {
    /// The module is statically reachable and its execution is observable.
    const EXECUTED = 1;
    const HAS_STAR_EXPORT = 1 << 1;
    const HAS_DEFAULT_EXPORT = 1 << 2;
    /// At least one missing export was shimmed for this module.
    const NEEDS_EXPORT_SHIM = 1 << 3;
    const USES_TOP_LEVEL_AWAIT = 1 << 4;
    /// Imported by a module whose side effects are `no-treeshake`.
    const IMPORTED_FROM_NOT_TREESHAKEN = 1 << 5;
  }
}

impl ModuleMeta {
  #[inline]
  pub fn is_executed(&self) -> bool {
    self.contains(Self::EXECUTED)
  }

  #[inline]
  pub fn has_star_export(&self) -> bool {
    self.contains(Self::HAS_STAR_EXPORT)
  }

  #[inline]
  pub fn has_default_export(&self) -> bool {
    self.contains(Self::HAS_DEFAULT_EXPORT)
  }
}
