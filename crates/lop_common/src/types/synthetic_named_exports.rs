use lop_utils::rstr::Rstr;

/// User-declared synthetic named exports: `false`, `true` (fall back to the
/// `default` export) or the name of the fallback export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyntheticNamedExports {
  #[default]
  Disabled,
  Default,
  Named(Rstr),
}

impl SyntheticNamedExports {
  pub fn is_enabled(&self) -> bool {
    !matches!(self, Self::Disabled)
  }

  /// The export name the synthetic namespace is read from.
  pub fn fallback_export_name(&self) -> Option<Rstr> {
    match self {
      Self::Disabled => None,
      Self::Default => Some("default".into()),
      Self::Named(name) => Some(name.clone()),
    }
  }

  /// Whether `name` IS the fallback export itself, which must never be
  /// served synthetically.
  pub fn matches_name(&self, name: &str) -> bool {
    match self {
      Self::Disabled => false,
      Self::Default => name == "default",
      Self::Named(fallback) => fallback.as_str() == name,
    }
  }
}

impl From<bool> for SyntheticNamedExports {
  fn from(value: bool) -> Self {
    if value { Self::Default } else { Self::Disabled }
  }
}
