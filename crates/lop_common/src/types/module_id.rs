use std::path::Path;

use arcstr::ArcStr;
use sugar_path::SugarPath;

/// Resolved identifier of one module, usually an absolute file path. Ids are
/// handed to the core by the resolver pipeline and never change during
/// analysis; maps throughout the graph are keyed by them.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct ModuleId(ArcStr);

impl ModuleId {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  /// Machine-independent rendition for diagnostics: absolute paths become
  /// slash-separated paths relative to `cwd`; virtual ids and relative
  /// specifiers pass through untouched.
  pub fn stabilize(&self, cwd: &Path) -> String {
    if self.as_path().is_absolute() {
      self.relative(cwd).as_path().to_slash_lossy().into_owned()
    } else {
      self.to_string()
    }
  }
}

impl std::fmt::Display for ModuleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl std::ops::Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    self
  }
}

impl From<ArcStr> for ModuleId {
  fn from(value: ArcStr) -> Self {
    Self::new(value)
  }
}

impl From<&str> for ModuleId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for ModuleId {
  fn from(value: String) -> Self {
    Self::new(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stabilize_relativizes_absolute_paths_only() {
    let cwd = Path::new("/work/app");
    assert_eq!(ModuleId::new("/work/app/src/main.js").stabilize(cwd), "src/main.js");
    assert_eq!(ModuleId::new("./src/main.js").stabilize(cwd), "./src/main.js");
    assert_eq!(ModuleId::new("virtual:env").stabilize(cwd), "virtual:env");
  }
}
