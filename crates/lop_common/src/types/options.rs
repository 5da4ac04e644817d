use std::path::PathBuf;

/// The slice of bundler options the analysis core reads. Normalization from
/// user-facing options happens upstream.
#[derive(Debug, Clone)]
pub struct NormalizedOptions {
  /// Base directory module ids are stabilized against for reporting.
  pub cwd: PathBuf,
  pub treeshake: bool,
  /// Replace missing exports with a per-module shim binding instead of
  /// failing the build.
  pub shim_missing_exports: bool,
}

impl Default for NormalizedOptions {
  fn default() -> Self {
    Self {
      cwd: std::env::current_dir().unwrap_or_default(),
      treeshake: true,
      shim_missing_exports: false,
    }
  }
}
