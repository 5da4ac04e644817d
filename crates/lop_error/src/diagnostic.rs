use lop_utils::locate::{code_frame, locate, Location};

/// Stable string codes consumers match on. The set is closed; adding a code
/// is a breaking change for downstream tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
  ParseError,
  MissingExport,
  CircularReexport,
  NamespaceConflict,
  AmbiguousExternalNamespaces,
  ShimmedExport,
  SyntheticNamedExportsNeedNamespaceExport,
  SourcemapError,
}

impl DiagnosticCode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ParseError => "PARSE_ERROR",
      Self::MissingExport => "MISSING_EXPORT",
      Self::CircularReexport => "CIRCULAR_REEXPORT",
      Self::NamespaceConflict => "NAMESPACE_CONFLICT",
      Self::AmbiguousExternalNamespaces => "AMBIGUOUS_EXTERNAL_NAMESPACES",
      Self::ShimmedExport => "SHIMMED_EXPORT",
      Self::SyntheticNamedExportsNeedNamespaceExport => {
        "SYNTHETIC_NAMED_EXPORTS_NEED_NAMESPACE_EXPORT"
      }
      Self::SourcemapError => "SOURCEMAP_ERROR",
    }
  }

  pub fn severity(self) -> Severity {
    match self {
      Self::ParseError
      | Self::MissingExport
      | Self::CircularReexport
      | Self::SyntheticNamedExportsNeedNamespaceExport => Severity::Fatal,
      Self::NamespaceConflict
      | Self::AmbiguousExternalNamespaces
      | Self::ShimmedExport
      | Self::SourcemapError => Severity::Advisory,
    }
  }
}

impl std::fmt::Display for DiagnosticCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  /// Aborts the build.
  Fatal,
  /// Reported through the warning sink, analysis continues.
  Advisory,
}

/// `file` is the id of the module whose source the `line`/`column` refer to,
/// which differs from the diagnostic's `id` when a source-map chain remapped
/// the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
  pub file: String,
  pub line: u32,
  pub column: u32,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Diagnostic {
  pub code: DiagnosticCode,
  pub message: String,
  /// Id of the module the diagnostic originates in, when known.
  pub id: Option<String>,
  /// Byte offset into the module source.
  pub pos: Option<usize>,
  pub loc: Option<ErrorLocation>,
  pub frame: Option<String>,
}

impl Diagnostic {
  pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
    Self { code, message: message.into(), id: None, pos: None, loc: None, frame: None }
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  /// Attach a source position, resolving line/column and the code frame from
  /// `source`. The `loc.file` defaults to the diagnostic's id.
  pub fn with_pos(mut self, source: &str, pos: usize) -> Self {
    let Location { line, column } = locate(source, pos);
    self.pos = Some(pos);
    self.loc =
      Some(ErrorLocation { file: self.id.clone().unwrap_or_default(), line, column });
    self.frame = Some(code_frame(source, pos));
    self
  }

  pub fn severity(&self) -> Severity {
    self.code.severity()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn diagnostic_carries_position_payload() {
    let source = "import { missing } from './dep';\n";
    let diagnostic = Diagnostic::new(DiagnosticCode::MissingExport, "\"missing\" is not exported")
      .with_id("/src/main.js")
      .with_pos(source, 9);

    assert_eq!(diagnostic.code.as_str(), "MISSING_EXPORT");
    assert_eq!(diagnostic.severity(), Severity::Fatal);
    assert_eq!(diagnostic.pos, Some(9));
    let loc = diagnostic.loc.unwrap();
    assert_eq!((loc.line, loc.column), (0, 9));
    assert_eq!(loc.file, "/src/main.js");
    assert!(diagnostic.frame.unwrap().contains('^'));
  }

  #[test]
  fn advisory_codes_stay_advisory() {
    assert_eq!(DiagnosticCode::NamespaceConflict.severity(), Severity::Advisory);
    assert_eq!(DiagnosticCode::ShimmedExport.severity(), Severity::Advisory);
    assert_eq!(DiagnosticCode::SourcemapError.severity(), Severity::Advisory);
    assert_eq!(DiagnosticCode::CircularReexport.severity(), Severity::Fatal);
  }
}
