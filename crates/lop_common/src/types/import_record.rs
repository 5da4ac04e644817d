use std::fmt::Debug;

use lop_utils::rstr::Rstr;

use crate::{ModuleIdx, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
  /// Static `import ... from` / `export ... from`.
  Import,
  DynamicImport,
}

impl ImportKind {
  pub fn is_static(&self) -> bool {
    matches!(self, Self::Import)
  }
}

bitflags::bitflags! {
  #[derive(Debug, Clone, Copy)]
  pub struct ImportRecordMeta: u8 {
    /// `import {} from '...'` or `import '...'`
    const IS_PLAIN_IMPORT = 1;
    /// `export * from 'mod'` only
    const IS_EXPORT_STAR = 1 << 1;
  }
}

pub type RawImportRecord = ImportRecord<Span>;
pub type ResolvedImportRecord = ImportRecord<ModuleIdx>;

/// One `import`/`export ... from`/`import()` site. `State` is the request
/// span before resolution and the target module index after; the request
/// span itself survives resolution so call sites stay addressable.
#[derive(Debug)]
pub struct ImportRecord<State: Debug> {
  pub state: State,
  /// `./lib.js` in `import { foo } from './lib.js';`
  pub specifier: Rstr,
  pub kind: ImportKind,
  pub meta: ImportRecordMeta,
  pub span: Span,
}

impl RawImportRecord {
  pub fn new(specifier: Rstr, kind: ImportKind, span: Span) -> Self {
    Self { specifier, kind, meta: ImportRecordMeta::empty(), state: span, span }
  }

  pub fn with_meta(mut self, meta: ImportRecordMeta) -> Self {
    self.meta = meta;
    self
  }

  pub fn into_resolved(self, module_idx: ModuleIdx) -> ResolvedImportRecord {
    ResolvedImportRecord {
      state: module_idx,
      kind: self.kind,
      meta: self.meta,
      specifier: self.specifier,
      span: self.span,
    }
  }
}
