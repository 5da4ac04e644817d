mod types;

// Internal file layout is not part of the public surface; everything is
// exported from the root.
pub use crate::types::{
  descriptors::{ExportDescription, ImportDescription, ReexportDescription},
  entry_point::{EntryPoint, EntryPointKind},
  idx::{CycleToken, ImportRecordIdx, ModuleIdx, NodeIdx, RawIdx, VariableIdx},
  import_record::{ImportKind, ImportRecord, ImportRecordMeta, RawImportRecord, ResolvedImportRecord},
  module_id::ModuleId,
  module_info::ModuleInfo,
  module_meta::ModuleMeta,
  options::NormalizedOptions,
  phase::BuildPhase,
  resolved_id::ResolvedId,
  side_effects::ModuleSideEffects,
  source::Source,
  source_joiner::SourceJoiner,
  span::Span,
  specifier::Specifier,
  synthetic_named_exports::SyntheticNamedExports,
  variable_ref::VariableRef,
};
