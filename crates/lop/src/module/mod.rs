mod external;
pub mod exports;
pub mod relevant_deps;
pub mod scan;

use arcstr::ArcStr;
use lop_common::{
  CycleToken, ExportDescription, ImportDescription, ImportRecordIdx, ModuleId, ModuleIdx,
  ModuleInfo, ModuleMeta, ModuleSideEffects, NodeIdx, RawImportRecord, ReexportDescription,
  ResolvedId, ResolvedImportRecord, SyntheticNamedExports, VariableRef,
};
use lop_ecmascript::Program;
use lop_utils::{
  indexmap::{FxIndexMap, FxIndexSet},
  rstr::Rstr,
};
use oxc_index::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

pub use external::ExternalModule;

#[derive(Debug)]
pub enum Module {
  Normal(Box<NormalModule>),
  External(Box<ExternalModule>),
}

impl Module {
  pub fn idx(&self) -> ModuleIdx {
    match self {
      Module::Normal(module) => module.idx,
      Module::External(module) => module.idx,
    }
  }

  pub fn id(&self) -> &ModuleId {
    match self {
      Module::Normal(module) => &module.id,
      Module::External(module) => &module.id,
    }
  }

  pub fn exec_order(&self) -> u32 {
    match self {
      Module::Normal(module) => module.exec_order,
      Module::External(module) => module.exec_order,
    }
  }

  pub fn set_exec_order(&mut self, order: u32) {
    match self {
      Module::Normal(module) => module.exec_order = order,
      Module::External(module) => module.exec_order = order,
    }
  }

  pub fn side_effects(&self) -> ModuleSideEffects {
    match self {
      Module::Normal(module) => module.side_effects,
      Module::External(module) => module.side_effects,
    }
  }

  pub fn is_external(&self) -> bool {
    matches!(self, Module::External(_))
  }

  pub fn as_normal(&self) -> Option<&NormalModule> {
    match self {
      Module::Normal(module) => Some(module),
      Module::External(_) => None,
    }
  }

  pub fn as_normal_mut(&mut self) -> Option<&mut NormalModule> {
    match self {
      Module::Normal(module) => Some(module),
      Module::External(_) => None,
    }
  }

  pub fn static_dependencies(&self) -> impl Iterator<Item = ModuleIdx> + '_ {
    match self {
      Module::Normal(module) => itertools::Either::Left(
        module
          .import_records
          .iter()
          .filter(|record| record.kind.is_static())
          .map(|record| record.state),
      ),
      Module::External(_) => itertools::Either::Right(std::iter::empty()),
    }
  }
}

/// One analysed source module: its AST, descriptor tables and every flag the
/// inclusion passes and the renderer read.
#[derive(Debug)]
pub struct NormalModule {
  pub idx: ModuleIdx,
  pub id: ModuleId,
  /// Calculated from `id` to be stable across machines; what diagnostics
  /// print.
  pub stable_id: String,
  pub exec_order: u32,
  pub is_user_defined_entry: bool,
  pub side_effects: ModuleSideEffects,
  pub synthetic_named_exports: SyntheticNamedExports,
  pub meta: ModuleMeta,

  pub source: ArcStr,
  pub ast: Program,
  /// Inclusion flags parallel to `ast.nodes`; monotonic once set.
  pub included_nodes: IndexVec<NodeIdx, bool>,
  /// Whether the program node itself was included by a pass.
  pub program_included: bool,

  /// Raw specifier strings this module statically imports from, in first
  /// occurrence order.
  pub sources: FxIndexSet<Rstr>,
  pub resolved_ids: FxHashMap<Rstr, ResolvedId>,
  pub import_records: IndexVec<ImportRecordIdx, ResolvedImportRecord>,
  /// Populated by the scan; resolved into `import_records` at link time.
  pub raw_import_records: IndexVec<ImportRecordIdx, RawImportRecord>,

  pub dependencies: FxIndexSet<ModuleIdx>,
  pub dynamic_dependencies: FxIndexSet<ModuleIdx>,
  pub importers: Vec<ModuleId>,
  pub dynamic_importers: Vec<ModuleId>,
  pub included_dynamic_importers: FxIndexSet<ModuleIdx>,
  pub implicitly_loaded_after: FxIndexSet<ModuleIdx>,
  pub implicitly_loaded_before: FxIndexSet<ModuleIdx>,

  /// local name -> import description
  pub import_descriptions: FxIndexMap<Rstr, ImportDescription>,
  /// exported name -> re-export description; disjoint from `exports`.
  pub reexport_descriptions: FxIndexMap<Rstr, ReexportDescription>,
  /// exported name -> direct export.
  pub exports: FxIndexMap<Rstr, ExportDescription>,
  pub export_all_sources: FxIndexSet<Rstr>,
  /// `export *` targets, internal modules first, externals appended, so name
  /// probing prefers internal exports.
  pub export_all_modules: Vec<ModuleIdx>,

  pub cycles: FxHashSet<CycleToken>,
  /// Modules whose execution is a precondition for using a variable
  /// imported through this module.
  pub side_effect_dependencies_by_variable: FxHashMap<VariableRef, FxIndexSet<ModuleIdx>>,
  /// Re-points a re-export through the cycle participant when a cyclic
  /// re-export chain is detected.
  pub alternative_reexport_modules: FxHashMap<VariableRef, ModuleIdx>,

  /// Top-level scope: declared name -> variable.
  pub scope: FxHashMap<Rstr, VariableRef>,
  /// Identifier reference node -> resolved variable, filled by
  /// `bind_references`.
  pub reference_bindings: FxHashMap<NodeIdx, VariableRef>,
  /// Identifier references shadowed by a nested scope; they have no
  /// module-level meaning.
  pub shadowed_references: FxHashSet<NodeIdx>,
  /// Variables of other modules this module references.
  pub imports: FxIndexSet<VariableRef>,

  pub namespace_variable: VariableRef,
  pub export_shim_variable: Option<VariableRef>,
  pub synthetic_exports: FxIndexMap<Rstr, VariableRef>,

  pub dynamic_import_nodes: Vec<NodeIdx>,
  pub import_meta_nodes: Vec<NodeIdx>,
  /// `export default <identifier>` aliases still unresolved after the scan;
  /// the bind phase retries them against imports.
  pub default_alias: Option<(VariableRef, Rstr)>,

  /// One-shot caches, populated once the analyse phase settles.
  pub all_export_names_cache: Option<FxIndexSet<Rstr>>,
  pub namespace_reexports_by_name: FxHashMap<Rstr, (Option<VariableRef>, bool)>,
  pub relevant_dependencies_cache: Option<FxIndexSet<ModuleIdx>>,
}

impl NormalModule {
  pub fn is_included(&self) -> bool {
    self.program_included
  }

  pub fn has_star_export(&self) -> bool {
    self.meta.has_star_export()
  }

  /// Direct exports plus re-exports, without star-derived names.
  pub fn own_export_names(&self) -> impl Iterator<Item = &Rstr> + '_ {
    self.exports.keys().chain(self.reexport_descriptions.keys())
  }

  pub fn node_included(&self, node: NodeIdx) -> bool {
    self.included_nodes[node]
  }

  pub fn to_module_info(&self, modules: &IndexVec<ModuleIdx, Module>) -> ModuleInfo {
    let resolve_ids = |indices: &FxIndexSet<ModuleIdx>| {
      indices.iter().map(|idx| modules[*idx].id().clone()).collect::<Vec<_>>()
    };
    ModuleInfo {
      id: self.id.clone(),
      code: Some(self.source.clone()),
      is_entry: self.is_user_defined_entry,
      is_included: self.is_included(),
      has_default_export: self.meta.has_default_export(),
      module_side_effects: self.side_effects,
      importers: {
        let mut importers = self.importers.clone();
        importers.sort_unstable();
        importers
      },
      dynamic_importers: {
        let mut importers = self.dynamic_importers.clone();
        importers.sort_unstable();
        importers
      },
      imported_ids: resolve_ids(&self.dependencies),
      dynamically_imported_ids: resolve_ids(&self.dynamic_dependencies),
      implicitly_loaded_after_one_of: resolve_ids(&self.implicitly_loaded_after),
      implicitly_loaded_before: resolve_ids(&self.implicitly_loaded_before),
    }
  }
}

/// Export names of a module following tc39 GetExportedNames: own names plus
/// star re-export targets, `default` only from the module itself.
pub fn exported_names<'m>(
  modules: &'m IndexVec<ModuleIdx, Module>,
  idx: ModuleIdx,
  include_default: bool,
  export_star_set: &mut FxHashSet<ModuleIdx>,
  ret: &mut FxIndexSet<Rstr>,
) {
  if !export_star_set.insert(idx) {
    return;
  }
  let Some(module) = modules[idx].as_normal() else {
    return;
  };
  for name in module.own_export_names() {
    if include_default || name.as_str() != "default" {
      ret.insert(name.clone());
    }
  }
  for target in &module.export_all_modules {
    match &modules[*target] {
      Module::Normal(_) => {
        exported_names(modules, *target, false, export_star_set, ret);
      }
      Module::External(external) => {
        // External star re-exports surface as sentinel names resolved by the
        // export-name lookup.
        ret.insert(format!("*{}", external.id.as_ref()).into());
      }
    }
  }
}

