use arcstr::ArcStr;
use lop_common::{
  BuildPhase, EntryPoint, EntryPointKind, ModuleId, ModuleIdx, ModuleMeta, ModuleSideEffects,
  NormalizedOptions, VariableRef,
};
use lop_error::{BuildResult, Diagnostic, DiagnosticCode};
use lop_utils::indexmap::FxIndexSet;
use oxc_index::{Idx, IndexVec};
use rustc_hash::FxHashMap;

use crate::{
  module::{scan::AstScanner, ExternalModule, Module, NormalModule},
  types::{ContextParse, IndexModules, ModuleInput},
  variable::{NamespaceVariable, Variable, VariableDb, VariableKind},
};

pub type WarningSink = Box<dyn FnMut(&Diagnostic)>;

/// Owns the whole analysis state: the module table, the variable tables and
/// the fixpoint bookkeeping. All cross-module algorithms are methods here so
/// recursion works through indices instead of held references.
pub struct Graph {
  pub options: NormalizedOptions,
  pub modules: IndexModules,
  pub modules_by_id: FxHashMap<ModuleId, ModuleIdx>,
  pub variables: VariableDb,
  pub entry_points: Vec<EntryPoint>,
  pub phase: BuildPhase,
  pub needs_treeshaking_pass: bool,
  pub warnings: Vec<Diagnostic>,
  pub errors: Vec<anyhow::Error>,
  pub(crate) context_parse: ContextParse,
  on_warn: Option<WarningSink>,
  cycle_token_counter: u32,
}

impl std::fmt::Debug for Graph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Graph")
      .field("modules", &self.modules.len())
      .field("phase", &self.phase)
      .field("entry_points", &self.entry_points)
      .finish_non_exhaustive()
  }
}

impl Graph {
  pub fn new(options: NormalizedOptions) -> Self {
    Self {
      options,
      modules: IndexVec::default(),
      modules_by_id: FxHashMap::default(),
      variables: VariableDb::default(),
      entry_points: Vec::new(),
      phase: BuildPhase::Load,
      needs_treeshaking_pass: false,
      warnings: Vec::new(),
      errors: Vec::new(),
      context_parse: lop_ecmascript::parse,
      on_warn: None,
      cycle_token_counter: 0,
    }
  }

  pub fn with_warning_sink(mut self, sink: WarningSink) -> Self {
    self.on_warn = Some(sink);
    self
  }

  pub fn with_context_parse(mut self, context_parse: ContextParse) -> Self {
    self.context_parse = context_parse;
    self
  }

  pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
    if let Some(sink) = &mut self.on_warn {
      sink(&diagnostic);
    }
    self.warnings.push(diagnostic);
  }

  pub(crate) fn request_treeshaking_pass(&mut self) {
    self.needs_treeshaking_pass = true;
  }

  pub(crate) fn next_cycle_token(&mut self) -> usize {
    let token = self.cycle_token_counter;
    self.cycle_token_counter += 1;
    token as usize
  }

  pub fn module_idx(&self, id: &str) -> Option<ModuleIdx> {
    self.modules_by_id.get(&ModuleId::new(id)).copied()
  }

  pub fn normal_module(&self, idx: ModuleIdx) -> &NormalModule {
    self.modules[idx].as_normal().expect("expected a normal module")
  }

  pub(crate) fn normal_module_mut(&mut self, idx: ModuleIdx) -> &mut NormalModule {
    self.modules[idx].as_normal_mut().expect("expected a normal module")
  }

  /// Install one parsed-and-scanned module. Parse failure is fatal and
  /// carries the offending offset.
  pub fn add_module(&mut self, input: ModuleInput) -> BuildResult<ModuleIdx> {
    let idx = ModuleIdx::from_usize(self.modules.len());
    self.variables.ensure_module(idx);

    let stable_id = input.id.stabilize(&self.options.cwd);
    let ast = (self.context_parse)(&input.code).map_err(|error| {
      let mut message = error.message.clone();
      if !has_known_extension(&input.id) {
        message.push_str(
          " (Note that you need plugins to import files that are not JavaScript)",
        );
      }
      Diagnostic::new(DiagnosticCode::ParseError, message)
        .with_id(stable_id.clone())
        .with_pos(&input.code, error.pos)
    })?;

    let scan = AstScanner::new(idx, &ast, &mut self.variables).scan();

    let namespace_name = lop_utils::ecmascript::legitimize_identifier_name(input.id.as_ref());
    let namespace_variable = self.variables.create(
      idx,
      Variable::new(namespace_name, VariableKind::Namespace(NamespaceVariable::default())),
    );

    let included_nodes = ast.nodes.iter().map(|_| false).collect();
    let module = NormalModule {
      idx,
      id: input.id.clone(),
      stable_id,
      exec_order: u32::MAX,
      is_user_defined_entry: input.is_entry,
      side_effects: input.module_side_effects,
      synthetic_named_exports: input.synthetic_named_exports,
      meta: scan.meta,
      source: ArcStr::from(input.code),
      ast,
      included_nodes,
      program_included: false,
      sources: scan.sources,
      resolved_ids: input.resolved_ids,
      import_records: IndexVec::default(),
      raw_import_records: scan.raw_import_records,
      dependencies: FxIndexSet::default(),
      dynamic_dependencies: FxIndexSet::default(),
      importers: Vec::new(),
      dynamic_importers: Vec::new(),
      included_dynamic_importers: FxIndexSet::default(),
      implicitly_loaded_after: FxIndexSet::default(),
      implicitly_loaded_before: FxIndexSet::default(),
      import_descriptions: scan.import_descriptions,
      reexport_descriptions: scan.reexport_descriptions,
      exports: scan.exports,
      export_all_sources: scan.export_all_sources,
      export_all_modules: Vec::new(),
      cycles: rustc_hash::FxHashSet::default(),
      side_effect_dependencies_by_variable: FxHashMap::default(),
      alternative_reexport_modules: FxHashMap::default(),
      scope: scan.scope,
      reference_bindings: FxHashMap::default(),
      shadowed_references: rustc_hash::FxHashSet::default(),
      imports: FxIndexSet::default(),
      namespace_variable,
      export_shim_variable: None,
      synthetic_exports: Default::default(),
      dynamic_import_nodes: scan.dynamic_import_nodes,
      import_meta_nodes: scan.import_meta_nodes,
      default_alias: scan.default_alias,
      all_export_names_cache: None,
      namespace_reexports_by_name: FxHashMap::default(),
      relevant_dependencies_cache: None,
    };

    if input.is_entry {
      self.entry_points.push(EntryPoint { id: idx, kind: EntryPointKind::UserDefined });
    }
    self.modules_by_id.insert(input.id, idx);
    self.modules.push(Module::Normal(Box::new(module)));
    Ok(idx)
  }

  fn add_external_module(
    &mut self,
    id: ModuleId,
    side_effects: ModuleSideEffects,
  ) -> ModuleIdx {
    if let Some(existing) = self.modules_by_id.get(&id) {
      return *existing;
    }
    let idx = ModuleIdx::from_usize(self.modules.len());
    self.variables.ensure_module(idx);
    let module = ExternalModule::new(idx, id.clone(), side_effects, &mut self.variables);
    self.modules_by_id.insert(id, idx);
    self.modules.push(Module::External(Box::new(module)));
    idx
  }

  /// Resolve every raw import record and descriptor to a module index and
  /// partition `export *` targets internal-first. Runs once after loading.
  pub fn link_imports(&mut self) -> BuildResult<()> {
    self.phase = BuildPhase::Analyse;
    let module_indices: Vec<ModuleIdx> =
      self.modules.indices().filter(|idx| self.modules[*idx].as_normal().is_some()).collect();

    for idx in &module_indices {
      let idx = *idx;
      // Resolve specifiers first with short-lived borrows, creating external
      // modules as they surface.
      let specifiers: Vec<_> = {
        let module = self.normal_module(idx);
        module
          .raw_import_records
          .iter()
          .map(|record| (record.specifier.clone(), record.kind))
          .collect()
      };

      let mut targets = Vec::with_capacity(specifiers.len());
      for (specifier, _kind) in &specifiers {
        let resolved = self.normal_module(idx).resolved_ids.get(specifier).cloned();
        let target = match resolved {
          Some(resolved) if resolved.is_external => {
            Some(self.add_external_module(resolved.id, resolved.module_side_effects))
          }
          Some(resolved) => self.modules_by_id.get(&resolved.id).copied(),
          None => self.modules_by_id.get(&ModuleId::new(specifier.as_str())).copied(),
        };
        match target {
          Some(target) => targets.push(target),
          None => {
            let importer = self.normal_module(idx).id.clone();
            return Err(
              anyhow::anyhow!("Could not resolve \"{specifier}\" from \"{importer}\".").into(),
            );
          }
        }
      }

      let importer_id = self.normal_module(idx).id.clone();
      let no_treeshake =
        matches!(self.normal_module(idx).side_effects, ModuleSideEffects::NoTreeshake);

      // Specifier -> target map for descriptor linking.
      let mut by_specifier: FxHashMap<lop_utils::rstr::Rstr, ModuleIdx> = FxHashMap::default();
      for ((specifier, _), target) in specifiers.iter().zip(&targets) {
        by_specifier.entry(specifier.clone()).or_insert(*target);
      }

      {
        let module = self.normal_module_mut(idx);
        let raw = std::mem::take(&mut module.raw_import_records);
        module.import_records =
          raw.into_iter().zip(&targets).map(|(record, target)| record.into_resolved(*target)).collect();

        for description in module.import_descriptions.values_mut() {
          description.module = by_specifier.get(&description.source).copied();
        }
        for description in module.reexport_descriptions.values_mut() {
          description.module = by_specifier.get(&description.source).copied();
        }

        // Record targets in source order; the internal-first partition
        // happens once externals are known, below.
        module.export_all_modules = module
          .export_all_sources
          .iter()
          .filter_map(|source| by_specifier.get(source).copied())
          .collect();
      }

      // Dependency sets and reverse edges.
      for ((_, kind), target) in specifiers.iter().zip(&targets) {
        let target = *target;
        if kind.is_static() {
          self.normal_module_mut(idx).dependencies.insert(target);
          if let Module::Normal(importee) = &mut self.modules[target] {
            importee.importers.push(importer_id.clone());
            if no_treeshake {
              importee.meta.insert(ModuleMeta::IMPORTED_FROM_NOT_TREESHAKEN);
            }
          }
        } else {
          self.normal_module_mut(idx).dynamic_dependencies.insert(target);
          if let Module::Normal(importee) = &mut self.modules[target] {
            importee.dynamic_importers.push(importer_id.clone());
          }
        }
      }
    }

    // Re-partition export_all_modules now that external-ness is knowable.
    for idx in &module_indices {
      let idx = *idx;
      let targets = std::mem::take(&mut self.normal_module_mut(idx).export_all_modules);
      let (internal, external): (Vec<_>, Vec<_>) =
        targets.into_iter().partition(|target| !self.modules[*target].is_external());
      let module = self.normal_module_mut(idx);
      module.export_all_modules = internal;
      module.export_all_modules.extend(external);
    }

    Ok(())
  }

  /// Full analysis pipeline: link, order, bind, then drive inclusion to the
  /// fixpoint. Fatal diagnostics abort before inclusion starts.
  pub fn build(&mut self) -> BuildResult<()> {
    self.link_imports()?;
    self.sort_modules();
    self.bind_references();
    if !self.errors.is_empty() {
      return Err(std::mem::take(&mut self.errors).into());
    }
    self.include_statements()?;
    self.phase = BuildPhase::Generate;
    Ok(())
  }

  pub(crate) fn deoptimize_variable_path(&mut self, reference: VariableRef, empty_path: bool) {
    let variable = self.variables.get_mut(reference);
    let newly_deoptimized = if empty_path {
      let changed = !variable.is_reassigned;
      variable.is_reassigned = true;
      variable.has_deoptimized_path = true;
      changed
    } else {
      let changed = !variable.has_deoptimized_path;
      variable.has_deoptimized_path = true;
      changed
    };
    // Only a state transition invalidates handed-out literal values; a
    // repeated deoptimization must not wake the fixpoint again.
    if newly_deoptimized && variable.literal_probed {
      self.request_treeshaking_pass();
    }
  }
}

fn has_known_extension(id: &ModuleId) -> bool {
  [".js", ".mjs", ".cjs", ".json"].iter().any(|ext| id.as_ref().ends_with(ext))
}
