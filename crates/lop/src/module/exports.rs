use lop_common::{
  ExportDescription, ModuleId, ModuleIdx, ModuleMeta, Specifier, VariableRef,
};
use lop_error::{BuildResult, Diagnostic, DiagnosticCode};
use lop_utils::{indexmap::FxIndexSet, rstr::Rstr};
use rustc_hash::FxHashSet;

use crate::{
  graph::Graph,
  module::{exported_names, Module},
  variable::{SyntheticNamedExportVariable, Variable, VariableKind},
};

/// Options threaded through one export-name resolution.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportLookup {
  pub importer_for_side_effects: Option<ModuleIdx>,
  pub is_export_all_search: bool,
  pub only_explicit: bool,
}

/// `(module, name)` pairs already entered during one resolution; repeats are
/// circular re-exports.
pub type SearchedNamesAndModules = FxHashSet<(ModuleIdx, Rstr)>;

impl Graph {
  /// Public entry: resolve `name` on `module` with a fresh search state.
  pub fn variable_for_export_name(
    &mut self,
    module: ModuleIdx,
    name: &Rstr,
  ) -> BuildResult<Option<VariableRef>> {
    let mut searched = SearchedNamesAndModules::default();
    self
      .variable_for_export_name_with(module, name, ExportLookup::default(), &mut searched)
      .map(|(variable, _)| variable)
  }

  /// Recurse into `target`, enforcing the circular re-export rule: a repeat
  /// of `(target, name)` is fatal outside `export *` probes and silently
  /// unresolved inside them.
  fn recursive_lookup(
    &mut self,
    target: ModuleIdx,
    name: &Rstr,
    importer_for_side_effects: Option<ModuleIdx>,
    is_export_all_search: bool,
    searched: &mut SearchedNamesAndModules,
  ) -> BuildResult<(Option<VariableRef>, bool)> {
    if !searched.insert((target, name.clone())) {
      if is_export_all_search {
        return Ok((None, false));
      }
      let target_id = self.modules[target].id().clone();
      return Err(
        Diagnostic::new(
          DiagnosticCode::CircularReexport,
          format!("\"{name}\" cannot be exported from \"{target_id}\" as it is a circular reexport."),
        )
        .with_id(target_id.to_string())
        .into(),
      );
    }
    self.variable_for_export_name_with(
      target,
      name,
      ExportLookup { importer_for_side_effects, is_export_all_search, only_explicit: false },
      searched,
    )
  }

  /// The resolution algorithm proper. The second result is the
  /// `indirectExternal` marker that bubbles out of `export *` probes.
  pub(crate) fn variable_for_export_name_with(
    &mut self,
    idx: ModuleIdx,
    name: &Rstr,
    opts: ExportLookup,
    searched: &mut SearchedNamesAndModules,
  ) -> BuildResult<(Option<VariableRef>, bool)> {
    if self.modules[idx].is_external() {
      return Ok((Some(self.external_variable(idx, name)), false));
    }

    // 1. Star sentinel: `*` is this module's namespace, `*<id>` the
    // namespace of the named external module.
    if name.starts_with('*') {
      if name.len() == 1 {
        return Ok((Some(self.normal_module(idx).namespace_variable), false));
      }
      let external_id = ModuleId::new(&name.as_str()[1..]);
      let Some(external_idx) = self.modules_by_id.get(&external_id).copied() else {
        return Ok((None, false));
      };
      return Ok((Some(self.external_variable(external_idx, &"*".into())), false));
    }

    // 2. Re-exports delegate to the exporting module.
    if let Some(description) = self.normal_module(idx).reexport_descriptions.get(name).cloned() {
      let Some(target) = description.module else {
        return Ok((None, false));
      };
      let local_name = match &description.imported {
        Specifier::Star => "*".into(),
        Specifier::Literal(local) => local.clone(),
      };
      let (variable, _) = self.recursive_lookup(
        target,
        &local_name,
        opts.importer_for_side_effects,
        opts.is_export_all_search,
        searched,
      )?;
      let Some(variable) = variable else {
        let importer = self.normal_module(idx);
        let source = importer.source.clone();
        let importer_id = importer.stable_id.clone();
        let target_id = self.modules[target].id().to_string();
        return Err(
          Diagnostic::new(
            DiagnosticCode::MissingExport,
            format!(
              "\"{local_name}\" is not exported by \"{target_id}\", imported by \"{importer_id}\"."
            ),
          )
          .with_id(importer_id)
          .with_pos(&source, description.pos as usize)
          .into(),
        );
      };
      if let Some(importer) = opts.importer_for_side_effects {
        self.set_alternative_exporter_if_cyclic(variable, importer, idx);
      }
      return Ok((Some(variable), false));
    }

    // 3. Direct exports, including the missing-export shim sentinel.
    if let Some(description) = self.normal_module(idx).exports.get(name).cloned() {
      let variable = match description {
        ExportDescription::Shim => Some(self.export_shim_variable(idx)),
        ExportDescription::Binding { local_name, .. } => self.trace_variable_with(
          idx,
          &local_name,
          opts.importer_for_side_effects,
          opts.is_export_all_search,
          searched,
        )?,
      };
      let Some(variable) = variable else {
        return Ok((None, false));
      };
      if let Some(importer) = opts.importer_for_side_effects {
        self.set_alternative_exporter_if_cyclic(variable, importer, idx);
        if self.modules[idx].side_effects().has_side_effects() {
          self
            .normal_module_mut(importer)
            .side_effect_dependencies_by_variable
            .entry(variable)
            .or_default()
            .insert(idx);
        }
      }
      return Ok((Some(variable), false));
    }

    if opts.only_explicit {
      return Ok((None, false));
    }

    // 5. Probe `export *` targets, memoized per name.
    if name.as_str() != "default" && self.normal_module(idx).has_star_export() {
      let result = self.variable_from_namespace_reexports(
        idx,
        name,
        opts.importer_for_side_effects,
        searched,
      )?;
      if result.0.is_some() {
        return Ok(result);
      }
    }

    // 6. User-declared synthetic named exports back missing names with the
    // fallback namespace.
    if self.normal_module(idx).synthetic_named_exports.is_enabled() {
      if let Some(existing) = self.normal_module(idx).synthetic_exports.get(name) {
        return Ok((Some(*existing), false));
      }
      let base = self.synthetic_namespace(idx)?;
      let variable = self.variables.create(
        idx,
        Variable::new(
          name.clone(),
          VariableKind::SyntheticNamedExport(SyntheticNamedExportVariable { base }),
        ),
      );
      self.normal_module_mut(idx).synthetic_exports.insert(name.clone(), variable);
      return Ok((Some(variable), false));
    }

    // 7. Optionally shim the missing export instead of failing.
    if !opts.is_export_all_search && self.options.shim_missing_exports {
      let id = self.normal_module(idx).id.to_string();
      self.warn(
        Diagnostic::new(
          DiagnosticCode::ShimmedExport,
          format!("Missing export \"{name}\" has been shimmed in module \"{id}\"."),
        )
        .with_id(id),
      );
      let module = self.normal_module_mut(idx);
      module.meta.insert(ModuleMeta::NEEDS_EXPORT_SHIM);
      module.exports.insert(name.clone(), ExportDescription::Shim);
      return Ok((Some(self.export_shim_variable(idx)), false));
    }

    Ok((None, false))
  }

  /// Scope lookup, then imports delegated to the exporting module, then
  /// nothing. Missing imported exports are fatal at the import site.
  pub(crate) fn trace_variable_with(
    &mut self,
    idx: ModuleIdx,
    name: &Rstr,
    importer_for_side_effects: Option<ModuleIdx>,
    is_export_all_search: bool,
    searched: &mut SearchedNamesAndModules,
  ) -> BuildResult<Option<VariableRef>> {
    if let Some(local) = self.normal_module(idx).scope.get(name).copied() {
      return Ok(Some(local));
    }
    let Some(description) = self.normal_module(idx).import_descriptions.get(name).cloned() else {
      return Ok(None);
    };
    let Some(target) = description.module else {
      return Ok(None);
    };
    if description.imported.is_star() {
      return Ok(Some(match &self.modules[target] {
        Module::Normal(importee) => importee.namespace_variable,
        Module::External(_) => self.external_variable(target, &"*".into()),
      }));
    }
    let imported = description.imported.as_literal().cloned().unwrap_or_default();
    let (variable, _) = self.variable_for_export_name_with(
      target,
      &imported,
      ExportLookup {
        importer_for_side_effects: Some(importer_for_side_effects.unwrap_or(idx)),
        is_export_all_search,
        only_explicit: false,
      },
      searched,
    )?;
    match variable {
      Some(variable) => Ok(Some(variable)),
      None => {
        let importer = self.normal_module(idx);
        let source = importer.source.clone();
        let importer_id = importer.stable_id.clone();
        let target_id = self.modules[target].id().to_string();
        Err(
          Diagnostic::new(
            DiagnosticCode::MissingExport,
            format!(
              "\"{imported}\" is not exported by \"{target_id}\", imported by \"{importer_id}\"."
            ),
          )
          .with_id(importer_id)
          .with_pos(&source, description.pos as usize)
          .into(),
        )
      }
    }
  }

  pub(crate) fn trace_variable(
    &mut self,
    idx: ModuleIdx,
    name: &Rstr,
  ) -> BuildResult<Option<VariableRef>> {
    let mut searched = SearchedNamesAndModules::default();
    self.trace_variable_with(idx, name, None, false, &mut searched)
  }

  /// Step 5: search every `export *` target for `name`. Internal matches
  /// beat external ones beat synthetic ones; conflicting internals resolve
  /// to nothing with a warning.
  fn variable_from_namespace_reexports(
    &mut self,
    idx: ModuleIdx,
    name: &Rstr,
    importer_for_side_effects: Option<ModuleIdx>,
    searched: &SearchedNamesAndModules,
  ) -> BuildResult<(Option<VariableRef>, bool)> {
    if let Some(cached) = self.normal_module(idx).namespace_reexports_by_name.get(name) {
      return Ok(*cached);
    }

    let targets = self.normal_module(idx).export_all_modules.clone();
    let mut internal: Vec<VariableRef> = Vec::new();
    let mut external: Vec<VariableRef> = Vec::new();
    let mut synthetic: Option<VariableRef> = None;

    for target in targets {
      // A real re-exported binding must win over the target's synthetic
      // fallback of the same name.
      if let Some(target_module) = self.modules[target].as_normal() {
        if target_module.synthetic_named_exports.matches_name(name) {
          continue;
        }
      }
      // Fork the search state per sibling so one probe cannot poison the
      // next.
      let mut forked = searched.clone();
      let (variable, indirect_external) = self.recursive_lookup(
        target,
        name,
        importer_for_side_effects,
        true,
        &mut forked,
      )?;
      let Some(variable) = variable else {
        continue;
      };
      let is_external = matches!(self.variables.get(variable).kind, VariableKind::External(_))
        || indirect_external;
      if is_external {
        external.push(variable);
      } else if self.variables.get(variable).is_synthetic() {
        synthetic.get_or_insert(variable);
      } else {
        internal.push(variable);
      }
    }

    let mut distinct_internal = internal.clone();
    distinct_internal.sort_unstable();
    distinct_internal.dedup();

    let result = if !distinct_internal.is_empty() {
      if distinct_internal.len() > 1 {
        let id = self.normal_module(idx).id.to_string();
        self.warn(
          Diagnostic::new(
            DiagnosticCode::NamespaceConflict,
            format!(
              "Conflicting namespaces: \"{id}\" re-exports \"{name}\" from one of the modules \
               it re-exports with `export *`; using neither."
            ),
          )
          .with_id(id),
        );
        (None, false)
      } else {
        (Some(internal[0]), false)
      }
    } else if !external.is_empty() {
      let mut distinct_external = external.clone();
      distinct_external.sort_unstable();
      distinct_external.dedup();
      if distinct_external.len() > 1 {
        let id = self.normal_module(idx).id.to_string();
        self.warn(
          Diagnostic::new(
            DiagnosticCode::AmbiguousExternalNamespaces,
            format!(
              "Ambiguous external namespace resolution: \"{id}\" re-exports \"{name}\" from \
               more than one external module; using the first one."
            ),
          )
          .with_id(id),
        );
      }
      (Some(external[0]), true)
    } else {
      (synthetic, false)
    };

    self.normal_module_mut(idx).namespace_reexports_by_name.insert(name.clone(), result);
    Ok(result)
  }

  /// The fallback namespace a synthetic export reads through; missing one is
  /// a configuration error.
  fn synthetic_namespace(&mut self, idx: ModuleIdx) -> BuildResult<VariableRef> {
    let fallback = self
      .normal_module(idx)
      .synthetic_named_exports
      .fallback_export_name()
      .unwrap_or_else(|| "default".into());
    let mut searched = SearchedNamesAndModules::default();
    let (variable, _) = self.variable_for_export_name_with(
      idx,
      &fallback,
      ExportLookup { only_explicit: true, ..ExportLookup::default() },
      &mut searched,
    )?;
    variable.ok_or_else(|| {
      let id = self.normal_module(idx).id.to_string();
      Diagnostic::new(
        DiagnosticCode::SyntheticNamedExportsNeedNamespaceExport,
        format!(
          "Module \"{id}\" that is marked with `syntheticNamedExports` needs an explicit export \
           named \"{fallback}\"."
        ),
      )
      .with_id(id)
      .into()
    })
  }

  pub(crate) fn export_shim_variable(&mut self, idx: ModuleIdx) -> VariableRef {
    if let Some(existing) = self.normal_module(idx).export_shim_variable {
      return existing;
    }
    let variable = self.variables.create(idx, Variable::new("_missingExportShim", VariableKind::ExportShim));
    self.normal_module_mut(idx).export_shim_variable = Some(variable);
    variable
  }

  pub(crate) fn external_variable(&mut self, idx: ModuleIdx, name: &Rstr) -> VariableRef {
    let Graph { modules, variables, .. } = self;
    match &mut modules[idx] {
      Module::External(external) => external.variable_for_name(name, variables),
      Module::Normal(_) => unreachable!("external_variable called on a normal module"),
    }
  }

  /// Bias the bundle to import through a cyclic re-exporter so execution
  /// order inside the cycle is preserved.
  fn set_alternative_exporter_if_cyclic(
    &mut self,
    variable: VariableRef,
    importer: ModuleIdx,
    reexporter: ModuleIdx,
  ) {
    let owner = variable.owner;
    if owner == reexporter {
      return;
    }
    let (Some(owner_module), Some(reexporter_module)) =
      (self.modules[owner].as_normal(), self.modules[reexporter].as_normal())
    else {
      return;
    };
    if owner_module.cycles.is_empty() {
      return;
    }
    let shares_cycle =
      reexporter_module.cycles.iter().any(|token| owner_module.cycles.contains(token));
    if shares_cycle {
      self
        .normal_module_mut(importer)
        .alternative_reexport_modules
        .insert(variable, reexporter);
    }
  }

  /// All export names reachable from `idx`, star targets included, memoized
  /// once the generate phase begins.
  pub fn all_export_names(&mut self, idx: ModuleIdx, include_default: bool) -> FxIndexSet<Rstr> {
    if include_default {
      if let Some(cached) = &self.normal_module(idx).all_export_names_cache {
        return cached.clone();
      }
    }
    let mut ret = FxIndexSet::default();
    let mut export_star_set = FxHashSet::default();
    exported_names(&self.modules, idx, include_default, &mut export_star_set, &mut ret);
    if include_default && self.phase >= lop_common::BuildPhase::Generate {
      self.normal_module_mut(idx).all_export_names_cache = Some(ret.clone());
    }
    ret
  }
}
