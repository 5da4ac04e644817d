use lop_common::{ModuleIdx, VariableRef};
use lop_error::BuildResult;
use lop_utils::indexmap::FxIndexSet;
use rustc_hash::FxHashSet;

use crate::{ast_effects::context::EffectsContext, graph::Graph, module::Module};

impl Graph {
  /// Whether executing this module is observable: forced for
  /// `no-treeshake`, otherwise whether any of its top-level statements has
  /// effects. Deliberately independent of inclusion so a pure-flagged module
  /// still reports its latent effects.
  pub fn module_has_effects(&mut self, idx: ModuleIdx) -> bool {
    match &self.modules[idx] {
      Module::External(external) => external.side_effects.has_side_effects(),
      Module::Normal(module) => {
        if module.side_effects.is_no_treeshake() {
          return true;
        }
        let body = module.ast.body.clone();
        body.into_iter().any(|stmt| {
          let mut ctx = EffectsContext::default();
          self.node_has_effects(idx, stmt, &mut ctx)
        })
      }
    }
  }

  /// Which dependencies must survive in the output graph: those supplying a
  /// used binding plus those carrying reachable side effects. Cached once
  /// computed.
  pub fn dependencies_to_be_included(&mut self, idx: ModuleIdx) -> BuildResult<FxIndexSet<ModuleIdx>> {
    if let Some(cached) = &self.normal_module(idx).relevant_dependencies_cache {
      return Ok(cached.clone());
    }

    let mut relevant_dependencies = FxIndexSet::default();
    let mut necessary_dependencies = FxIndexSet::default();
    let mut always_checked_dependencies = FxIndexSet::default();

    let mut dependency_variables: FxIndexSet<VariableRef> =
      self.normal_module(idx).imports.clone();

    // Modules whose exports stay reachable from outside also owe their
    // export sources.
    let exposes_exports = {
      let module = self.normal_module(idx);
      module.is_user_defined_entry
        || !module.included_dynamic_importers.is_empty()
        || self.variables.get(module.namespace_variable).included
        || !module.implicitly_loaded_after.is_empty()
    };
    if exposes_exports {
      // Star-derived names resolve too, so star targets surface as
      // necessary dependencies of an exposed module.
      let export_names = self.all_export_names(idx, true);
      for name in export_names {
        if let Some(variable) = self.variable_for_export_name(idx, &name)? {
          dependency_variables.insert(variable);
        }
      }
    }

    for variable in dependency_variables {
      if let Some(side_effect_dependencies) = self
        .normal_module(idx)
        .side_effect_dependencies_by_variable
        .get(&variable)
      {
        always_checked_dependencies.extend(side_effect_dependencies.iter().copied());
      }
      let variable = if self.variables.get(variable).is_synthetic() {
        self.variables.base_variable(variable)
      } else {
        self.variables.original_variable(variable)
      };
      necessary_dependencies.insert(variable.owner);
    }

    if !self.options.treeshake || self.normal_module(idx).side_effects.is_no_treeshake() {
      relevant_dependencies.extend(self.normal_module(idx).dependencies.iter().copied());
    } else {
      self.add_relevant_side_effect_dependencies(
        idx,
        &mut relevant_dependencies,
        &necessary_dependencies,
        &always_checked_dependencies,
      );
    }

    for dependency in necessary_dependencies {
      if dependency != idx {
        relevant_dependencies.insert(dependency);
      }
    }

    self.normal_module_mut(idx).relevant_dependencies_cache =
      Some(relevant_dependencies.clone());
    Ok(relevant_dependencies)
  }

  /// DFS keeping a dependency iff it is necessary, or it may carry side
  /// effects that actually materialize; pure in-between modules are
  /// traversed through.
  fn add_relevant_side_effect_dependencies(
    &mut self,
    idx: ModuleIdx,
    relevant_dependencies: &mut FxIndexSet<ModuleIdx>,
    necessary_dependencies: &FxIndexSet<ModuleIdx>,
    always_checked_dependencies: &FxIndexSet<ModuleIdx>,
  ) {
    let mut handled_dependencies = FxHashSet::default();
    let mut queue: Vec<ModuleIdx> =
      self.normal_module(idx).dependencies.iter().copied().collect();
    queue.extend(always_checked_dependencies.iter().copied());

    let mut cursor = 0;
    while cursor < queue.len() {
      let dependency = queue[cursor];
      cursor += 1;
      if !handled_dependencies.insert(dependency) {
        continue;
      }
      if necessary_dependencies.contains(&dependency) {
        relevant_dependencies.insert(dependency);
        continue;
      }
      let may_have_effects = self.modules[dependency].side_effects().has_side_effects()
        || always_checked_dependencies.contains(&dependency);
      if !may_have_effects {
        continue;
      }
      if self.modules[dependency].is_external() || self.module_has_effects(dependency) {
        relevant_dependencies.insert(dependency);
        continue;
      }
      if let Some(dependency_module) = self.modules[dependency].as_normal() {
        queue.extend(dependency_module.dependencies.iter().copied());
      }
    }
  }
}
