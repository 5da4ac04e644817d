use lop_common::{EntryPoint, EntryPointKind, ModuleIdx, ModuleMeta, NodeIdx, VariableRef};
use lop_ecmascript::ast::NodeKind;
use lop_error::BuildResult;
use rustc_hash::FxHashSet;

use crate::{
  ast_effects::context::{EffectsContext, InclusionContext},
  graph::Graph,
  module::Module,
  variable::{ExternalVariable, VariableKind},
};

impl Graph {
  /// The fixpoint driver: seed entries, then re-run module inclusion in
  /// execution order until no pass requests another one. Terminates because
  /// every tracked transition is monotonic over a finite lattice.
  pub(crate) fn include_statements(&mut self) -> BuildResult<()> {
    let entries: Vec<ModuleIdx> = self.entry_points.iter().map(|entry| entry.id).collect();
    for entry in &entries {
      self.mark_module_and_impure_dependencies_executed(*entry);
    }

    if !self.options.treeshake {
      let indices: Vec<ModuleIdx> = self.modules.indices().collect();
      for idx in indices {
        if self.modules[idx].as_normal().is_some() {
          self.include_all_in_bundle(idx);
        }
      }
      for entry in &entries {
        self.include_all_exports(*entry, false)?;
      }
      return Ok(());
    }

    let mut execution_order: Vec<ModuleIdx> =
      self.modules.indices().filter(|idx| self.modules[*idx].as_normal().is_some()).collect();
    execution_order.sort_by_key(|idx| self.modules[*idx].exec_order());

    let mut treeshaking_pass = 1u32;
    loop {
      self.needs_treeshaking_pass = false;
      for idx in &execution_order {
        let idx = *idx;
        if self.normal_module(idx).meta.is_executed() {
          if self.normal_module(idx).side_effects.is_no_treeshake() {
            self.include_all_in_bundle(idx);
          } else {
            self.include_module(idx)?;
          }
        }
      }
      if treeshaking_pass == 1 {
        for entry in &entries {
          self.include_all_exports(*entry, false)?;
        }
        self.needs_treeshaking_pass = true;
      }
      if !self.needs_treeshaking_pass {
        break;
      }
      treeshaking_pass += 1;
    }
    Ok(())
  }

  /// One inclusion step for one module: seed every top-level statement that
  /// should be included and recurse from there.
  fn include_module(&mut self, idx: ModuleIdx) -> BuildResult<()> {
    let body = self.normal_module(idx).ast.body.clone();
    let should_include = self.normal_module(idx).program_included
      || body.iter().any(|stmt| self.statement_should_be_included(idx, *stmt));
    if !should_include {
      return Ok(());
    }
    if !self.normal_module(idx).program_included {
      self.normal_module_mut(idx).program_included = true;
      self.request_treeshaking_pass();
    }
    let mut ctx = InclusionContext::default();
    for stmt in body {
      if self.statement_should_be_included(idx, stmt) {
        self.include_node(idx, stmt, false, &mut ctx)?;
      }
    }
    Ok(())
  }

  /// Force-include a whole module, `no-treeshake` style.
  pub(crate) fn include_all_in_bundle(&mut self, idx: ModuleIdx) {
    if !self.normal_module(idx).meta.is_executed() {
      self.mark_module_and_impure_dependencies_executed(idx);
    }
    let body = self.normal_module(idx).ast.body.clone();
    if !self.normal_module(idx).program_included {
      self.normal_module_mut(idx).program_included = true;
      self.request_treeshaking_pass();
    }
    let mut ctx = InclusionContext::default();
    for stmt in body {
      let _ = self.include_node(idx, stmt, true, &mut ctx);
    }
  }

  /// Mark a node included and recurse into children: unconditionally when
  /// `recursive`, by the should-be-included test otherwise.
  pub(crate) fn include_node(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    recursive: bool,
    ctx: &mut InclusionContext,
  ) -> BuildResult<()> {
    let newly_included = !self.normal_module(module).node_included(node);
    if newly_included {
      self.normal_module_mut(module).included_nodes[node] = true;
      self.request_treeshaking_pass();
    }

    match self.normal_module(module).ast.kind(node) {
      NodeKind::Identifier { .. } => {
        if let Some(variable) = self.resolve_identifier(module, node) {
          self.include_variable(variable, ctx)?;
        }
        Ok(())
      }

      // The last expression carries the value; earlier ones only survive on
      // their own effects. Rendering drops the non-included commas.
      NodeKind::SequenceExpression { expressions } => {
        let expressions = expressions.clone();
        let value_used = !matches!(
          self
            .normal_module(module)
            .ast
            .node(node)
            .parent
            .map(|parent| self.normal_module(module).ast.kind(parent)),
          Some(NodeKind::ExpressionStatement { .. })
        );
        let last = expressions.len().saturating_sub(1);
        for (index, expression) in expressions.into_iter().enumerate() {
          let is_last = index == last;
          let mut effects_ctx = EffectsContext::default();
          if recursive
            || (is_last && value_used)
            || self.normal_module(module).node_included(expression)
            || self.node_has_effects(module, expression, &mut effects_ctx)
          {
            self.include_node(module, expression, recursive, ctx)?;
          }
        }
        Ok(())
      }

      NodeKind::VariableDeclaration { declarations, .. } => {
        let declarations = declarations.clone();
        for declarator in declarations {
          let mut effects_ctx = EffectsContext::default();
          if recursive
            || self.normal_module(module).node_included(declarator)
            || self.node_has_effects(module, declarator, &mut effects_ctx)
          {
            self.include_node(module, declarator, recursive, ctx)?;
          }
        }
        Ok(())
      }

      NodeKind::IfStatement { test, consequent, alternate } => {
        let (test, consequent, alternate) = (*test, *consequent, *alternate);
        self.include_node(module, test, recursive, ctx)?;
        let mut branches = vec![consequent];
        branches.extend(alternate);
        for branch in branches {
          if recursive || self.statement_should_be_included(module, branch) {
            self.include_node(module, branch, recursive, ctx)?;
          }
        }
        Ok(())
      }

      NodeKind::BlockStatement { body } => {
        let body = body.clone();
        for stmt in body {
          if recursive || self.statement_should_be_included(module, stmt) {
            self.include_node(module, stmt, recursive, ctx)?;
          }
        }
        Ok(())
      }

      NodeKind::ImportExpression { .. } => {
        self.include_dynamic_import(module, node, ctx)
      }

      _ => {
        let mut children = Vec::new();
        self.normal_module(module).ast.for_each_child(node, |child| children.push(child));
        for child in children {
          self.include_node(module, child, recursive, ctx)?;
        }
        Ok(())
      }
    }
  }

  /// An included dynamic import preserves the target's full namespace.
  fn include_dynamic_import(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    ctx: &mut InclusionContext,
  ) -> BuildResult<()> {
    if !ctx.included_call_sites.insert((module, node)) {
      return Ok(());
    }
    let source_span = {
      let normal = self.normal_module(module);
      let NodeKind::ImportExpression { source } = normal.ast.kind(node) else {
        return Ok(());
      };
      normal.ast.span(*source)
    };
    let target = self
      .normal_module(module)
      .import_records
      .iter()
      .find(|record| !record.kind.is_static() && record.span == source_span)
      .map(|record| record.state);
    let Some(target) = target else {
      return Ok(());
    };
    match &self.modules[target] {
      Module::Normal(_) => {
        let newly_dynamic = self.normal_module(target).included_dynamic_importers.is_empty();
        self.normal_module_mut(target).included_dynamic_importers.insert(module);
        if newly_dynamic && !self.normal_module(target).is_user_defined_entry {
          self.entry_points.push(EntryPoint { id: target, kind: EntryPointKind::DynamicImport });
        }
        if !self.normal_module(target).meta.is_executed() {
          self.mark_module_and_impure_dependencies_executed(target);
        }
        self.include_all_exports_inner(target, true, ctx)
      }
      Module::External(_) => Ok(()),
    }
  }

  /// Ensure every exported binding of `idx` is included; entries and dynamic
  /// import targets go through here.
  pub(crate) fn include_all_exports(
    &mut self,
    idx: ModuleIdx,
    include_namespace_members: bool,
  ) -> BuildResult<()> {
    let mut ctx = InclusionContext::default();
    self.include_all_exports_inner(idx, include_namespace_members, &mut ctx)
  }

  fn include_all_exports_inner(
    &mut self,
    idx: ModuleIdx,
    include_namespace_members: bool,
    ctx: &mut InclusionContext,
  ) -> BuildResult<()> {
    if !self.normal_module(idx).meta.is_executed() {
      self.mark_module_and_impure_dependencies_executed(idx);
    }
    let names = self.all_export_names(idx, true);
    for name in names {
      let variable = self.variable_for_export_name(idx, &name)?;
      let Some(variable) = variable else {
        continue;
      };
      // Re-reads after inclusion must not rely on stale literal caches.
      self.deoptimize_variable_path(variable, false);
      self.include_variable(variable, ctx)?;
      if self.modules[variable.owner].is_external() {
        self.mark_external_reexported(variable);
      }
    }
    if include_namespace_members {
      let namespace = self.normal_module(idx).namespace_variable;
      self.include_variable(namespace, ctx)?;
    }
    Ok(())
  }

  fn mark_external_reexported(&mut self, variable: VariableRef) {
    if let Module::External(external) = &mut self.modules[variable.owner] {
      external.used = true;
    }
    if let VariableKind::External(ExternalVariable { reexported }) =
      &mut self.variables.get_mut(variable).kind
    {
      *reexported = true;
    }
  }

  /// The monotonic variable transition. Newly included variables mark their
  /// module (and its impure dependencies) executed and wake the fixpoint.
  pub(crate) fn include_variable(
    &mut self,
    variable: VariableRef,
    ctx: &mut InclusionContext,
  ) -> BuildResult<()> {
    if self.variables.get(variable).included {
      return Ok(());
    }
    self.variables.get_mut(variable).included = true;
    self.request_treeshaking_pass();

    let owner = variable.owner;
    match &self.variables.get(variable).kind {
      VariableKind::Local(local) => {
        let declarations = local.declarations.clone();
        for declaration in declarations {
          self.include_node(owner, declaration, false, ctx)?;
          self.include_ancestors(owner, declaration);
        }
      }
      VariableKind::ExportDefault(default) => {
        let declaration = default.declaration;
        self.include_node(owner, declaration, false, ctx)?;
        self.include_ancestors(owner, declaration);
        if let Some(original) = self.variables.direct_original_variable(variable) {
          self.include_variable(original, ctx)?;
        }
      }
      VariableKind::Namespace(_) => {
        // A used namespace object carries the namespaces of every `export *`
        // target; the merged list is filled on first inclusion.
        let merged = match &self.variables.get(variable).kind {
          VariableKind::Namespace(namespace) if !namespace.merged_namespaces.is_empty() => {
            namespace.merged_namespaces.clone()
          }
          _ => {
            let targets = self.normal_module(owner).export_all_modules.clone();
            let mut merged = Vec::with_capacity(targets.len());
            for target in targets {
              let namespace = match &self.modules[target] {
                Module::Normal(importee) => importee.namespace_variable,
                Module::External(_) => self.external_variable(target, &"*".into()),
              };
              merged.push(namespace);
            }
            if let VariableKind::Namespace(namespace) =
              &mut self.variables.get_mut(variable).kind
            {
              namespace.merged_namespaces = merged.clone();
            }
            merged
          }
        };
        for namespace in merged {
          self.include_variable(namespace, ctx)?;
        }
        self.include_all_exports_inner(owner, false, ctx)?;
      }
      VariableKind::SyntheticNamedExport(synthetic) => {
        let base = synthetic.base;
        self.include_variable(base, ctx)?;
      }
      VariableKind::External(_) => {
        if let Module::External(external) = &mut self.modules[owner] {
          external.used = true;
        }
      }
      VariableKind::ExportShim => {}
    }

    if let Module::Normal(_) = &self.modules[owner] {
      if !self.normal_module(owner).meta.is_executed() {
        self.mark_module_and_impure_dependencies_executed(owner);
      }
      let side_effect_modules = self.get_and_extend_side_effect_modules(variable);
      for module in side_effect_modules {
        if let Module::Normal(_) = &self.modules[module] {
          if !self.normal_module(module).meta.is_executed() {
            self.mark_module_and_impure_dependencies_executed(module);
          }
        }
      }
    }
    Ok(())
  }

  /// Including a declaration keeps its surrounding statements alive: walk
  /// parent links up to the program root.
  fn include_ancestors(&mut self, module: ModuleIdx, node: NodeIdx) {
    let mut current = self.normal_module(module).ast.node(node).parent;
    while let Some(ancestor) = current {
      if !self.normal_module(module).node_included(ancestor) {
        self.normal_module_mut(module).included_nodes[ancestor] = true;
        self.request_treeshaking_pass();
      }
      current = self.normal_module(module).ast.node(ancestor).parent;
    }
    if !self.normal_module(module).program_included {
      self.normal_module_mut(module).program_included = true;
      self.request_treeshaking_pass();
    }
  }

  /// Execution reaches a module and, transitively, every statically imported
  /// dependency that may have side effects.
  pub(crate) fn mark_module_and_impure_dependencies_executed(&mut self, base: ModuleIdx) {
    let mut worklist = vec![base];
    let mut visited = FxHashSet::default();
    while let Some(idx) = worklist.pop() {
      if !visited.insert(idx) {
        continue;
      }
      let newly_executed = match self.modules[idx].as_normal_mut() {
        Some(module) if !module.meta.is_executed() => {
          module.meta.insert(ModuleMeta::EXECUTED);
          true
        }
        Some(_) => false,
        None => continue,
      };
      if newly_executed {
        self.request_treeshaking_pass();
      }
      let dependencies: Vec<ModuleIdx> = {
        let module = self.normal_module(idx);
        module
          .dependencies
          .iter()
          .copied()
          .chain(module.implicitly_loaded_before.iter().copied())
          .collect()
      };
      let implicitly_before = self.normal_module(idx).implicitly_loaded_before.clone();
      for dependency in dependencies {
        let impure = match &self.modules[dependency] {
          Module::Normal(dep) => {
            dep.side_effects.has_side_effects() || implicitly_before.contains(&dependency)
          }
          Module::External(_) => false,
        };
        if impure && !visited.contains(&dependency) {
          worklist.push(dependency);
        }
      }
    }
  }

  /// Modules whose execution is owed before `variable` can be used: the
  /// owner's recorded side-effect dependencies, extended through the
  /// default-export and synthetic chains.
  fn get_and_extend_side_effect_modules(&mut self, variable: VariableRef) -> Vec<ModuleIdx> {
    let mut side_effect_modules: Vec<ModuleIdx> = self
      .normal_module(variable.owner)
      .side_effect_dependencies_by_variable
      .get(&variable)
      .map(|modules| modules.iter().copied().collect())
      .unwrap_or_default();

    let mut referenced = FxHashSet::default();
    referenced.insert(variable);
    let mut current = variable;
    loop {
      let importing_module = current.owner;
      let next = match &self.variables.get(current).kind {
        VariableKind::ExportDefault(_) => self.variables.direct_original_variable(current),
        VariableKind::SyntheticNamedExport(synthetic) => Some(synthetic.base),
        _ => None,
      };
      let Some(next) = next else {
        break;
      };
      if !referenced.insert(next) {
        break;
      }
      side_effect_modules.push(importing_module);
      if let Some(original_side_effects) = self
        .modules[importing_module]
        .as_normal()
        .and_then(|module| module.side_effect_dependencies_by_variable.get(&next))
      {
        side_effect_modules.extend(original_side_effects.iter().copied());
      }
      current = next;
    }
    side_effect_modules
  }
}
