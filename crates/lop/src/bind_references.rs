use lop_common::{ModuleIdx, NodeIdx};
use lop_ecmascript::ast::{NodeKind, Program};
use lop_utils::rstr::Rstr;
use rustc_hash::FxHashSet;

use crate::{graph::Graph, variable::VariableKind};

#[derive(Debug, Clone, Copy)]
enum WriteKind {
  /// Plain reassignment of the binding itself.
  EmptyPath,
  /// A write somewhere below the binding (`obj.a = ...`).
  DeepPath,
}

#[derive(Default)]
struct CollectOutput {
  references: Vec<(NodeIdx, Rstr, Option<WriteKind>)>,
  shadowed: FxHashSet<NodeIdx>,
}

/// Scope-stack walk that finds every identifier with potential module-level
/// meaning. Nested function/block scopes shadow; shadowed identifiers are
/// recorded so later queries know they are locals.
struct ReferenceCollector<'a> {
  ast: &'a Program,
  scopes: Vec<FxHashSet<Rstr>>,
  out: CollectOutput,
}

impl<'a> ReferenceCollector<'a> {
  fn collect(ast: &'a Program) -> CollectOutput {
    let mut collector = Self { ast, scopes: Vec::new(), out: CollectOutput::default() };
    for stmt in &ast.body {
      collector.walk_statement(*stmt);
    }
    collector.out
  }

  fn is_shadowed(&self, name: &str) -> bool {
    self.scopes.iter().rev().any(|scope| scope.contains(name))
  }

  fn reference(&mut self, node: NodeIdx, name: &Rstr, write: Option<WriteKind>) {
    if self.is_shadowed(name) {
      self.out.shadowed.insert(node);
    } else {
      self.out.references.push((node, name.clone(), write));
    }
  }

  fn declare(&mut self, name: &Rstr) {
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(name.clone());
    }
    // At the top level the module scope itself owns the binding.
  }

  fn declare_pattern(&mut self, pattern: NodeIdx) {
    let mut names = Vec::new();
    self.ast.collect_pattern_names(pattern, &mut names);
    for (name, _) in names {
      self.declare(&name);
    }
  }

  /// Names introduced by the direct statements of a body, visible from its
  /// start (hoisting, approximated at one block depth).
  fn hoist_declarations(&mut self, body: &[NodeIdx]) {
    let mut declared: Vec<Rstr> = Vec::new();
    for stmt in body {
      match self.ast.kind(*stmt) {
        NodeKind::VariableDeclaration { declarations, .. } => {
          for declarator in declarations {
            if let NodeKind::VariableDeclarator { id, .. } = self.ast.kind(*declarator) {
              let mut names = Vec::new();
              self.ast.collect_pattern_names(*id, &mut names);
              declared.extend(names.into_iter().map(|(name, _)| name));
            }
          }
        }
        NodeKind::FunctionDeclaration(function) => {
          if let Some(id) = function.id {
            if let NodeKind::Identifier { name } = self.ast.kind(id) {
              declared.push(name.clone());
            }
          }
        }
        NodeKind::ClassDeclaration(class) => {
          if let Some(id) = class.id {
            if let NodeKind::Identifier { name } = self.ast.kind(id) {
              declared.push(name.clone());
            }
          }
        }
        _ => {}
      }
    }
    for name in declared {
      self.declare(&name);
    }
  }

  fn walk_function(&mut self, function: &lop_ecmascript::ast::Function) {
    self.scopes.push(FxHashSet::default());
    for param in &function.params {
      self.declare_pattern(*param);
    }
    for param in &function.params {
      self.walk_pattern_expressions(*param);
    }
    match self.ast.kind(function.body) {
      NodeKind::BlockStatement { body } => {
        let body = body.clone();
        self.hoist_declarations(&body);
        for stmt in body {
          self.walk_statement(stmt);
        }
      }
      _ => self.walk_expression(function.body),
    }
    self.scopes.pop();
  }

  /// Defaults and computed keys inside binding patterns are expressions.
  fn walk_pattern_expressions(&mut self, pattern: NodeIdx) {
    match self.ast.kind(pattern) {
      NodeKind::AssignmentPattern { left, right } => {
        let (left, right) = (*left, *right);
        self.walk_expression(right);
        self.walk_pattern_expressions(left);
      }
      NodeKind::ObjectPattern { properties } => {
        for property in properties.clone() {
          match self.ast.kind(property) {
            NodeKind::Property { key, value, computed, .. } => {
              let (key, value, computed) = (*key, *value, *computed);
              if computed {
                self.walk_expression(key);
              }
              self.walk_pattern_expressions(value);
            }
            NodeKind::RestElement { argument } => {
              let argument = *argument;
              self.walk_pattern_expressions(argument);
            }
            _ => {}
          }
        }
      }
      NodeKind::ArrayPattern { elements } => {
        for element in elements.clone().into_iter().flatten() {
          self.walk_pattern_expressions(element);
        }
      }
      NodeKind::RestElement { argument } => {
        let argument = *argument;
        self.walk_pattern_expressions(argument);
      }
      _ => {}
    }
  }

  fn walk_class(&mut self, class: &lop_ecmascript::ast::Class) {
    if let Some(super_class) = class.super_class {
      self.walk_expression(super_class);
    }
    self.scopes.push(FxHashSet::default());
    if let Some(id) = class.id {
      if let NodeKind::Identifier { name } = self.ast.kind(id) {
        let name = name.clone();
        self.declare(&name);
      }
    }
    for member in class.body.clone() {
      match self.ast.kind(member) {
        NodeKind::MethodDefinition { key, value, computed, .. } => {
          let (key, value, computed) = (*key, *value, *computed);
          if computed {
            self.walk_expression(key);
          }
          self.walk_expression(value);
        }
        NodeKind::PropertyDefinition { key, value, computed, .. } => {
          let (key, value, computed) = (*key, *value, *computed);
          if computed {
            self.walk_expression(key);
          }
          if let Some(value) = value {
            self.walk_expression(value);
          }
        }
        _ => {}
      }
    }
    self.scopes.pop();
  }

  fn walk_statement(&mut self, stmt: NodeIdx) {
    match self.ast.kind(stmt) {
      NodeKind::ExpressionStatement { expression } => {
        let expression = *expression;
        self.walk_expression(expression);
      }
      NodeKind::VariableDeclaration { declarations, .. } => {
        for declarator in declarations.clone() {
          let NodeKind::VariableDeclarator { id, init } = self.ast.kind(declarator) else {
            continue;
          };
          let (id, init) = (*id, *init);
          self.declare_pattern(id);
          self.walk_pattern_expressions(id);
          if let Some(init) = init {
            self.walk_expression(init);
          }
        }
      }
      NodeKind::FunctionDeclaration(_) => {
        let ast = self.ast;
        if let NodeKind::FunctionDeclaration(function) = ast.kind(stmt) {
          self.walk_function(function);
        }
      }
      NodeKind::ClassDeclaration(_) => {
        let ast = self.ast;
        if let NodeKind::ClassDeclaration(class) = ast.kind(stmt) {
          self.walk_class(class);
        }
      }
      NodeKind::BlockStatement { body } => {
        let body = body.clone();
        self.scopes.push(FxHashSet::default());
        self.hoist_declarations(&body);
        for stmt in body {
          self.walk_statement(stmt);
        }
        self.scopes.pop();
      }
      NodeKind::IfStatement { test, consequent, alternate } => {
        let (test, consequent, alternate) = (*test, *consequent, *alternate);
        self.walk_expression(test);
        self.walk_statement(consequent);
        if let Some(alternate) = alternate {
          self.walk_statement(alternate);
        }
      }
      NodeKind::ReturnStatement { argument } => {
        if let Some(argument) = *argument {
          self.walk_expression(argument);
        }
      }
      NodeKind::ThrowStatement { argument } => {
        let argument = *argument;
        self.walk_expression(argument);
      }
      NodeKind::TryStatement { block, handler, finalizer } => {
        let (block, handler, finalizer) = (*block, *handler, *finalizer);
        self.walk_statement(block);
        if let Some(handler) = handler {
          if let NodeKind::CatchClause { param, body } = self.ast.kind(handler) {
            let (param, body) = (*param, *body);
            self.scopes.push(FxHashSet::default());
            if let Some(param) = param {
              self.declare_pattern(param);
            }
            self.walk_statement(body);
            self.scopes.pop();
          }
        }
        if let Some(finalizer) = finalizer {
          self.walk_statement(finalizer);
        }
      }
      NodeKind::WhileStatement { test, body } => {
        let (test, body) = (*test, *body);
        self.walk_expression(test);
        self.walk_statement(body);
      }
      NodeKind::ForStatement { init, test, update, body } => {
        let (init, test, update, body) = (*init, *test, *update, *body);
        self.scopes.push(FxHashSet::default());
        if let Some(init) = init {
          match self.ast.kind(init) {
            NodeKind::VariableDeclaration { .. } => self.walk_statement(init),
            _ => self.walk_expression(init),
          }
        }
        if let Some(test) = test {
          self.walk_expression(test);
        }
        if let Some(update) = update {
          self.walk_expression(update);
        }
        self.walk_statement(body);
        self.scopes.pop();
      }
      NodeKind::ForInStatement { left, right, body }
      | NodeKind::ForOfStatement { left, right, body, .. } => {
        let (left, right, body) = (*left, *right, *body);
        self.scopes.push(FxHashSet::default());
        match self.ast.kind(left) {
          NodeKind::VariableDeclaration { .. } => self.walk_statement(left),
          _ => self.walk_assignment_target(left),
        }
        self.walk_expression(right);
        self.walk_statement(body);
        self.scopes.pop();
      }
      NodeKind::LabeledStatement { body, .. } => {
        let body = *body;
        self.walk_statement(body);
      }
      NodeKind::ExportNamedDeclaration { declaration, .. } => {
        if let Some(declaration) = *declaration {
          self.walk_statement(declaration);
        }
      }
      NodeKind::ExportDefaultDeclaration { declaration } => {
        let declaration = *declaration;
        match self.ast.kind(declaration) {
          NodeKind::FunctionDeclaration(_) | NodeKind::ClassDeclaration(_) => {
            self.walk_statement(declaration);
          }
          _ => self.walk_expression(declaration),
        }
      }
      NodeKind::ImportDeclaration { .. }
      | NodeKind::ExportAllDeclaration { .. }
      | NodeKind::EmptyStatement
      | NodeKind::BreakStatement { .. }
      | NodeKind::ContinueStatement { .. } => {}
      _ => {
        // Expression used in statement position.
        self.walk_expression(stmt);
      }
    }
  }

  fn walk_assignment_target(&mut self, target: NodeIdx) {
    match self.ast.kind(target) {
      NodeKind::Identifier { name } => {
        let name = name.clone();
        self.reference(target, &name, Some(WriteKind::EmptyPath));
      }
      NodeKind::MemberExpression { object, property, computed, .. } => {
        let (object, property, computed) = (*object, *property, *computed);
        if computed {
          self.walk_expression(property);
        }
        // The base is read, and its sub-path deoptimized.
        match self.ast.kind(object) {
          NodeKind::Identifier { name } => {
            let name = name.clone();
            self.reference(object, &name, Some(WriteKind::DeepPath));
          }
          _ => self.walk_expression(object),
        }
      }
      NodeKind::ObjectPattern { .. } | NodeKind::ArrayPattern { .. } => {
        let mut names = Vec::new();
        self.ast.collect_pattern_names(target, &mut names);
        for (name, node) in names {
          self.reference(node, &name, Some(WriteKind::EmptyPath));
        }
      }
      _ => self.walk_expression(target),
    }
  }

  fn walk_expression(&mut self, node: NodeIdx) {
    match self.ast.kind(node) {
      NodeKind::Identifier { name } => {
        let name = name.clone();
        self.reference(node, &name, None);
      }
      NodeKind::MemberExpression { object, property, computed, .. } => {
        let (object, property, computed) = (*object, *property, *computed);
        self.walk_expression(object);
        if computed {
          self.walk_expression(property);
        }
      }
      NodeKind::AssignmentExpression { left, right, .. } => {
        let (left, right) = (*left, *right);
        self.walk_assignment_target(left);
        self.walk_expression(right);
      }
      NodeKind::UpdateExpression { argument, .. } => {
        let argument = *argument;
        self.walk_assignment_target(argument);
      }
      NodeKind::FunctionExpression(_) | NodeKind::ArrowFunctionExpression(_) => {
        let ast = self.ast;
        if let NodeKind::FunctionExpression(function) | NodeKind::ArrowFunctionExpression(function) =
          ast.kind(node)
        {
          self.walk_function(function);
        }
      }
      NodeKind::ClassExpression(_) => {
        let ast = self.ast;
        if let NodeKind::ClassExpression(class) = ast.kind(node) {
          self.walk_class(class);
        }
      }
      NodeKind::Property { key, value, computed, .. } => {
        let (key, value, computed) = (*key, *value, *computed);
        if computed {
          self.walk_expression(key);
        }
        self.walk_expression(value);
      }
      _ => {
        let mut children = Vec::new();
        self.ast.for_each_child(node, |child| children.push(child));
        for child in children {
          self.walk_expression(child);
        }
      }
    }
  }
}

impl Graph {
  /// Attach every module-level identifier reference to its variable; apply
  /// reassignment deoptimizations; resolve pending default-export aliases.
  pub(crate) fn bind_references(&mut self) {
    let indices: Vec<ModuleIdx> =
      self.modules.indices().filter(|idx| self.modules[*idx].as_normal().is_some()).collect();

    for idx in indices {
      let collected = ReferenceCollector::collect(&self.normal_module(idx).ast);
      self.normal_module_mut(idx).shadowed_references = collected.shadowed;

      for (node, name, write) in collected.references {
        let resolution = match self.trace_variable(idx, &name) {
          Ok(resolution) => resolution,
          Err(error) => {
            self.errors.extend(error.0);
            continue;
          }
        };
        let Some(variable) = resolution else {
          continue;
        };
        let module = self.normal_module_mut(idx);
        module.reference_bindings.insert(node, variable);
        if variable.owner != idx {
          module.imports.insert(variable);
        }
        match write {
          Some(WriteKind::EmptyPath) => {
            let info = self.variables.get_mut(variable);
            info.is_reassigned = true;
            info.has_deoptimized_path = true;
          }
          Some(WriteKind::DeepPath) => {
            self.variables.get_mut(variable).has_deoptimized_path = true;
          }
          None => {}
        }
      }

      // `export default foo` where `foo` is itself imported.
      if let Some((default_var, alias)) = self.normal_module(idx).default_alias.clone() {
        let unresolved = self.variables.direct_original_variable(default_var).is_none();
        if unresolved {
          if let Ok(Some(variable)) = self.trace_variable(idx, &alias) {
            if let VariableKind::ExportDefault(default) =
              &mut self.variables.get_mut(default_var).kind
            {
              default.referenced_local = Some(variable);
            }
          }
        }
      }
    }
  }
}
