pub mod context;

use lop_common::{ModuleIdx, NodeIdx, VariableRef};
use lop_ecmascript::ast::{NodeKind, PropertyKind, UnaryOp};

use crate::{
  graph::Graph,
  variable::VariableKind,
};

pub use context::{EffectsContext, EntityKey, LiteralValue, ObjectPath, PathSegment, PathTracker};

impl Graph {
  /// Statement-granularity seed test: a fresh-context effects query, or the
  /// node was already included by an earlier pass.
  pub(crate) fn statement_should_be_included(&mut self, module: ModuleIdx, node: NodeIdx) -> bool {
    if self.normal_module(module).node_included(node) {
      return true;
    }
    let mut ctx = EffectsContext::default();
    self.node_has_effects(module, node, &mut ctx)
  }

  /// Whether evaluating `node` is observable: writes to unknown memory,
  /// calls of unknown values, getter reads, throws.
  pub(crate) fn node_has_effects(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    let kind_children = |graph: &Graph, node: NodeIdx| {
      let mut children = Vec::new();
      graph.normal_module(module).ast.for_each_child(node, |child| children.push(child));
      children
    };

    match self.normal_module(module).ast.kind(node) {
      NodeKind::Identifier { .. }
      | NodeKind::ThisExpression
      | NodeKind::StringLiteral { .. }
      | NodeKind::NumericLiteral { .. }
      | NodeKind::BooleanLiteral { .. }
      | NodeKind::NullLiteral
      | NodeKind::MetaProperty
      | NodeKind::EmptyStatement
      | NodeKind::BreakStatement { .. }
      | NodeKind::ContinueStatement { .. }
      | NodeKind::FunctionDeclaration(_)
      | NodeKind::FunctionExpression(_)
      | NodeKind::ArrowFunctionExpression(_)
      | NodeKind::ImportDeclaration { .. }
      | NodeKind::ExportAllDeclaration { .. }
      | NodeKind::ImportSpecifier { .. }
      | NodeKind::ImportDefaultSpecifier { .. }
      | NodeKind::ImportNamespaceSpecifier { .. }
      | NodeKind::ExportSpecifier { .. } => false,

      NodeKind::ExpressionStatement { expression } => {
        let expression = *expression;
        self.node_has_effects(module, expression, ctx)
      }
      NodeKind::LabeledStatement { body, .. } => {
        let body = *body;
        self.node_has_effects(module, body, ctx)
      }

      NodeKind::VariableDeclaration { declarations, .. } => {
        let declarations = declarations.clone();
        declarations.into_iter().any(|declarator| self.node_has_effects(module, declarator, ctx))
      }
      NodeKind::VariableDeclarator { id, init } => {
        let (id, init) = (*id, *init);
        self.pattern_has_effects(module, id, ctx)
          || init.is_some_and(|init| self.node_has_effects(module, init, ctx))
      }

      NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => {
        let super_class = class.super_class;
        let members = class.body.clone();
        if super_class.is_some_and(|super_class| self.node_has_effects(module, super_class, ctx)) {
          return true;
        }
        // Computed keys and static initializers evaluate at declaration
        // time; instance fields only at construction.
        members.into_iter().any(|member| {
          match self.normal_module(module).ast.kind(member) {
            NodeKind::MethodDefinition { key, computed, .. } => {
              let (key, computed) = (*key, *computed);
              computed && self.node_has_effects(module, key, ctx)
            }
            NodeKind::PropertyDefinition { key, value, computed, is_static } => {
              let (key, value, computed, is_static) = (*key, *value, *computed, *is_static);
              (computed && self.node_has_effects(module, key, ctx))
                || (is_static
                  && value.is_some_and(|value| self.node_has_effects(module, value, ctx)))
            }
            _ => false,
          }
        })
      }

      NodeKind::BlockStatement { body } => {
        let body = body.clone();
        body.into_iter().any(|stmt| self.node_has_effects(module, stmt, ctx))
      }

      NodeKind::IfStatement { test, consequent, alternate } => {
        let (test, consequent, alternate) = (*test, *consequent, *alternate);
        if self.node_has_effects(module, test, ctx) {
          return true;
        }
        match self.node_literal_value(module, test, &mut PathTracker::default()) {
          Some(value) => {
            let taken = if value.is_truthy() { Some(consequent) } else { alternate };
            taken.is_some_and(|taken| self.node_has_effects(module, taken, ctx))
          }
          None => {
            self.node_has_effects(module, consequent, ctx)
              || alternate.is_some_and(|alternate| self.node_has_effects(module, alternate, ctx))
          }
        }
      }

      NodeKind::ReturnStatement { argument } => {
        let argument = *argument;
        argument.is_some_and(|argument| self.node_has_effects(module, argument, ctx))
      }
      NodeKind::ThrowStatement { .. } => true,
      NodeKind::TryStatement { .. } => {
        ctx.try_depth += 1;
        let result =
          kind_children(self, node).into_iter().any(|child| self.node_has_effects(module, child, ctx));
        ctx.try_depth -= 1;
        result
      }
      NodeKind::CatchClause { body, .. } => {
        let body = *body;
        self.node_has_effects(module, body, ctx)
      }

      NodeKind::WhileStatement { test, body } => {
        let (test, body) = (*test, *body);
        self.node_has_effects(module, test, ctx) || self.node_has_effects(module, body, ctx)
      }
      NodeKind::ForStatement { .. } => kind_children(self, node)
        .into_iter()
        .any(|child| self.node_has_effects(module, child, ctx)),
      // Iterating an arbitrary value drives the iterator protocol.
      NodeKind::ForOfStatement { .. } => true,
      NodeKind::ForInStatement { .. } => kind_children(self, node)
        .into_iter()
        .any(|child| self.node_has_effects(module, child, ctx)),

      NodeKind::ExportNamedDeclaration { declaration, .. } => {
        let declaration = *declaration;
        declaration.is_some_and(|declaration| self.node_has_effects(module, declaration, ctx))
      }
      NodeKind::ExportDefaultDeclaration { declaration } => {
        let declaration = *declaration;
        self.node_has_effects(module, declaration, ctx)
      }

      NodeKind::TemplateLiteral { expressions, .. } => {
        let expressions = expressions.clone();
        expressions.into_iter().any(|expression| self.node_has_effects(module, expression, ctx))
      }
      NodeKind::SequenceExpression { expressions } => {
        let expressions = expressions.clone();
        expressions.into_iter().any(|expression| self.node_has_effects(module, expression, ctx))
      }
      NodeKind::ConditionalExpression { test, consequent, alternate } => {
        let (test, consequent, alternate) = (*test, *consequent, *alternate);
        if self.node_has_effects(module, test, ctx) {
          return true;
        }
        match self.node_literal_value(module, test, &mut PathTracker::default()) {
          Some(value) => {
            let taken = if value.is_truthy() { consequent } else { alternate };
            self.node_has_effects(module, taken, ctx)
          }
          None => {
            self.node_has_effects(module, consequent, ctx)
              || self.node_has_effects(module, alternate, ctx)
          }
        }
      }
      NodeKind::LogicalExpression { operator, left, right } => {
        let (operator, left, right) = (*operator, *left, *right);
        if self.node_has_effects(module, left, ctx) {
          return true;
        }
        match self.node_literal_value(module, left, &mut PathTracker::default()) {
          Some(value) => {
            let take_right = match operator {
              lop_ecmascript::ast::LogicalOp::And => value.is_truthy(),
              lop_ecmascript::ast::LogicalOp::Or => !value.is_truthy(),
              lop_ecmascript::ast::LogicalOp::Nullish => {
                matches!(value, LiteralValue::Null | LiteralValue::Undefined)
              }
            };
            take_right && self.node_has_effects(module, right, ctx)
          }
          None => self.node_has_effects(module, right, ctx),
        }
      }
      NodeKind::BinaryExpression { left, right, .. } => {
        let (left, right) = (*left, *right);
        self.node_has_effects(module, left, ctx) || self.node_has_effects(module, right, ctx)
      }
      NodeKind::UnaryExpression { operator, argument } => {
        let (operator, argument) = (*operator, *argument);
        match operator {
          // Deleting deoptimizes whatever it touches.
          UnaryOp::Delete => true,
          _ => self.node_has_effects(module, argument, ctx),
        }
      }
      NodeKind::AwaitExpression { .. } => true,
      NodeKind::UpdateExpression { argument, .. } => {
        let argument = *argument;
        self.assignment_target_has_effects(module, argument, ctx)
      }
      NodeKind::AssignmentExpression { left, right, .. } => {
        let (left, right) = (*left, *right);
        self.assignment_target_has_effects(module, left, ctx)
          || self.node_has_effects(module, right, ctx)
      }

      NodeKind::MemberExpression { .. } => self.member_access_has_effects(module, node, ctx),

      NodeKind::CallExpression { callee, arguments, .. } => {
        let (callee, arguments) = (*callee, arguments.clone());
        if arguments.into_iter().any(|argument| self.node_has_effects(module, argument, ctx)) {
          return true;
        }
        self.call_has_effects(module, node, callee, ctx)
      }
      NodeKind::NewExpression { callee, arguments } => {
        let (callee, arguments) = (*callee, arguments.clone());
        if arguments.into_iter().any(|argument| self.node_has_effects(module, argument, ctx)) {
          return true;
        }
        self.call_has_effects(module, node, callee, ctx)
      }
      NodeKind::ImportExpression { .. } => true,

      NodeKind::ObjectExpression { properties } => {
        let properties = properties.clone();
        properties.into_iter().any(|property| {
          match self.normal_module(module).ast.kind(property) {
            NodeKind::Property { key, value, computed, .. } => {
              let (key, value, computed) = (*key, *value, *computed);
              (computed && self.node_has_effects(module, key, ctx))
                || self.node_has_effects(module, value, ctx)
            }
            // Spreading drives getters on the spread object.
            NodeKind::SpreadElement { argument } => {
              let argument = *argument;
              self.spread_has_effects(module, argument, ctx)
            }
            _ => false,
          }
        })
      }
      NodeKind::ArrayExpression { elements } => {
        let elements = elements.clone();
        elements.into_iter().flatten().any(|element| {
          match self.normal_module(module).ast.kind(element) {
            NodeKind::SpreadElement { argument } => {
              let argument = *argument;
              self.spread_has_effects(module, argument, ctx)
            }
            _ => self.node_has_effects(module, element, ctx),
          }
        })
      }
      NodeKind::Property { key, value, computed, .. } => {
        let (key, value, computed) = (*key, *value, *computed);
        (computed && self.node_has_effects(module, key, ctx))
          || self.node_has_effects(module, value, ctx)
      }
      NodeKind::SpreadElement { argument } => {
        let argument = *argument;
        self.spread_has_effects(module, argument, ctx)
      }

      NodeKind::ObjectPattern { .. }
      | NodeKind::ArrayPattern { .. }
      | NodeKind::AssignmentPattern { .. }
      | NodeKind::RestElement { .. } => self.pattern_has_effects(module, node, ctx),

      NodeKind::MethodDefinition { key, computed, .. } => {
        let (key, computed) = (*key, *computed);
        computed && self.node_has_effects(module, key, ctx)
      }
      NodeKind::PropertyDefinition { key, value, computed, .. } => {
        let (key, value, computed) = (*key, *value, *computed);
        (computed && self.node_has_effects(module, key, ctx))
          || value.is_some_and(|value| self.node_has_effects(module, value, ctx))
      }
    }
  }

  /// Destructuring defaults and computed keys are the only effectful parts
  /// of a binding pattern.
  fn pattern_has_effects(
    &mut self,
    module: ModuleIdx,
    pattern: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    match self.normal_module(module).ast.kind(pattern) {
      NodeKind::AssignmentPattern { left, right } => {
        let (left, right) = (*left, *right);
        self.node_has_effects(module, right, ctx) || self.pattern_has_effects(module, left, ctx)
      }
      NodeKind::ObjectPattern { properties } => {
        let properties = properties.clone();
        properties.into_iter().any(|property| {
          match self.normal_module(module).ast.kind(property) {
            NodeKind::Property { key, value, computed, .. } => {
              let (key, value, computed) = (*key, *value, *computed);
              (computed && self.node_has_effects(module, key, ctx))
                || self.pattern_has_effects(module, value, ctx)
            }
            NodeKind::RestElement { argument } => {
              let argument = *argument;
              self.pattern_has_effects(module, argument, ctx)
            }
            _ => false,
          }
        })
      }
      NodeKind::ArrayPattern { elements } => {
        let elements = elements.clone();
        elements
          .into_iter()
          .flatten()
          .any(|element| self.pattern_has_effects(module, element, ctx))
      }
      NodeKind::RestElement { argument } => {
        let argument = *argument;
        self.pattern_has_effects(module, argument, ctx)
      }
      _ => false,
    }
  }

  fn spread_has_effects(
    &mut self,
    module: ModuleIdx,
    argument: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    // Spreading a literal array is transparent; anything else may run
    // iterator or getter code.
    match self.normal_module(module).ast.kind(argument) {
      NodeKind::ArrayExpression { .. } | NodeKind::ObjectExpression { .. } => {
        self.node_has_effects(module, argument, ctx)
      }
      _ => true,
    }
  }

  /// Writing through `target`. Plain writes to tracked bindings are silent
  /// (inclusion tracks them); anything reaching unknown memory is an effect.
  fn assignment_target_has_effects(
    &mut self,
    module: ModuleIdx,
    target: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    match self.normal_module(module).ast.kind(target) {
      NodeKind::Identifier { .. } => match self.resolve_identifier(module, target) {
        // A write only matters once the binding itself survives.
        Some(variable) => self.variables.get(variable).included,
        // Assigning an unresolved (global) name writes global state.
        None => !self.identifier_is_local_binding(module, target),
      },
      NodeKind::MemberExpression { object, property, computed, .. } => {
        let (object, property, computed) = (*object, *property, *computed);
        if computed && self.node_has_effects(module, property, ctx) {
          return true;
        }
        match self.member_base_variable(module, object) {
          Some(base) => {
            let path = self.member_path_segment(module, property, computed);
            if !ctx.assigned.enter(EntityKey::Variable(base), &[path]) {
              return false;
            }
            let variable = self.variables.get(base);
            match &variable.kind {
              // Writing into a tracked local object is observable once that
              // object is kept or escapes through reassignment.
              VariableKind::Local(_) => variable.included || variable.is_reassigned,
              _ => true,
            }
          }
          None => true,
        }
      }
      _ => true,
    }
  }

  /// Reading `object.property`: a getter on an unknown base is observable.
  fn member_access_has_effects(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    let NodeKind::MemberExpression { object, property, computed, .. } =
      self.normal_module(module).ast.kind(node)
    else {
      return true;
    };
    let (object, property, computed) = (*object, *property, *computed);
    if computed && self.node_has_effects(module, property, ctx) {
      return true;
    }
    if self.node_has_effects(module, object, ctx) {
      return true;
    }
    let path = self.member_path_segment(module, property, computed);
    match self.member_base_variable(module, object) {
      Some(base) => self.variable_has_effects_when_accessed(base, &[path], ctx),
      // Unknown base: assume the read can run a getter.
      None => true,
    }
  }

  fn member_path_segment(
    &self,
    module: ModuleIdx,
    property: NodeIdx,
    computed: bool,
  ) -> PathSegment {
    match self.normal_module(module).ast.kind(property) {
      NodeKind::Identifier { name } if !computed => PathSegment::Key(name.clone()),
      NodeKind::StringLiteral { value } => PathSegment::Key(value.clone()),
      _ => PathSegment::Unknown,
    }
  }

  /// The module-level variable a member chain is rooted in, if the chain is
  /// statically resolvable.
  fn member_base_variable(&mut self, module: ModuleIdx, object: NodeIdx) -> Option<VariableRef> {
    match self.normal_module(module).ast.kind(object) {
      NodeKind::Identifier { .. } => self.resolve_identifier(module, object),
      _ => None,
    }
  }

  pub(crate) fn resolve_identifier(
    &self,
    module: ModuleIdx,
    node: NodeIdx,
  ) -> Option<VariableRef> {
    self.normal_module(module).reference_bindings.get(&node).copied()
  }

  /// Whether the identifier is shadowed by a nested scope; those never have
  /// module-level meaning.
  fn identifier_is_local_binding(&self, module: ModuleIdx, node: NodeIdx) -> bool {
    self.normal_module(module).shadowed_references.contains(&node)
  }

  fn call_has_effects(
    &mut self,
    module: ModuleIdx,
    call: NodeIdx,
    callee: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    if ctx.try_depth > 0 {
      // Calls inside a `try` block are never treeshaken; the catch path must
      // stay observable.
      return true;
    }
    if !ctx.called.insert((module, call)) {
      // Already analysing this call site; recursion is not a new effect.
      return false;
    }
    match self.normal_module(module).ast.kind(callee) {
      NodeKind::Identifier { .. } => match self.resolve_identifier(module, callee) {
        Some(variable) => self.variable_has_effects_when_called(variable, ctx),
        // Shadowed names are locals of unknown value; bare unknown globals
        // are impure.
        None => true,
      },
      NodeKind::FunctionExpression(_) | NodeKind::ArrowFunctionExpression(_) => {
        self.function_body_has_effects(module, callee, ctx)
      }
      NodeKind::SequenceExpression { expressions } => {
        let last = expressions.last().copied();
        match last {
          Some(last) => {
            self.node_has_effects(module, callee, ctx)
              || self.call_has_effects(module, call, last, ctx)
          }
          None => true,
        }
      }
      // Member calls and computed callees stay opaque.
      _ => true,
    }
  }

  pub(crate) fn variable_has_effects_when_called(
    &mut self,
    variable: VariableRef,
    ctx: &mut EffectsContext,
  ) -> bool {
    if self.variables.get(variable).is_reassigned {
      return true;
    }
    match &self.variables.get(variable).kind {
      VariableKind::Local(local) => {
        let candidate = local.init.or_else(|| local.declarations.first().copied());
        match candidate {
          Some(node) => self.callable_node_has_effects(variable.owner, node, ctx),
          None => true,
        }
      }
      VariableKind::ExportDefault(_) => {
        if let Some(original) = self.variables.direct_original_variable(variable) {
          return self.variable_has_effects_when_called(original, ctx);
        }
        let VariableKind::ExportDefault(default) = &self.variables.get(variable).kind else {
          return true;
        };
        let declaration = default.declaration;
        self.callable_node_has_effects(variable.owner, declaration, ctx)
      }
      VariableKind::Namespace(_)
      | VariableKind::External(_)
      | VariableKind::SyntheticNamedExport(_)
      | VariableKind::ExportShim => true,
    }
  }

  /// Dig through declaration wrappers to the function/class being called.
  fn callable_node_has_effects(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    match self.normal_module(module).ast.kind(node) {
      NodeKind::FunctionDeclaration(_)
      | NodeKind::FunctionExpression(_)
      | NodeKind::ArrowFunctionExpression(_) => self.function_body_has_effects(module, node, ctx),
      NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => {
        let super_class = class.super_class;
        let members = class.body.clone();
        if super_class.is_some_and(|super_class| self.node_has_effects(module, super_class, ctx)) {
          return true;
        }
        members.into_iter().any(|member| {
          match self.normal_module(module).ast.kind(member) {
            NodeKind::MethodDefinition { key, value, .. } => {
              let is_constructor = matches!(
                self.normal_module(module).ast.kind(*key),
                NodeKind::Identifier { name } if name.as_str() == "constructor"
              );
              let value = *value;
              is_constructor && self.function_body_has_effects(module, value, ctx)
            }
            NodeKind::PropertyDefinition { value, is_static: false, .. } => {
              let value = *value;
              value.is_some_and(|value| self.node_has_effects(module, value, ctx))
            }
            _ => false,
          }
        })
      }
      NodeKind::ExportDefaultDeclaration { declaration } => {
        let declaration = *declaration;
        self.callable_node_has_effects(module, declaration, ctx)
      }
      NodeKind::VariableDeclarator { init: Some(init), .. } => {
        let init = *init;
        self.callable_node_has_effects(module, init, ctx)
      }
      _ => true,
    }
  }

  fn function_body_has_effects(
    &mut self,
    module: ModuleIdx,
    function: NodeIdx,
    ctx: &mut EffectsContext,
  ) -> bool {
    if !ctx.called.insert((module, function)) {
      return false;
    }
    let (params, body) = match self.normal_module(module).ast.kind(function) {
      NodeKind::FunctionDeclaration(func)
      | NodeKind::FunctionExpression(func)
      | NodeKind::ArrowFunctionExpression(func) => (func.params.clone(), func.body),
      _ => return true,
    };
    if params.into_iter().any(|param| self.pattern_has_effects(module, param, ctx)) {
      return true;
    }
    self.node_has_effects(module, body, ctx)
  }

  /// Access effects through a resolved binding at `path`.
  pub(crate) fn variable_has_effects_when_accessed(
    &mut self,
    variable: VariableRef,
    path: &[PathSegment],
    ctx: &mut EffectsContext,
  ) -> bool {
    if path.is_empty() {
      return false;
    }
    if !ctx.accessed.enter(EntityKey::Variable(variable), path) {
      return false;
    }
    let info = self.variables.get(variable);
    if info.is_reassigned {
      return true;
    }
    match &info.kind {
      // Namespace member reads resolve statically, no getters involved.
      VariableKind::Namespace(_) => false,
      VariableKind::ExportShim => false,
      VariableKind::SyntheticNamedExport(_) => false,
      // External shapes are unknowable but plain property reads on an
      // imported binding are conventionally treated as safe.
      VariableKind::External(_) => false,
      VariableKind::ExportDefault(_) => match self.variables.direct_original_variable(variable) {
        Some(original) => self.variable_has_effects_when_accessed(original, path, ctx),
        None => false,
      },
      VariableKind::Local(local) => match local.init {
        Some(init) => self.object_access_has_effects(variable.owner, init, path, ctx),
        None => true,
      },
    }
  }

  /// Path access into a known initializer: object literals without getters
  /// are transparent, everything else is conservative.
  fn object_access_has_effects(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    path: &[PathSegment],
    ctx: &mut EffectsContext,
  ) -> bool {
    match self.normal_module(module).ast.kind(node) {
      NodeKind::ObjectExpression { properties } => {
        let properties = properties.clone();
        properties.into_iter().any(|property| {
          matches!(
            self.normal_module(module).ast.kind(property),
            NodeKind::Property { kind: PropertyKind::Get | PropertyKind::Set, .. }
              | NodeKind::SpreadElement { .. }
          )
        })
      }
      NodeKind::ArrayExpression { .. }
      | NodeKind::FunctionExpression(_)
      | NodeKind::ArrowFunctionExpression(_)
      | NodeKind::StringLiteral { .. }
      | NodeKind::NumericLiteral { .. }
      | NodeKind::BooleanLiteral { .. }
      | NodeKind::NullLiteral => false,
      NodeKind::Identifier { .. } => match self.resolve_identifier(module, node) {
        Some(variable) => self.variable_has_effects_when_accessed(variable, path, ctx),
        None => true,
      },
      _ => true,
    }
  }

  /// Literal probing; `None` is "unknown". Threads `tracker` so cyclic
  /// initializer chains return the unknown sentinel instead of recursing.
  pub(crate) fn node_literal_value(
    &mut self,
    module: ModuleIdx,
    node: NodeIdx,
    tracker: &mut PathTracker,
  ) -> Option<LiteralValue> {
    match self.normal_module(module).ast.kind(node) {
      NodeKind::StringLiteral { value } => Some(LiteralValue::String(value.clone())),
      NodeKind::NumericLiteral { value } => Some(LiteralValue::Number(*value)),
      NodeKind::BooleanLiteral { value } => Some(LiteralValue::Boolean(*value)),
      NodeKind::NullLiteral => Some(LiteralValue::Null),
      NodeKind::SequenceExpression { expressions } => {
        let last = expressions.last().copied()?;
        self.node_literal_value(module, last, tracker)
      }
      NodeKind::UnaryExpression { operator, argument } => {
        let (operator, argument) = (*operator, *argument);
        let value = self.node_literal_value(module, argument, tracker);
        match operator {
          UnaryOp::Not => value.map(|value| LiteralValue::Boolean(!value.is_truthy())),
          UnaryOp::Void => Some(LiteralValue::Undefined),
          UnaryOp::Minus => match value {
            Some(LiteralValue::Number(number)) => Some(LiteralValue::Number(-number)),
            _ => None,
          },
          _ => None,
        }
      }
      NodeKind::LogicalExpression { operator, left, right } => {
        let (operator, left, right) = (*operator, *left, *right);
        let left_value = self.node_literal_value(module, left, tracker)?;
        let take_right = match operator {
          lop_ecmascript::ast::LogicalOp::And => left_value.is_truthy(),
          lop_ecmascript::ast::LogicalOp::Or => !left_value.is_truthy(),
          lop_ecmascript::ast::LogicalOp::Nullish => {
            matches!(left_value, LiteralValue::Null | LiteralValue::Undefined)
          }
        };
        if take_right {
          self.node_literal_value(module, right, tracker)
        } else {
          Some(left_value)
        }
      }
      NodeKind::ConditionalExpression { test, consequent, alternate } => {
        let (test, consequent, alternate) = (*test, *consequent, *alternate);
        let test_value = self.node_literal_value(module, test, tracker)?;
        let taken = if test_value.is_truthy() { consequent } else { alternate };
        self.node_literal_value(module, taken, tracker)
      }
      NodeKind::Identifier { .. } => {
        let variable = self.resolve_identifier(module, node)?;
        self.variable_literal_value(variable, tracker)
      }
      NodeKind::CallExpression { callee, .. } => {
        let callee = *callee;
        if !tracker.enter(EntityKey::Node(module, node), &[]) {
          return None;
        }
        let variable = match self.normal_module(module).ast.kind(callee) {
          NodeKind::Identifier { .. } => self.resolve_identifier(module, callee)?,
          _ => return None,
        };
        let (owner, returned) = self.return_expression_when_called(variable)?;
        self.node_literal_value(owner, returned, tracker)
      }
      _ => None,
    }
  }

  /// What a call through `variable` evaluates to, for trivially analysable
  /// callables: a concise arrow body or a lone `return` statement. `None` is
  /// the unknown sentinel.
  pub(crate) fn return_expression_when_called(
    &mut self,
    variable: VariableRef,
  ) -> Option<(ModuleIdx, NodeIdx)> {
    let info = self.variables.get(variable);
    if info.is_reassigned {
      return None;
    }
    let callable = match &info.kind {
      VariableKind::Local(local) => local.init.or_else(|| local.declarations.first().copied())?,
      VariableKind::ExportDefault(default) => {
        let declaration = default.declaration;
        if let Some(original) = self.variables.direct_original_variable(variable) {
          return self.return_expression_when_called(original);
        }
        declaration
      }
      _ => return None,
    };
    self.callable_return_expression(variable.owner, callable)
  }

  fn callable_return_expression(
    &self,
    module: ModuleIdx,
    callable: NodeIdx,
  ) -> Option<(ModuleIdx, NodeIdx)> {
    let ast = &self.normal_module(module).ast;
    let function = match ast.kind(callable) {
      NodeKind::FunctionDeclaration(function)
      | NodeKind::FunctionExpression(function)
      | NodeKind::ArrowFunctionExpression(function) => function,
      NodeKind::ExportDefaultDeclaration { declaration } => {
        return self.callable_return_expression(module, *declaration);
      }
      NodeKind::VariableDeclarator { init: Some(init), .. } => {
        return self.callable_return_expression(module, *init);
      }
      _ => return None,
    };
    match ast.kind(function.body) {
      NodeKind::BlockStatement { body } => match body.as_slice() {
        [stmt] => match ast.kind(*stmt) {
          NodeKind::ReturnStatement { argument: Some(argument) } => Some((module, *argument)),
          _ => None,
        },
        _ => None,
      },
      _ => Some((module, function.body)),
    }
  }

  pub(crate) fn variable_literal_value(
    &mut self,
    variable: VariableRef,
    tracker: &mut PathTracker,
  ) -> Option<LiteralValue> {
    if !tracker.enter(EntityKey::Variable(variable), &[]) {
      return None;
    }
    let init = {
      let info = self.variables.get_mut(variable);
      if info.is_reassigned || info.has_deoptimized_path {
        return None;
      }
      info.literal_probed = true;
      match &info.kind {
        VariableKind::Local(local) => local.init,
        _ => None,
      }
    }?;
    self.node_literal_value(variable.owner, init, tracker)
  }
}
