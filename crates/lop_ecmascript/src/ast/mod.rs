mod builder;

use lop_common::{NodeIdx, Span};
use lop_utils::rstr::Rstr;
use oxc_index::IndexVec;

pub use builder::AstBuilder;

/// One parsed module. Nodes live in a flat arena addressed by `NodeIdx`;
/// `body` lists the top-level statements in source order. Parent links are
/// filled by [`Program::link_parents`] once parsing is done.
#[derive(Debug, Default)]
pub struct Program {
  pub span: Span,
  pub body: Vec<NodeIdx>,
  pub nodes: IndexVec<NodeIdx, Node>,
}

#[derive(Debug)]
pub struct Node {
  pub span: Span,
  pub parent: Option<NodeIdx>,
  pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDeclKind {
  Var,
  Let,
  Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Minus,
  Plus,
  Not,
  BitNot,
  Typeof,
  Void,
  Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  EqEq,
  NotEq,
  StrictEq,
  StrictNotEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  BitOr,
  BitXor,
  BitAnd,
  Shl,
  Shr,
  UShr,
  In,
  Instanceof,
  Exp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
  And,
  Or,
  Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
  /// `=`
  Assign,
  /// `+=`, `-=`, `&&=`, ... — reads the target before writing it.
  Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
  Init,
  Get,
  Set,
}

/// The tagged union every analysis dispatches over. Statements, expressions
/// and binding patterns share one arena; context decides which subset is
/// legal where.
#[derive(Debug)]
pub enum NodeKind {
  // Statements
  ExpressionStatement { expression: NodeIdx },
  VariableDeclaration { kind: VarDeclKind, declarations: Vec<NodeIdx> },
  VariableDeclarator { id: NodeIdx, init: Option<NodeIdx> },
  FunctionDeclaration(Function),
  ClassDeclaration(Class),
  BlockStatement { body: Vec<NodeIdx> },
  IfStatement { test: NodeIdx, consequent: NodeIdx, alternate: Option<NodeIdx> },
  ReturnStatement { argument: Option<NodeIdx> },
  ThrowStatement { argument: NodeIdx },
  TryStatement { block: NodeIdx, handler: Option<NodeIdx>, finalizer: Option<NodeIdx> },
  CatchClause { param: Option<NodeIdx>, body: NodeIdx },
  WhileStatement { test: NodeIdx, body: NodeIdx },
  ForStatement {
    init: Option<NodeIdx>,
    test: Option<NodeIdx>,
    update: Option<NodeIdx>,
    body: NodeIdx,
  },
  ForInStatement { left: NodeIdx, right: NodeIdx, body: NodeIdx },
  ForOfStatement { left: NodeIdx, right: NodeIdx, body: NodeIdx, is_await: bool },
  EmptyStatement,
  LabeledStatement { label: Rstr, body: NodeIdx },
  BreakStatement { label: Option<Rstr> },
  ContinueStatement { label: Option<Rstr> },

  // Module declarations
  ImportDeclaration { specifiers: Vec<NodeIdx>, source: NodeIdx },
  ImportSpecifier { imported: Rstr, local: NodeIdx },
  ImportDefaultSpecifier { local: NodeIdx },
  ImportNamespaceSpecifier { local: NodeIdx },
  ExportNamedDeclaration {
    declaration: Option<NodeIdx>,
    specifiers: Vec<NodeIdx>,
    source: Option<NodeIdx>,
  },
  ExportSpecifier { local: Rstr, exported: Rstr },
  ExportDefaultDeclaration { declaration: NodeIdx },
  ExportAllDeclaration { exported: Option<Rstr>, source: NodeIdx },

  // Expressions
  Identifier { name: Rstr },
  ThisExpression,
  StringLiteral { value: Rstr },
  NumericLiteral { value: f64 },
  BooleanLiteral { value: bool },
  NullLiteral,
  TemplateLiteral { quasis: Vec<Rstr>, expressions: Vec<NodeIdx> },
  MemberExpression { object: NodeIdx, property: NodeIdx, computed: bool, optional: bool },
  CallExpression { callee: NodeIdx, arguments: Vec<NodeIdx>, optional: bool },
  NewExpression { callee: NodeIdx, arguments: Vec<NodeIdx> },
  ImportExpression { source: NodeIdx },
  /// `import.meta`
  MetaProperty,
  AssignmentExpression { operator: AssignOp, left: NodeIdx, right: NodeIdx },
  SequenceExpression { expressions: Vec<NodeIdx> },
  ConditionalExpression { test: NodeIdx, consequent: NodeIdx, alternate: NodeIdx },
  LogicalExpression { operator: LogicalOp, left: NodeIdx, right: NodeIdx },
  BinaryExpression { operator: BinaryOp, left: NodeIdx, right: NodeIdx },
  UnaryExpression { operator: UnaryOp, argument: NodeIdx },
  UpdateExpression { prefix: bool, argument: NodeIdx },
  FunctionExpression(Function),
  ArrowFunctionExpression(Function),
  ClassExpression(Class),
  ObjectExpression { properties: Vec<NodeIdx> },
  Property { key: NodeIdx, value: NodeIdx, kind: PropertyKind, computed: bool, shorthand: bool },
  SpreadElement { argument: NodeIdx },
  ArrayExpression { elements: Vec<Option<NodeIdx>> },
  AwaitExpression { argument: NodeIdx },

  // Patterns
  ObjectPattern { properties: Vec<NodeIdx> },
  ArrayPattern { elements: Vec<Option<NodeIdx>> },
  AssignmentPattern { left: NodeIdx, right: NodeIdx },
  RestElement { argument: NodeIdx },

  // Class members
  MethodDefinition { key: NodeIdx, value: NodeIdx, computed: bool, is_static: bool },
  PropertyDefinition { key: NodeIdx, value: Option<NodeIdx>, computed: bool, is_static: bool },
}

#[derive(Debug)]
pub struct Function {
  pub id: Option<NodeIdx>,
  pub params: Vec<NodeIdx>,
  /// A block statement, or a bare expression for concise arrows.
  pub body: NodeIdx,
  pub is_async: bool,
  pub is_generator: bool,
}

#[derive(Debug)]
pub struct Class {
  pub id: Option<NodeIdx>,
  pub super_class: Option<NodeIdx>,
  pub body: Vec<NodeIdx>,
}

impl Program {
  pub fn node(&self, idx: NodeIdx) -> &Node {
    &self.nodes[idx]
  }

  pub fn kind(&self, idx: NodeIdx) -> &NodeKind {
    &self.nodes[idx].kind
  }

  pub fn span(&self, idx: NodeIdx) -> Span {
    self.nodes[idx].span
  }

  /// Invoke `f` for every direct child of `idx`, in source order.
  pub fn for_each_child(&self, idx: NodeIdx, mut f: impl FnMut(NodeIdx)) {
    self.collect_children(idx, &mut f);
  }

  fn collect_children(&self, idx: NodeIdx, f: &mut impl FnMut(NodeIdx)) {
    match &self.nodes[idx].kind {
      NodeKind::ExpressionStatement { expression } => f(*expression),
      NodeKind::VariableDeclaration { declarations, .. } => {
        declarations.iter().copied().for_each(f);
      }
      NodeKind::VariableDeclarator { id, init } => {
        f(*id);
        init.iter().copied().for_each(f);
      }
      NodeKind::FunctionDeclaration(func)
      | NodeKind::FunctionExpression(func)
      | NodeKind::ArrowFunctionExpression(func) => {
        func.id.iter().copied().for_each(&mut *f);
        func.params.iter().copied().for_each(&mut *f);
        f(func.body);
      }
      NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => {
        class.id.iter().copied().for_each(&mut *f);
        class.super_class.iter().copied().for_each(&mut *f);
        class.body.iter().copied().for_each(f);
      }
      NodeKind::BlockStatement { body } => body.iter().copied().for_each(f),
      NodeKind::IfStatement { test, consequent, alternate } => {
        f(*test);
        f(*consequent);
        alternate.iter().copied().for_each(f);
      }
      NodeKind::ReturnStatement { argument } => argument.iter().copied().for_each(f),
      NodeKind::ThrowStatement { argument } => f(*argument),
      NodeKind::TryStatement { block, handler, finalizer } => {
        f(*block);
        handler.iter().copied().for_each(&mut *f);
        finalizer.iter().copied().for_each(f);
      }
      NodeKind::CatchClause { param, body } => {
        param.iter().copied().for_each(&mut *f);
        f(*body);
      }
      NodeKind::WhileStatement { test, body } => {
        f(*test);
        f(*body);
      }
      NodeKind::ForStatement { init, test, update, body } => {
        init.iter().copied().for_each(&mut *f);
        test.iter().copied().for_each(&mut *f);
        update.iter().copied().for_each(&mut *f);
        f(*body);
      }
      NodeKind::ForInStatement { left, right, body }
      | NodeKind::ForOfStatement { left, right, body, .. } => {
        f(*left);
        f(*right);
        f(*body);
      }
      NodeKind::EmptyStatement
      | NodeKind::BreakStatement { .. }
      | NodeKind::ContinueStatement { .. }
      | NodeKind::Identifier { .. }
      | NodeKind::ThisExpression
      | NodeKind::StringLiteral { .. }
      | NodeKind::NumericLiteral { .. }
      | NodeKind::BooleanLiteral { .. }
      | NodeKind::NullLiteral
      | NodeKind::MetaProperty => {}
      NodeKind::LabeledStatement { body, .. } => f(*body),
      NodeKind::ImportDeclaration { specifiers, source } => {
        specifiers.iter().copied().for_each(&mut *f);
        f(*source);
      }
      NodeKind::ImportSpecifier { local, .. }
      | NodeKind::ImportDefaultSpecifier { local }
      | NodeKind::ImportNamespaceSpecifier { local } => f(*local),
      NodeKind::ExportNamedDeclaration { declaration, specifiers, source } => {
        declaration.iter().copied().for_each(&mut *f);
        specifiers.iter().copied().for_each(&mut *f);
        source.iter().copied().for_each(f);
      }
      NodeKind::ExportSpecifier { .. } => {}
      NodeKind::ExportDefaultDeclaration { declaration } => f(*declaration),
      NodeKind::ExportAllDeclaration { source, .. } => f(*source),
      NodeKind::TemplateLiteral { expressions, .. } => expressions.iter().copied().for_each(f),
      NodeKind::MemberExpression { object, property, .. } => {
        f(*object);
        f(*property);
      }
      NodeKind::CallExpression { callee, arguments, .. }
      | NodeKind::NewExpression { callee, arguments } => {
        f(*callee);
        arguments.iter().copied().for_each(f);
      }
      NodeKind::ImportExpression { source } => f(*source),
      NodeKind::AssignmentExpression { left, right, .. } => {
        f(*left);
        f(*right);
      }
      NodeKind::SequenceExpression { expressions } => expressions.iter().copied().for_each(f),
      NodeKind::ConditionalExpression { test, consequent, alternate } => {
        f(*test);
        f(*consequent);
        f(*alternate);
      }
      NodeKind::LogicalExpression { left, right, .. }
      | NodeKind::BinaryExpression { left, right, .. } => {
        f(*left);
        f(*right);
      }
      NodeKind::UnaryExpression { argument, .. }
      | NodeKind::UpdateExpression { argument, .. }
      | NodeKind::SpreadElement { argument }
      | NodeKind::AwaitExpression { argument }
      | NodeKind::RestElement { argument } => f(*argument),
      NodeKind::ObjectExpression { properties } | NodeKind::ObjectPattern { properties } => {
        properties.iter().copied().for_each(f);
      }
      NodeKind::Property { key, value, .. } => {
        f(*key);
        f(*value);
      }
      NodeKind::ArrayExpression { elements } | NodeKind::ArrayPattern { elements } => {
        elements.iter().flatten().copied().for_each(f);
      }
      NodeKind::AssignmentPattern { left, right } => {
        f(*left);
        f(*right);
      }
      NodeKind::MethodDefinition { key, value, .. } => {
        f(*key);
        f(*value);
      }
      NodeKind::PropertyDefinition { key, value, .. } => {
        f(*key);
        value.iter().copied().for_each(f);
      }
    }
  }

  /// Fill `parent` links. Called once after parsing; the inclusion walk
  /// relies on them to reach enclosing statements from declarators.
  pub fn link_parents(&mut self) {
    let mut pairs = Vec::with_capacity(self.nodes.len());
    for idx in self.nodes.indices() {
      self.for_each_child(idx, |child| pairs.push((child, idx)));
    }
    for (child, parent) in pairs {
      self.nodes[child].parent = Some(parent);
    }
  }

  /// The assigned names of a binding pattern, e.g. both `a` and `c` for
  /// `{ a, b: c }`.
  pub fn collect_pattern_names(&self, pattern: NodeIdx, out: &mut Vec<(Rstr, NodeIdx)>) {
    match &self.nodes[pattern].kind {
      NodeKind::Identifier { name } => out.push((name.clone(), pattern)),
      NodeKind::ObjectPattern { properties } => {
        for property in properties {
          match &self.nodes[*property].kind {
            NodeKind::Property { value, .. } => self.collect_pattern_names(*value, out),
            NodeKind::RestElement { argument } => self.collect_pattern_names(*argument, out),
            _ => {}
          }
        }
      }
      NodeKind::ArrayPattern { elements } => {
        for element in elements.iter().flatten() {
          self.collect_pattern_names(*element, out);
        }
      }
      NodeKind::AssignmentPattern { left, .. } => self.collect_pattern_names(*left, out),
      NodeKind::RestElement { argument } => self.collect_pattern_names(*argument, out),
      _ => {}
    }
  }
}
