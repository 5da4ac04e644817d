use lop_common::{NodeIdx, Span};
use lop_utils::rstr::Rstr;

use super::{Node, NodeKind, Program};

/// Grows a [`Program`] arena node by node. The parser drives it; tests use
/// it to assemble snippets directly.
#[derive(Debug, Default)]
pub struct AstBuilder {
  program: Program,
}

impl AstBuilder {
  pub fn push(&mut self, span: Span, kind: NodeKind) -> NodeIdx {
    self.program.nodes.push(Node { span, parent: None, kind })
  }

  pub fn identifier(&mut self, span: Span, name: impl Into<Rstr>) -> NodeIdx {
    self.push(span, NodeKind::Identifier { name: name.into() })
  }

  pub fn string(&mut self, span: Span, value: impl Into<Rstr>) -> NodeIdx {
    self.push(span, NodeKind::StringLiteral { value: value.into() })
  }

  pub fn number(&mut self, span: Span, value: f64) -> NodeIdx {
    self.push(span, NodeKind::NumericLiteral { value })
  }

  pub fn kind_mut(&mut self, idx: NodeIdx) -> &mut NodeKind {
    &mut self.program.nodes[idx].kind
  }

  pub fn set_span(&mut self, idx: NodeIdx, span: Span) {
    self.program.nodes[idx].span = span;
  }

  pub fn span(&self, idx: NodeIdx) -> Span {
    self.program.nodes[idx].span
  }

  pub fn kind(&self, idx: NodeIdx) -> &NodeKind {
    &self.program.nodes[idx].kind
  }

  /// Seal the arena: install the top-level body, the program span, and
  /// parent links.
  pub fn finish(mut self, span: Span, body: Vec<NodeIdx>) -> Program {
    self.program.span = span;
    self.program.body = body;
    self.program.link_parents();
    self.program
  }
}
