use lop_common::{ModuleIdx, ModuleInfo, NodeIdx, SourceJoiner};
use lop_ecmascript::ast::{NodeKind, VarDeclKind};
use lop_error::BuildResult;
use lop_utils::rstr::Rstr;
use string_wizard::MagicString;

use crate::graph::Graph;

/// Exported names that survived tree-shaking vs. those removed, per module.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderedExports {
  pub rendered_exports: Vec<Rstr>,
  pub removed_exports: Vec<Rstr>,
}

impl Graph {
  /// Emit the retained statements of one module. This is the only output
  /// surface the core exposes to the renderer; everything else reads flags.
  pub fn render_module(&mut self, idx: ModuleIdx) -> BuildResult<String> {
    {
      let module = self.normal_module(idx);
      if !self.options.treeshake || module.side_effects.is_no_treeshake() {
        let buffer = MagicString::new(module.source.as_str());
        return Ok(buffer.to_string());
      }
    }

    let relevant = self.dependencies_to_be_included(idx)?;
    let body = self.normal_module(idx).ast.body.clone();
    let source = self.normal_module(idx).source.clone();
    let mut retained: Vec<String> = Vec::new();

    for stmt in body {
      let piece = match self.normal_module(idx).ast.kind(stmt) {
        NodeKind::ImportDeclaration { .. } => {
          let span = self.normal_module(idx).ast.span(stmt);
          self
            .import_statement_target(idx, stmt)
            .filter(|target| relevant.contains(target))
            .map(|_| span.source(&source).to_string())
        }
        NodeKind::ExportAllDeclaration { .. } => {
          let span = self.normal_module(idx).ast.span(stmt);
          self
            .import_statement_target(idx, stmt)
            .filter(|target| relevant.contains(target))
            .map(|_| span.source(&source).to_string())
        }
        NodeKind::ExportNamedDeclaration { declaration, specifiers, source: from } => {
          let (declaration, specifiers, from) = (*declaration, specifiers.clone(), *from);
          if let Some(declaration) = declaration {
            self.render_declaration_statement(idx, stmt, declaration, &source)
          } else if from.is_some() {
            let span = self.normal_module(idx).ast.span(stmt);
            self
              .import_statement_target(idx, stmt)
              .filter(|target| relevant.contains(target))
              .map(|_| span.source(&source).to_string())
          } else {
            let any_included = specifiers.iter().any(|specifier| {
              let NodeKind::ExportSpecifier { local, .. } =
                self.normal_module(idx).ast.kind(*specifier)
              else {
                return false;
              };
              self
                .normal_module(idx)
                .scope
                .get(local)
                .is_some_and(|variable| self.variables.is_included(*variable))
            });
            let span = self.normal_module(idx).ast.span(stmt);
            (any_included || self.normal_module(idx).is_user_defined_entry)
              .then(|| span.source(&source).to_string())
          }
        }
        NodeKind::ExportDefaultDeclaration { .. } => {
          let span = self.normal_module(idx).ast.span(stmt);
          self
            .normal_module(idx)
            .node_included(stmt)
            .then(|| span.source(&source).to_string())
        }
        NodeKind::VariableDeclaration { .. } => {
          self.render_variable_declaration(idx, stmt, stmt, "", &source)
        }
        _ => {
          let span = self.normal_module(idx).ast.span(stmt);
          self
            .normal_module(idx)
            .node_included(stmt)
            .then(|| span.source(&source).to_string())
        }
      };
      if let Some(piece) = piece {
        retained.push(piece);
      }
    }

    let mut joiner = SourceJoiner::default();
    for piece in &retained {
      joiner.append_source(piece.as_str());
    }
    Ok(joiner.join())
  }

  /// `export const`/`export function`-style statements render through their
  /// inner declaration, keeping the `export ` prefix of the original slice.
  fn render_declaration_statement(
    &mut self,
    idx: ModuleIdx,
    stmt: NodeIdx,
    declaration: NodeIdx,
    source: &str,
  ) -> Option<String> {
    match self.normal_module(idx).ast.kind(declaration) {
      NodeKind::VariableDeclaration { .. } => {
        self.render_variable_declaration(idx, stmt, declaration, "export ", source)
      }
      _ => {
        let span = self.normal_module(idx).ast.span(stmt);
        (self.normal_module(idx).node_included(stmt)
          || self.normal_module(idx).node_included(declaration))
        .then(|| span.source(source).to_string())
      }
    }
  }

  /// Declarator-granular rendering: fully included declarations keep their
  /// original slice, partially included ones are reassembled.
  fn render_variable_declaration(
    &mut self,
    idx: ModuleIdx,
    stmt: NodeIdx,
    declaration: NodeIdx,
    prefix: &str,
    source: &str,
  ) -> Option<String> {
    let (kind, declarators) = match self.normal_module(idx).ast.kind(declaration) {
      NodeKind::VariableDeclaration { kind, declarations } => (*kind, declarations.clone()),
      _ => return None,
    };
    let included: Vec<NodeIdx> = declarators
      .iter()
      .copied()
      .filter(|declarator| self.normal_module(idx).node_included(*declarator))
      .collect();
    if included.is_empty() {
      return None;
    }
    if included.len() == declarators.len() {
      let span = self.normal_module(idx).ast.span(stmt);
      return Some(span.source(source).to_string());
    }
    let keyword = match kind {
      VarDeclKind::Var => "var",
      VarDeclKind::Let => "let",
      VarDeclKind::Const => "const",
    };
    let slices: Vec<&str> = included
      .iter()
      .map(|declarator| self.normal_module(idx).ast.span(*declarator).source(source))
      .collect();
    Some(format!("{prefix}{keyword} {};", slices.join(", ")))
  }

  /// The module a static import/re-export statement resolves to.
  fn import_statement_target(&self, idx: ModuleIdx, stmt: NodeIdx) -> Option<ModuleIdx> {
    let module = self.normal_module(idx);
    let source_node = match module.ast.kind(stmt) {
      NodeKind::ImportDeclaration { source, .. }
      | NodeKind::ExportAllDeclaration { source, .. } => *source,
      NodeKind::ExportNamedDeclaration { source: Some(source), .. } => *source,
      _ => return None,
    };
    let span = module.ast.span(source_node);
    module
      .import_records
      .iter()
      .find(|record| record.kind.is_static() && record.span == span)
      .map(|record| record.state)
  }

  /// Which direct exports survived rendering.
  pub fn rendered_exports(&mut self, idx: ModuleIdx) -> BuildResult<RenderedExports> {
    let names: Vec<Rstr> = self.normal_module(idx).exports.keys().cloned().collect();
    let mut result = RenderedExports::default();
    for name in names {
      let included = self
        .variable_for_export_name(idx, &name)?
        .is_some_and(|variable| self.variables.is_included(variable));
      if included {
        result.rendered_exports.push(name);
      } else {
        result.removed_exports.push(name);
      }
    }
    Ok(result)
  }

  pub fn module_info(&self, idx: ModuleIdx) -> ModuleInfo {
    self.normal_module(idx).to_module_info(&self.modules)
  }
}
