use lop_common::{
  ExportDescription, ImportDescription, ImportKind, ImportRecordIdx, ImportRecordMeta, ModuleIdx,
  ModuleMeta, NodeIdx, RawImportRecord, ReexportDescription, Specifier,
};
use lop_ecmascript::ast::{NodeKind, Program};
use lop_utils::{
  indexmap::{FxIndexMap, FxIndexSet},
  rstr::Rstr,
};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

use crate::variable::{
  ExportDefaultVariable, LocalVariable, Variable, VariableDb, VariableKind, VariableRef,
};

/// Everything one top-level walk extracts from a freshly parsed module.
#[derive(Debug, Default)]
pub struct ScanResult {
  pub meta: ModuleMeta,
  pub scope: FxHashMap<Rstr, VariableRef>,
  pub import_descriptions: FxIndexMap<Rstr, ImportDescription>,
  pub reexport_descriptions: FxIndexMap<Rstr, ReexportDescription>,
  pub exports: FxIndexMap<Rstr, ExportDescription>,
  pub sources: FxIndexSet<Rstr>,
  pub export_all_sources: FxIndexSet<Rstr>,
  pub raw_import_records: IndexVec<ImportRecordIdx, RawImportRecord>,
  pub dynamic_import_nodes: Vec<NodeIdx>,
  pub import_meta_nodes: Vec<NodeIdx>,
  /// `export default` aliases (`export default foo`) to resolve once the
  /// whole scope is known.
  pub default_alias: Option<(VariableRef, Rstr)>,
}

pub struct AstScanner<'a> {
  idx: ModuleIdx,
  ast: &'a Program,
  variables: &'a mut VariableDb,
  result: ScanResult,
}

impl<'a> AstScanner<'a> {
  pub fn new(idx: ModuleIdx, ast: &'a Program, variables: &'a mut VariableDb) -> Self {
    Self { idx, ast, variables, result: ScanResult::default() }
  }

  pub fn scan(mut self) -> ScanResult {
    for stmt in &self.ast.body {
      self.scan_top_level_statement(*stmt);
    }
    for stmt in &self.ast.body {
      self.walk_for_expressions(*stmt, 0);
    }
    // `export default foo` can alias a hoisted declaration; resolve after
    // the whole top level is in scope.
    if let Some((default_var, alias)) = self.result.default_alias.clone() {
      if let Some(local) = self.result.scope.get(&alias).copied() {
        if let VariableKind::ExportDefault(ExportDefaultVariable { referenced_local, .. }) =
          &mut self.variables.get_mut(default_var).kind
        {
          *referenced_local = Some(local);
        }
      }
    }
    self.result
  }

  fn add_import_record(&mut self, node: NodeIdx, kind: ImportKind) -> Option<ImportRecordIdx> {
    let (source_node, meta) = match self.ast.kind(node) {
      NodeKind::ImportDeclaration { specifiers, source } => {
        let meta = if specifiers.is_empty() {
          ImportRecordMeta::IS_PLAIN_IMPORT
        } else {
          ImportRecordMeta::empty()
        };
        (*source, meta)
      }
      NodeKind::ExportAllDeclaration { exported: None, source } => {
        (*source, ImportRecordMeta::IS_EXPORT_STAR)
      }
      NodeKind::ExportAllDeclaration { source, .. }
      | NodeKind::ImportExpression { source } => (*source, ImportRecordMeta::empty()),
      NodeKind::ExportNamedDeclaration { source: Some(source), .. } => {
        (*source, ImportRecordMeta::empty())
      }
      _ => return None,
    };
    let NodeKind::StringLiteral { value } = self.ast.kind(source_node) else {
      // Dynamic imports with computed specifiers stay unresolved.
      return None;
    };
    let specifier: Rstr = value.clone();
    if kind.is_static() {
      self.result.sources.insert(specifier.clone());
    }
    let record = RawImportRecord::new(specifier, kind, self.ast.span(source_node)).with_meta(meta);
    Some(self.result.raw_import_records.push(record))
  }

  fn declare_local(&mut self, name: Rstr, declaration: NodeIdx, init: Option<NodeIdx>) {
    if let Some(existing) = self.result.scope.get(&name) {
      // `var` redeclaration or a function overriding an earlier binding;
      // keep one variable and extend its declaration sites.
      if let VariableKind::Local(local) = &mut self.variables.get_mut(*existing).kind {
        local.declarations.push(declaration);
        if local.init.is_none() {
          local.init = init;
        }
      }
      return;
    }
    let variable = self.variables.create(
      self.idx,
      Variable::new(
        name.clone(),
        VariableKind::Local(LocalVariable { declarations: vec![declaration], init }),
      ),
    );
    self.result.scope.insert(name, variable);
  }

  fn declare_variable_declaration(&mut self, declaration: NodeIdx, export: bool) {
    let NodeKind::VariableDeclaration { declarations, .. } = self.ast.kind(declaration) else {
      return;
    };
    for declarator in declarations {
      let NodeKind::VariableDeclarator { id, init } = self.ast.kind(*declarator) else {
        continue;
      };
      let mut names = Vec::new();
      self.ast.collect_pattern_names(*id, &mut names);
      let single = names.len() == 1 && matches!(self.ast.kind(*id), NodeKind::Identifier { .. });
      for (name, _) in names {
        self.declare_local(name.clone(), *declarator, if single { *init } else { None });
        if export {
          self.result.exports.insert(name.clone(), ExportDescription::Binding {
            local_name: name,
            identifier: None,
          });
        }
      }
    }
  }

  fn declared_name(&self, declaration: NodeIdx) -> Option<Rstr> {
    let id = match self.ast.kind(declaration) {
      NodeKind::FunctionDeclaration(function) | NodeKind::FunctionExpression(function) => {
        function.id
      }
      NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => class.id,
      _ => None,
    }?;
    match self.ast.kind(id) {
      NodeKind::Identifier { name } => Some(name.clone()),
      _ => None,
    }
  }

  fn scan_top_level_statement(&mut self, stmt: NodeIdx) {
    match self.ast.kind(stmt) {
      NodeKind::ImportDeclaration { specifiers, source } => {
        let NodeKind::StringLiteral { value: src } = self.ast.kind(*source) else {
          return;
        };
        let src = src.clone();
        self.add_import_record(stmt, ImportKind::Import);
        for specifier in specifiers.clone() {
          self.scan_import_specifier(specifier, &src);
        }
      }
      NodeKind::ExportDefaultDeclaration { declaration } => {
        let declaration = *declaration;
        self.result.meta.insert(ModuleMeta::HAS_DEFAULT_EXPORT);
        let identifier = match self.ast.kind(declaration) {
          NodeKind::Identifier { name } => Some(name.clone()),
          _ => self.declared_name(declaration),
        };

        // A named default function/class is also reachable by its own name.
        if let Some(name) = self.declared_name(declaration) {
          self.declare_local(name, stmt, None);
        }

        let default_var = self.variables.create(
          self.idx,
          Variable::new(
            "default",
            VariableKind::ExportDefault(ExportDefaultVariable {
              declaration: stmt,
              referenced_local: None,
            }),
          ),
        );
        if let Some(alias) = &identifier {
          self.result.default_alias = Some((default_var, alias.clone()));
        }
        self.result.scope.insert("default".into(), default_var);
        self.result.exports.insert("default".into(), ExportDescription::Binding {
          local_name: "default".into(),
          identifier,
        });
      }
      NodeKind::ExportAllDeclaration { exported, source } => {
        let NodeKind::StringLiteral { value: src } = self.ast.kind(*source) else {
          return;
        };
        let src = src.clone();
        match exported {
          Some(ns) => {
            let ns = ns.clone();
            self.add_import_record(stmt, ImportKind::Import);
            self.result.reexport_descriptions.insert(ns, ReexportDescription {
              source: src,
              imported: Specifier::Star,
              module: None,
              pos: self.ast.span(stmt).start,
            });
          }
          None => {
            self.result.meta.insert(ModuleMeta::HAS_STAR_EXPORT);
            self.add_import_record(stmt, ImportKind::Import);
            self.result.export_all_sources.insert(src);
          }
        }
      }
      NodeKind::ExportNamedDeclaration { declaration, specifiers, source } => {
        if let Some(source) = source {
          let NodeKind::StringLiteral { value: src } = self.ast.kind(*source) else {
            return;
          };
          let src = src.clone();
          self.add_import_record(stmt, ImportKind::Import);
          for specifier in specifiers.clone() {
            let NodeKind::ExportSpecifier { local, exported } = self.ast.kind(specifier) else {
              continue;
            };
            self.result.reexport_descriptions.insert(exported.clone(), ReexportDescription {
              source: src.clone(),
              imported: Specifier::Literal(local.clone()),
              module: None,
              pos: self.ast.span(specifier).start,
            });
          }
          return;
        }

        if let Some(declaration) = declaration {
          let declaration = *declaration;
          match self.ast.kind(declaration) {
            NodeKind::VariableDeclaration { .. } => {
              self.declare_variable_declaration(declaration, true);
            }
            _ => {
              if let Some(name) = self.declared_name(declaration) {
                self.declare_local(name.clone(), declaration, None);
                self.result.exports.insert(name.clone(), ExportDescription::Binding {
                  local_name: name,
                  identifier: None,
                });
              }
            }
          }
          return;
        }

        for specifier in specifiers.clone() {
          let NodeKind::ExportSpecifier { local, exported } = self.ast.kind(specifier) else {
            continue;
          };
          self.result.exports.insert(exported.clone(), ExportDescription::Binding {
            local_name: local.clone(),
            identifier: None,
          });
        }
      }
      NodeKind::VariableDeclaration { .. } => {
        self.declare_variable_declaration(stmt, false);
      }
      NodeKind::FunctionDeclaration(_) | NodeKind::ClassDeclaration(_) => {
        if let Some(name) = self.declared_name(stmt) {
          self.declare_local(name, stmt, None);
        }
      }
      _ => {}
    }
  }

  fn scan_import_specifier(&mut self, specifier: NodeIdx, src: &Rstr) {
    let (local, imported) = match self.ast.kind(specifier) {
      NodeKind::ImportDefaultSpecifier { local } => (*local, Specifier::Literal("default".into())),
      NodeKind::ImportNamespaceSpecifier { local } => (*local, Specifier::Star),
      NodeKind::ImportSpecifier { imported, local } => {
        (*local, Specifier::Literal(imported.clone()))
      }
      _ => return,
    };
    let NodeKind::Identifier { name } = self.ast.kind(local) else {
      return;
    };
    self.result.import_descriptions.insert(name.clone(), ImportDescription {
      source: src.clone(),
      imported,
      module: None,
      pos: self.ast.span(specifier).start,
    });
  }

  /// Collect dynamic imports, `import.meta` and top-level `await` anywhere
  /// in the tree. `function_depth` tracks whether we're inside a function
  /// body, where `await` stops being top-level.
  fn walk_for_expressions(&mut self, node: NodeIdx, function_depth: u32) {
    let child_depth = match self.ast.kind(node) {
      NodeKind::FunctionDeclaration(_)
      | NodeKind::FunctionExpression(_)
      | NodeKind::ArrowFunctionExpression(_) => function_depth + 1,
      NodeKind::ImportExpression { .. } => {
        self.result.dynamic_import_nodes.push(node);
        self.add_import_record(node, ImportKind::DynamicImport);
        function_depth
      }
      NodeKind::MetaProperty => {
        self.result.import_meta_nodes.push(node);
        function_depth
      }
      NodeKind::AwaitExpression { .. } | NodeKind::ForOfStatement { is_await: true, .. } => {
        if function_depth == 0 {
          self.result.meta.insert(ModuleMeta::USES_TOP_LEVEL_AWAIT);
        }
        function_depth
      }
      _ => function_depth,
    };
    let mut children = Vec::new();
    self.ast.for_each_child(node, |child| children.push(child));
    for child in children {
      self.walk_for_expressions(child, child_depth);
    }
  }
}
