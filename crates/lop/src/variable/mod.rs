use lop_common::{ModuleIdx, NodeIdx, VariableIdx};
use lop_utils::rstr::Rstr;
use oxc_index::{Idx, IndexVec};
use rustc_hash::FxHashSet;

pub use lop_common::VariableRef;

/// One binding the analysis tracks. The owning module is part of the
/// [`VariableRef`] address; externals are owned by their external module's
/// slot in the same table.
#[derive(Debug)]
pub struct Variable {
  pub name: Rstr,
  pub included: bool,
  /// Latches on the first empty-path deoptimization; the value at any path
  /// is unknown from then on.
  pub is_reassigned: bool,
  /// A non-empty path was deoptimized, so literal probing below the root is
  /// off but the root binding itself may still be known.
  pub has_deoptimized_path: bool,
  /// A literal value was handed out for this binding; deoptimizing it later
  /// must trigger another tree-shaking pass.
  pub literal_probed: bool,
  pub kind: VariableKind,
}

#[derive(Debug)]
pub enum VariableKind {
  Local(LocalVariable),
  ExportDefault(ExportDefaultVariable),
  Namespace(NamespaceVariable),
  External(ExternalVariable),
  SyntheticNamedExport(SyntheticNamedExportVariable),
  ExportShim,
}

#[derive(Debug, Default)]
pub struct LocalVariable {
  /// Declarator or declaration statement nodes that introduce the binding.
  pub declarations: Vec<NodeIdx>,
  pub init: Option<NodeIdx>,
}

#[derive(Debug)]
pub struct ExportDefaultVariable {
  /// The `export default` statement node.
  pub declaration: NodeIdx,
  /// Filled when the default export aliases a local binding
  /// (`export default foo`, or a named default function/class).
  pub referenced_local: Option<VariableRef>,
}

#[derive(Debug, Default)]
pub struct NamespaceVariable {
  /// Star-reexported namespaces merged into this one, filled lazily.
  pub merged_namespaces: Vec<VariableRef>,
}

#[derive(Debug, Default)]
pub struct ExternalVariable {
  /// Set when the binding is re-exported from an entry so the renderer
  /// keeps the external import alive.
  pub reexported: bool,
}

#[derive(Debug)]
pub struct SyntheticNamedExportVariable {
  /// The fallback namespace variable the synthetic export reads through.
  pub base: VariableRef,
}

impl Variable {
  pub fn new(name: impl Into<Rstr>, kind: VariableKind) -> Self {
    Self {
      name: name.into(),
      included: false,
      is_reassigned: false,
      has_deoptimized_path: false,
      literal_probed: false,
      kind,
    }
  }

  pub fn is_synthetic(&self) -> bool {
    matches!(self.kind, VariableKind::SyntheticNamedExport(_))
  }
}

/// Graph-wide variable storage, one arena per module, addressed by
/// [`VariableRef`].
#[derive(Debug, Default)]
pub struct VariableDb {
  inner: IndexVec<ModuleIdx, IndexVec<VariableIdx, Variable>>,
}

impl VariableDb {
  /// Grow the per-module tables to cover `idx`.
  pub fn ensure_module(&mut self, idx: ModuleIdx) {
    while self.inner.len() <= idx.index() {
      self.inner.push(IndexVec::default());
    }
  }

  pub fn create(&mut self, owner: ModuleIdx, variable: Variable) -> VariableRef {
    self.ensure_module(owner);
    let var = self.inner[owner].push(variable);
    VariableRef { owner, var }
  }

  pub fn get(&self, reference: VariableRef) -> &Variable {
    &self.inner[reference.owner][reference.var]
  }

  pub fn get_mut(&mut self, reference: VariableRef) -> &mut Variable {
    &mut self.inner[reference.owner][reference.var]
  }

  pub fn name(&self, reference: VariableRef) -> &Rstr {
    &self.get(reference).name
  }

  pub fn is_included(&self, reference: VariableRef) -> bool {
    self.get(reference).included
  }

  /// Chain through `export default localName` aliases to the ultimately
  /// referenced binding. Alias cycles terminate at the last distinct step.
  pub fn original_variable(&self, reference: VariableRef) -> VariableRef {
    let mut seen = FxHashSet::default();
    let mut current = reference;
    loop {
      if !seen.insert(current) {
        return current;
      }
      match &self.get(current).kind {
        VariableKind::ExportDefault(ExportDefaultVariable {
          referenced_local: Some(local), ..
        }) => current = *local,
        _ => return current,
      }
    }
  }

  /// The single alias step of an `ExportDefault` variable, if any.
  pub fn direct_original_variable(&self, reference: VariableRef) -> Option<VariableRef> {
    match &self.get(reference).kind {
      VariableKind::ExportDefault(ExportDefaultVariable { referenced_local, .. }) => {
        *referenced_local
      }
      _ => None,
    }
  }

  /// Collapse a synthetic export to the base its fallback namespace resolves
  /// through, following nested synthetics.
  pub fn base_variable(&self, reference: VariableRef) -> VariableRef {
    let mut seen = FxHashSet::default();
    let mut current = reference;
    loop {
      if !seen.insert(current) {
        return current;
      }
      match &self.get(current).kind {
        VariableKind::SyntheticNamedExport(SyntheticNamedExportVariable { base }) => {
          current = *base;
        }
        _ => return current,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use oxc_index::Idx;

  fn local(db: &mut VariableDb, name: &str) -> VariableRef {
    db.create(
      ModuleIdx::from_usize(0),
      Variable::new(name, VariableKind::Local(LocalVariable::default())),
    )
  }

  #[test]
  fn default_export_aliases_chain_to_the_original() {
    let mut db = VariableDb::default();
    let foo = local(&mut db, "foo");
    let default = db.create(
      ModuleIdx::from_usize(0),
      Variable::new(
        "default",
        VariableKind::ExportDefault(ExportDefaultVariable {
          declaration: NodeIdx::from_usize(0),
          referenced_local: Some(foo),
        }),
      ),
    );
    assert_eq!(db.original_variable(default), foo);
    assert_eq!(db.direct_original_variable(default), Some(foo));
    assert_eq!(db.direct_original_variable(foo), None);
  }

  #[test]
  fn synthetic_exports_collapse_to_their_base() {
    let mut db = VariableDb::default();
    let base = local(&mut db, "base");
    let synthetic = db.create(
      ModuleIdx::from_usize(0),
      Variable::new(
        "anything",
        VariableKind::SyntheticNamedExport(SyntheticNamedExportVariable { base }),
      ),
    );
    assert_eq!(db.base_variable(synthetic), base);
    assert_eq!(db.base_variable(base), base);
  }
}
