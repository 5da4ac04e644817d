use lop_common::{ModuleId, ModuleIdx, ModuleSideEffects, VariableRef};
use lop_utils::{ecmascript::legitimize_identifier_name, rstr::Rstr};
use rustc_hash::FxHashMap;

use crate::variable::{ExternalVariable, Variable, VariableDb, VariableKind};

/// A dependency outside the graph. It only materializes the variables the
/// graph actually asks for.
#[derive(Debug)]
pub struct ExternalModule {
  pub idx: ModuleIdx,
  pub id: ModuleId,
  pub exec_order: u32,
  pub side_effects: ModuleSideEffects,
  /// The `*` binding, created eagerly; named bindings are lazy.
  pub namespace_variable: VariableRef,
  pub named_variables: FxHashMap<Rstr, VariableRef>,
  /// Whether anything included references this module.
  pub used: bool,
}

impl ExternalModule {
  pub fn new(
    idx: ModuleIdx,
    id: ModuleId,
    side_effects: ModuleSideEffects,
    variables: &mut VariableDb,
  ) -> Self {
    let namespace_variable = variables.create(
      idx,
      Variable::new(
        legitimize_identifier_name(id.as_ref()),
        VariableKind::External(ExternalVariable::default()),
      ),
    );
    Self {
      idx,
      id,
      exec_order: u32::MAX,
      side_effects,
      namespace_variable,
      named_variables: FxHashMap::default(),
      used: false,
    }
  }

  pub fn variable_for_name(&mut self, name: &Rstr, variables: &mut VariableDb) -> VariableRef {
    if name.as_str() == "*" {
      return self.namespace_variable;
    }
    if let Some(existing) = self.named_variables.get(name) {
      return *existing;
    }
    let created = variables.create(
      self.idx,
      Variable::new(name.clone(), VariableKind::External(ExternalVariable::default())),
    );
    self.named_variables.insert(name.clone(), created);
    created
  }
}
