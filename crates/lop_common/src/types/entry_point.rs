use crate::ModuleIdx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointKind {
  UserDefined,
  DynamicImport,
}

#[derive(Debug, Clone, Copy)]
pub struct EntryPoint {
  pub id: ModuleIdx,
  pub kind: EntryPointKind,
}
