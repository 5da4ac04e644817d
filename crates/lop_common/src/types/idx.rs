oxc_index::define_index_type! {
  #[derive(Default)]
  pub struct RawIdx = u32;
}

pub type ModuleIdx = RawIdx;
pub type VariableIdx = RawIdx;
pub type NodeIdx = RawIdx;
pub type ImportRecordIdx = RawIdx;

/// Opaque identity shared by every module participating in one import cycle.
pub type CycleToken = RawIdx;
