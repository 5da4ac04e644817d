/// Where the graph currently is. One-shot caches (export-name tables,
/// relevant-dependency sets) are only populated once `Generate` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildPhase {
  Load,
  Analyse,
  Generate,
}
