use std::iter;

use lop_common::{CycleToken, ModuleIdx};
use oxc_index::Idx;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::Graph;

#[derive(PartialEq, Eq, Hash, Debug)]
enum Status {
  ToBeExecuted(ModuleIdx),
  WaitForExit(ModuleIdx),
}

#[derive(Default)]
struct SortState {
  executed_ids: FxHashSet<ModuleIdx>,
  stack_indexes_of_executing_id: FxHashMap<ModuleIdx, usize>,
  next_exec_order: u32,
  circular_dependencies: FxHashSet<Box<[ModuleIdx]>>,
}

impl Graph {
  /// Assign depth-first execution order over static imports and attach a
  /// shared cycle token to every member of each detected import cycle.
  pub(crate) fn sort_modules(&mut self) {
    let mut state = SortState::default();

    let mut execution_stack = self
      .entry_points
      .iter()
      .rev()
      .map(|entry| Status::ToBeExecuted(entry.id))
      .collect::<Vec<_>>();
    self.run_execution_stack(&mut execution_stack, &mut state);

    // Modules only reachable dynamically still need an order; seed them
    // after the user entries.
    let all_indices: Vec<ModuleIdx> = self.modules.indices().collect();
    for idx in all_indices {
      if !state.executed_ids.contains(&idx) {
        let mut stack = vec![Status::ToBeExecuted(idx)];
        self.run_execution_stack(&mut stack, &mut state);
      }
    }

    for cycle in state.circular_dependencies {
      let token = CycleToken::from_usize(self.next_cycle_token());
      for id in cycle.iter() {
        if let Some(module) = self.modules[*id].as_normal_mut() {
          module.cycles.insert(token);
        }
      }
    }
  }

  fn run_execution_stack(&mut self, execution_stack: &mut Vec<Status>, state: &mut SortState) {
    while let Some(status) = execution_stack.pop() {
      match status {
        Status::ToBeExecuted(id) => {
          if state.executed_ids.contains(&id) {
            if let Some(index) = state.stack_indexes_of_executing_id.get(&id).copied() {
              // Every `WaitForExit` frame above `index` is on the active
              // execution chain, which makes it a cycle participant.
              let cycle = execution_stack[index..]
                .iter()
                .filter_map(|action| match action {
                  Status::ToBeExecuted(_) => None,
                  Status::WaitForExit(id) => Some(*id),
                })
                .chain(iter::once(id))
                .collect::<Box<[_]>>();
              state.circular_dependencies.insert(cycle);
            }
          } else {
            state.executed_ids.insert(id);
            execution_stack.push(Status::WaitForExit(id));
            state.stack_indexes_of_executing_id.insert(id, execution_stack.len() - 1);

            let static_deps: Vec<ModuleIdx> = self.modules[id].static_dependencies().collect();
            execution_stack.extend(static_deps.into_iter().rev().map(Status::ToBeExecuted));
          }
        }
        Status::WaitForExit(id) => {
          self.modules[id].set_exec_order(state.next_exec_order);
          state.next_exec_order += 1;
          state.stack_indexes_of_executing_id.remove(&id);
        }
      }
    }
  }
}
