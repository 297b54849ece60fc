//! Outline streaming policy for hierarchical AMR blocks.
//!
//! A block is wanted when it is visible and either coarse enough or covers
//! enough of the screen. Everything requested before and not wanted now is
//! purged.

use super::{BlockQueue, DistributionMode, ProcessTopology, QueueState, SelectionConfig};

#[derive(Clone, Debug, Default)]
pub struct AmrBlockQueue {
  state: QueueState,
}

impl AmrBlockQueue {
  pub fn new(topology: ProcessTopology, mode: DistributionMode, selection: SelectionConfig) -> Self {
    Self {
      state: QueueState::new(topology, mode, selection),
    }
  }
}

impl BlockQueue for AmrBlockQueue {
  const CONSULT_PEERS: bool = false;

  fn state(&self) -> &QueueState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut QueueState {
    &mut self.state
  }

  fn select(&mut self) {
    let state = &mut self.state;
    let mut previously_requested = std::mem::take(&mut state.ledger.requested);
    state.ledger.to_request.clear();

    for item in state.heap.drain_sorted() {
      if !state.is_eligible(&item) {
        continue;
      }
      let wanted = item.coverage > 0.0 && state.selection.generic_select(&item);
      if !wanted {
        tracing::trace!(id = item.id, coverage = item.coverage, "block not wanted");
        continue;
      }
      if previously_requested.remove(&item.id) {
        state.ledger.requested.insert(item.id);
      } else {
        state.ledger.to_request.push_back(item.id);
      }
    }

    state.ledger.to_purge.extend(previously_requested);
  }
}

#[cfg(test)]
#[path = "amr_test.rs"]
mod amr_test;
