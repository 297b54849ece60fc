//! Level-aware particle streaming policy.
//!
//! Blocks on different levels that share a within-level index (a *slot*)
//! describe the same region at different detail. For every slot the policy
//! keeps a single target level:
//!
//! 1. the highest level selected this round;
//! 2. raised to one level below any loaded level that is no longer selected,
//!    if that lower block is still a candidate (level 0 is the floor and is
//!    kept once loaded).
//!
//! The target is queued (in priority order) unless it is already loaded,
//! and every other loaded block of the slot is purged.

use std::collections::{BTreeMap, HashSet};

use super::item::BlockItem;
use super::{BlockQueue, DistributionMode, ProcessTopology, QueueState, SelectionConfig};
use crate::error::StreamResult;
use crate::metadata::CompositeMetadata;

#[derive(Clone, Debug, Default)]
pub struct ParticleBlockQueue {
  state: QueueState,
}

impl ParticleBlockQueue {
  pub fn new(topology: ProcessTopology, mode: DistributionMode, selection: SelectionConfig) -> Self {
    Self {
      state: QueueState::new(topology, mode, selection),
    }
  }
}

#[inline]
fn slot_of(id: u32, per_level: u32) -> (u32, u32) {
  (id % per_level, id / per_level)
}

impl BlockQueue for ParticleBlockQueue {
  const CONSULT_PEERS: bool = true;

  fn state(&self) -> &QueueState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut QueueState {
    &mut self.state
  }

  fn validate(metadata: &CompositeMetadata) -> StreamResult<()> {
    metadata.blocks_per_level().map(|_| ())
  }

  fn select(&mut self) {
    let state = &mut self.state;
    let per_level = match state.metadata.blocks_per_level() {
      Ok(n) if n > 0 => n as u32,
      _ => {
        state.heap.clear();
        return;
      }
    };

    let loaded = std::mem::take(&mut state.ledger.requested);
    state.ledger.to_request.clear();

    let candidates: Vec<BlockItem> = state
      .heap
      .drain_sorted()
      .into_iter()
      .filter(|item| state.is_eligible(item))
      .collect();
    let surviving: HashSet<u32> = candidates.iter().map(|item| item.id).collect();

    // Highest selected level per slot.
    let mut selected = HashSet::new();
    let mut targets: BTreeMap<u32, u32> = BTreeMap::new();
    for item in &candidates {
      if state.selection.select(item) {
        let (slot, level) = slot_of(item.id, per_level);
        selected.insert(item.id);
        let target = targets.entry(slot).or_insert(level);
        *target = (*target).max(level);
      }
    }

    // Loaded levels that fell out of selection step down one level.
    for &id in &loaded {
      if selected.contains(&id) {
        continue;
      }
      let (slot, level) = slot_of(id, per_level);
      let fallback = if level == 0 {
        Some(0)
      } else {
        let below = level - 1;
        surviving.contains(&(below * per_level + slot)).then_some(below)
      };
      if let Some(fallback) = fallback {
        let target = targets.entry(slot).or_insert(fallback);
        *target = (*target).max(fallback);
      }
    }

    for item in &candidates {
      let (slot, level) = slot_of(item.id, per_level);
      if targets.get(&slot) == Some(&level) && !loaded.contains(&item.id) {
        state.ledger.to_request.push_back(item.id);
      }
    }

    for (&slot, &level) in &targets {
      let id = level * per_level + slot;
      if loaded.contains(&id) {
        state.ledger.requested.insert(id);
      }
    }

    for id in loaded {
      if !state.ledger.requested.contains(&id) {
        tracing::trace!(id, "purging superseded block");
        state.ledger.to_purge.insert(id);
      }
    }
  }
}

#[cfg(test)]
#[path = "particles_test.rs"]
mod particles_test;
