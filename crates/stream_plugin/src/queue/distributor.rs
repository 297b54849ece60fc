//! Request/requested/purge bookkeeping and per-rank block distribution.
//!
//! Every rank builds the same ledger from the same metadata and view planes.
//! In round-robin mode a pop drains one entry per rank and keeps only the
//! caller's, so ranks stay consistent only while they pop in lockstep.

use std::collections::{BTreeSet, VecDeque};

use serde::Deserialize;

use crate::constants::NO_BLOCK;
use crate::error::{StreamError, StreamResult};

/// Position of this process inside its cooperating group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessTopology {
  pub rank: usize,
  pub size: usize,
}

impl ProcessTopology {
  pub const SINGLE: Self = Self { rank: 0, size: 1 };

  pub fn new(rank: usize, size: usize) -> Self {
    debug_assert!(rank < size.max(1));
    Self {
      rank,
      size: size.max(1),
    }
  }
}

impl Default for ProcessTopology {
  fn default() -> Self {
    Self::SINGLE
  }
}

/// How blocks are split between ranks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
  /// Any rank may load any block; pops hand out one entry per rank.
  #[default]
  RoundRobin,
  /// Ranks only queue blocks whose owner hint names them (or no hint).
  OwnershipHints,
}

impl DistributionMode {
  #[inline]
  pub fn any_process_can_load_any_block(self) -> bool {
    matches!(self, Self::RoundRobin)
  }
}

/// Identifiers to fetch, already live, and to drop.
#[derive(Clone, Debug, Default)]
pub struct BlockLedger {
  /// FIFO of ids computed by the last update, not yet popped.
  pub to_request: VecDeque<u32>,
  /// Ids loaded or in flight.
  pub requested: BTreeSet<u32>,
  /// Ids to remove from the accumulated render object.
  pub to_purge: BTreeSet<u32>,
}

impl BlockLedger {
  pub fn clear(&mut self) {
    self.to_request.clear();
    self.requested.clear();
    self.to_purge.clear();
  }

  /// Drop pending purges of ids that are wanted again.
  pub fn reconcile_purges(&mut self) {
    let requested = &self.requested;
    let to_request = &self.to_request;
    self
      .to_purge
      .retain(|id| !requested.contains(id) && !to_request.contains(id));
  }

  /// Hand the calling rank its next block.
  ///
  /// Round-robin pops consume up to `topology.size` entries and mark all of
  /// them requested; the caller gets its own entry or [`NO_BLOCK`] when the
  /// round ran short.
  pub fn pop(&mut self, topology: ProcessTopology, mode: DistributionMode) -> StreamResult<u32> {
    if self.to_request.is_empty() {
      return Err(StreamError::EmptyQueue);
    }

    match mode {
      DistributionMode::RoundRobin => {
        let mut mine = NO_BLOCK;
        for turn in 0..topology.size {
          let Some(id) = self.to_request.pop_front() else {
            break;
          };
          self.requested.insert(id);
          if turn == topology.rank {
            mine = id;
          }
        }
        Ok(mine)
      }
      DistributionMode::OwnershipHints => {
        let id = self.to_request.pop_front().ok_or(StreamError::EmptyQueue)?;
        self.requested.insert(id);
        Ok(id)
      }
    }
  }
}

#[cfg(test)]
#[path = "distributor_test.rs"]
mod distributor_test;
