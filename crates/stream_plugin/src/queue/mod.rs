//! Block priority queues driving what to fetch and what to purge.
//!
//! A queue owns the metadata skeleton, a priority heap and a
//! [`BlockLedger`]. Each camera change rebuilds the heap from metadata,
//! re-prioritizes against the view planes and lets the policy decide the
//! request/purge delta.
//!
//! Two policies are provided:
//! - [`AmrBlockQueue`]: per-block wanted test, purge what is no longer wanted.
//! - [`ParticleBlockQueue`]: level-aware, keeps one level per within-level slot.

pub mod amr;
pub mod distributor;
pub mod item;
pub mod particles;
pub mod priority;
pub mod selection;

use std::collections::{BTreeSet, VecDeque};

pub use amr::AmrBlockQueue;
pub use distributor::{BlockLedger, DistributionMode, ProcessTopology};
pub use item::BlockItem;
pub use particles::ParticleBlockQueue;
pub use priority::StreamingPriorityQueue;
pub use selection::SelectionConfig;

use crate::bounds::BlockBounds;
use crate::constants::NO_BLOCK;
use crate::error::StreamResult;
use crate::frustum::ViewPlanes;
use crate::metadata::CompositeMetadata;

/// State shared by every queue policy.
#[derive(Clone, Debug, Default)]
pub struct QueueState {
  pub metadata: CompositeMetadata,
  pub heap: StreamingPriorityQueue,
  pub ledger: BlockLedger,
  /// Planes of the last effective update.
  pub previous_planes: Option<ViewPlanes>,
  pub topology: ProcessTopology,
  pub mode: DistributionMode,
  pub selection: SelectionConfig,
  /// Number of re-prioritizations performed.
  pub update_count: u64,
}

impl QueueState {
  pub fn new(topology: ProcessTopology, mode: DistributionMode, selection: SelectionConfig) -> Self {
    Self {
      topology,
      mode,
      selection,
      ..Default::default()
    }
  }

  /// Whether this rank may load a block with the given owner hint.
  #[inline]
  pub fn is_eligible(&self, item: &BlockItem) -> bool {
    self.mode.any_process_can_load_any_block()
      || item.owner.map_or(true, |owner| owner == self.topology.rank)
  }

  /// Refill the heap with one item per metadata block.
  fn rebuild_heap(&mut self) {
    self.heap.clear();
    for entry in self.metadata.iter() {
      self.heap.push(BlockItem::from(entry));
    }
  }
}

/// Common queue lifecycle; policies supply [`BlockQueue::select`].
pub trait BlockQueue {
  /// Whether the representation must agree with peers on purge lists and
  /// on "anyone still streaming".
  const CONSULT_PEERS: bool;

  fn state(&self) -> &QueueState;

  fn state_mut(&mut self) -> &mut QueueState;

  /// Check a metadata skeleton before it is adopted.
  fn validate(_metadata: &CompositeMetadata) -> StreamResult<()> {
    Ok(())
  }

  /// Turn a freshly re-prioritized heap into the request/purge delta.
  fn select(&mut self);

  /// Adopt new metadata and discard all state, including requested blocks.
  fn initialize(&mut self, metadata: CompositeMetadata) -> StreamResult<()> {
    Self::validate(&metadata)?;
    let state = self.state_mut();
    tracing::debug!(blocks = metadata.num_blocks(), "queue initialized");
    state.metadata = metadata;
    state.heap.clear();
    state.ledger.clear();
    state.previous_planes = None;
    Ok(())
  }

  /// Keep metadata and requested blocks, forget pending work.
  fn reinitialize(&mut self) {
    let state = self.state_mut();
    state.heap.clear();
    state.ledger.to_request.clear();
    state.ledger.to_purge.clear();
    state.previous_planes = None;
  }

  /// Re-prioritize for new view planes. Returns `false` without doing any
  /// work when the planes are bit-identical to the previous ones.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "queue::update"))]
  fn update(&mut self, planes: &ViewPlanes, clamp: &BlockBounds) -> bool {
    {
      let state = self.state_mut();
      if state.previous_planes.is_some_and(|prev| prev.bit_eq(planes)) {
        return false;
      }
      state.rebuild_heap();
      state.heap.update_priorities(planes, clamp);
    }

    self.select();

    let state = self.state_mut();
    state.ledger.reconcile_purges();
    state.previous_planes = Some(*planes);
    state.update_count += 1;
    tracing::debug!(
      to_request = state.ledger.to_request.len(),
      requested = state.ledger.requested.len(),
      to_purge = state.ledger.to_purge.len(),
      "queue updated"
    );
    true
  }

  fn is_empty(&self) -> bool {
    self.state().ledger.to_request.is_empty()
  }

  /// Next block for this rank, or [`NO_BLOCK`] on a short round-robin round.
  fn pop(&mut self) -> StreamResult<u32> {
    let state = self.state_mut();
    state.ledger.pop(state.topology, state.mode)
  }

  /// Up to `count` pops, skipping rounds that had nothing for this rank.
  fn pop_batch(&mut self, count: usize) -> StreamResult<Vec<u32>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
      if self.is_empty() {
        break;
      }
      let id = self.pop()?;
      if id != NO_BLOCK {
        out.push(id);
      }
    }
    Ok(out)
  }

  fn blocks_to_request(&self) -> &VecDeque<u32> {
    &self.state().ledger.to_request
  }

  fn blocks_requested(&self) -> &BTreeSet<u32> {
    &self.state().ledger.requested
  }

  fn blocks_to_purge(&self) -> &BTreeSet<u32> {
    &self.state().ledger.to_purge
  }

  /// Hand over pending purges; they are not reported again.
  fn take_blocks_to_purge(&mut self) -> BTreeSet<u32> {
    std::mem::take(&mut self.state_mut().ledger.to_purge)
  }

  fn metadata(&self) -> &CompositeMetadata {
    &self.state().metadata
  }

  fn update_count(&self) -> u64 {
    self.state().update_count
  }
}
