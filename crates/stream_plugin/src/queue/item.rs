//! Block record held by the priority queue.

use std::cmp::Ordering;

use crate::bounds::BlockBounds;
use crate::metadata::BlockEntry;

/// One block with its derived coverage, distance and priority.
#[derive(Clone, Debug)]
pub struct BlockItem {
  /// Flat block id within the current metadata generation.
  pub id: u32,
  /// Refinement level, 0 is coarsest.
  pub refinement: f64,
  pub bounds: BlockBounds,
  pub coverage: f64,
  pub distance: f64,
  pub priority: f64,
  /// Detail hint for the detail-aware policy. 0 means "none".
  pub amount_of_detail: f64,
  /// Ownership hint.
  pub owner: Option<usize>,
}

impl BlockItem {
  pub fn new(id: u32, refinement: f64, bounds: BlockBounds) -> Self {
    Self {
      id,
      refinement,
      bounds,
      coverage: 0.0,
      distance: 0.0,
      priority: 0.0,
      amount_of_detail: 0.0,
      owner: None,
    }
  }
}

impl From<BlockEntry<'_>> for BlockItem {
  fn from(entry: BlockEntry<'_>) -> Self {
    Self {
      amount_of_detail: entry.meta.amount_of_detail,
      owner: entry.meta.owner,
      ..Self::new(entry.id, entry.refinement(), entry.meta.bounds)
    }
  }
}

// Max-heap by priority; equal priorities pop the lower id first.
impl Ord for BlockItem {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .priority
      .total_cmp(&other.priority)
      .then_with(|| other.id.cmp(&self.id))
  }
}

impl PartialOrd for BlockItem {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for BlockItem {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for BlockItem {}
