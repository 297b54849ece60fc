//! Max-priority container of block records with bulk re-prioritization.

use std::collections::BinaryHeap;

use super::item::BlockItem;
use crate::bounds::BlockBounds;
use crate::coverage;
use crate::frustum::ViewPlanes;

/// Binary max-heap of [`BlockItem`] keyed by priority.
#[derive(Clone, Debug, Default)]
pub struct StreamingPriorityQueue {
  heap: BinaryHeap<BlockItem>,
}

impl StreamingPriorityQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, item: BlockItem) {
    self.heap.push(item);
  }

  /// Highest-priority item, if any.
  pub fn pop(&mut self) -> Option<BlockItem> {
    self.heap.pop()
  }

  pub fn peek(&self) -> Option<&BlockItem> {
    self.heap.peek()
  }

  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }

  pub fn len(&self) -> usize {
    self.heap.len()
  }

  pub fn clear(&mut self) {
    self.heap.clear();
  }

  /// Recompute coverage, distance and priority of every item.
  ///
  /// Items with invalid bounds are dropped. When `clamp` is valid, items with
  /// neither corner inside it are dropped too.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "queue::update_priorities"))]
  pub fn update_priorities(&mut self, planes: &ViewPlanes, clamp: &BlockBounds) {
    let items = std::mem::take(&mut self.heap).into_vec();
    let clamp_active = clamp.is_valid();
    let before = items.len();

    let survivors: Vec<BlockItem> = items
      .into_iter()
      .filter(|item| item.bounds.is_valid())
      .filter(|item| !clamp_active || clamp.contains_either_corner(&item.bounds))
      .map(|mut item| {
        let estimate = coverage::estimate(planes, &item.bounds);
        item.coverage = estimate.coverage;
        item.distance = estimate.distance;
        item.priority = coverage::priority(item.coverage, item.refinement, item.distance);
        item
      })
      .collect();

    tracing::trace!(
      before,
      after = survivors.len(),
      clamp_active,
      "re-prioritized blocks"
    );

    self.heap = BinaryHeap::from(survivors);
  }

  /// Pop every item in priority order.
  pub fn drain_sorted(&mut self) -> Vec<BlockItem> {
    let mut out = Vec::with_capacity(self.heap.len());
    while let Some(item) = self.heap.pop() {
      out.push(item);
    }
    out
  }
}

#[cfg(test)]
#[path = "priority_test.rs"]
mod priority_test;
