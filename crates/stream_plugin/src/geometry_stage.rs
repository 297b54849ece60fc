//! Parallel geometry production for delivered blocks.
//!
//! Enqueue → Tick → Drain: blocks of a delivered composite are queued, a
//! tick runs the producer on all of them with rayon, and completions are
//! drained with their timings.

use rayon::prelude::*;
use web_time::Instant;

use crate::dataset::{CompositeDataset, Dataset};
use crate::geometry::{GeometryProducer, PolyGeometry};

/// One block waiting for geometry.
#[derive(Clone)]
pub struct GeometryRequest {
  /// Flat block id
  pub id: u32,
  pub dataset: Dataset,
}

/// Produced geometry for one block.
pub struct GeometryCompletion {
  pub id: u32,
  pub geometry: PolyGeometry,
  /// Production time in microseconds
  pub produce_time_us: u64,
}

#[derive(Default)]
pub struct GeometryStage {
  pending: Vec<GeometryRequest>,
  completed: Vec<GeometryCompletion>,
}

impl GeometryStage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn enqueue(&mut self, id: u32, dataset: Dataset) {
    self.pending.push(GeometryRequest { id, dataset });
  }

  /// Queue every present block of a composite.
  pub fn enqueue_composite(&mut self, data: &CompositeDataset) {
    for (id, dataset) in data.iter() {
      self.enqueue(id, dataset.clone());
    }
  }

  /// Produce geometry for all pending requests in parallel.
  /// Returns the number of blocks processed this tick.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "geometry::tick"))]
  pub fn tick<P>(&mut self, producer: &P) -> usize
  where
    P: GeometryProducer + Sync,
  {
    if self.pending.is_empty() {
      return 0;
    }

    let requests = std::mem::take(&mut self.pending);
    let count = requests.len();

    let completions: Vec<GeometryCompletion> = requests
      .into_par_iter()
      .map(|req| {
        let start = Instant::now();
        let geometry = producer.produce(&req.dataset);
        let produce_time_us = start.elapsed().as_micros() as u64;
        GeometryCompletion {
          id: req.id,
          geometry,
          produce_time_us,
        }
      })
      .collect();

    self.completed.extend(completions);
    count
  }

  pub fn drain_completions(&mut self) -> Vec<GeometryCompletion> {
    std::mem::take(&mut self.completed)
  }

  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  pub fn completed_count(&self) -> usize {
    self.completed.len()
  }

  pub fn is_idle(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }
}

#[cfg(test)]
#[path = "geometry_stage_test.rs"]
mod geometry_stage_test;
