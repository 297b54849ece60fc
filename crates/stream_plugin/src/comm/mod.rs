//! Collective operations needed by cooperating ranks.
//!
//! Every call is a synchronous collective: all ranks of the group must reach
//! the matching call, in the same order, or the group stalls.

pub mod local;

pub use local::LocalGroup;

use crate::error::StreamResult;

/// Index of the min/max entries of a `[xmin, xmax, ymin, ymax, zmin, zmax]`
/// array: even slots reduce with `min`, odd slots with `max`.
pub fn combine_min_max(acc: &mut [f64; 6], other: &[f64; 6]) {
  for i in 0..6 {
    acc[i] = if i % 2 == 0 {
      acc[i].min(other[i])
    } else {
      acc[i].max(other[i])
    };
  }
}

pub trait Collectives {
  fn rank(&self) -> usize;

  fn size(&self) -> usize;

  #[inline]
  fn is_root(&self) -> bool {
    self.rank() == 0
  }

  /// Element-wise global min (even slots) / max (odd slots) of bounds.
  fn all_reduce_min_max(&self, local: [f64; 6]) -> StreamResult<[f64; 6]>;

  /// Logical OR across all ranks.
  fn all_reduce_or(&self, local: bool) -> StreamResult<bool>;

  /// Concatenate every rank's ids in rank order on rank 0. Other ranks get
  /// `None`.
  fn gather_to_root(&self, local: &[u32]) -> StreamResult<Option<Vec<u32>>>;

  /// Rank 0's value, on every rank.
  fn broadcast_u64(&self, value: u64) -> StreamResult<u64>;
}

/// Group of one.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Collectives for SingleProcess {
  fn rank(&self) -> usize {
    0
  }

  fn size(&self) -> usize {
    1
  }

  fn all_reduce_min_max(&self, local: [f64; 6]) -> StreamResult<[f64; 6]> {
    Ok(local)
  }

  fn all_reduce_or(&self, local: bool) -> StreamResult<bool> {
    Ok(local)
  }

  fn gather_to_root(&self, local: &[u32]) -> StreamResult<Option<Vec<u32>>> {
    Ok(Some(local.to_vec()))
  }

  fn broadcast_u64(&self, value: u64) -> StreamResult<u64> {
    Ok(value)
  }
}
