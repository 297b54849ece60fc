//! Tuning constants for block prioritization and selection.
//!
//! The selection thresholds are empirically tuned. They are exposed here as
//! defaults; `SelectionConfig` carries the values actually used at runtime.

/// Sentinel returned by a pop when the calling rank gets no block this round.
pub const NO_BLOCK: u32 = u32::MAX;

/// Number of frustum planes (left, right, bottom, top, near, far).
pub const PLANE_COUNT: usize = 6;

/// Coefficients per plane (`a, b, c, d` of `ax + by + cz + d = 0`).
pub const PLANE_COEFFICIENTS: usize = 4;

/// Total doubles in a view-plane set.
pub const VIEW_PLANE_LEN: usize = PLANE_COUNT * PLANE_COEFFICIENTS; // 24

/// Index of the near plane inside a view-plane set.
pub const NEAR_PLANE: usize = 4;

/// Number of side planes (left, right, bottom, top).
pub const SIDE_PLANES: usize = 4;

/// Coverage at or above which a block is wanted regardless of refinement.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 0.75;

/// Blocks at or below this refinement are wanted whenever considered.
pub const DEFAULT_EAGER_REFINEMENT: f64 = 1.0;

/// Normalized feature-size threshold for detail-aware selection.
pub const DEFAULT_DETAIL_LEVEL_TO_LOAD: f64 = 8.5e-5;

/// Lower bound for a block diagonal in the detail-aware test.
pub const MIN_DIAGONAL: f64 = 1e-10;

/// Blocks fetched per streaming round by the AMR outline representation.
pub const AMR_REQUEST_SIZE: usize = 1;

/// Blocks fetched per streaming round by the particle representation.
pub const PARTICLE_REQUEST_SIZE: usize = 50;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_view_plane_len_is_24() {
    assert_eq!(VIEW_PLANE_LEN, 24);
    assert!(NEAR_PLANE < PLANE_COUNT);
    assert_eq!(SIDE_PLANES, NEAR_PLANE);
  }
}
