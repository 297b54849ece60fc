//! Screen-coverage estimate for a block against the view frustum.
//!
//! The block is approximated by its bounding sphere. The four side planes
//! bound the visible footprint; the sphere's extent past each side plane is
//! subtracted from the footprint it spans. This is a heuristic for ordering,
//! not an exact polygon clip.

use crate::bounds::BlockBounds;
use crate::constants::{NEAR_PLANE, PLANE_COUNT, SIDE_PLANES};
use crate::frustum::ViewPlanes;

/// Result of a coverage estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenCoverage {
  /// Fraction of the frustum footprint covered, in `[0, 1]`.
  pub coverage: f64,
  /// Signed distance from the near plane to the sphere center.
  pub distance: f64,
}

impl ScreenCoverage {
  pub const NONE: Self = Self {
    coverage: 0.0,
    distance: 0.0,
  };
}

/// Estimate how much of the view a block covers and how far it is.
///
/// Invalid bounds return `(0, 0)`. A sphere fully behind any plane returns
/// coverage 0 with whatever near distance was computed before the cull.
pub fn estimate(planes: &ViewPlanes, bounds: &BlockBounds) -> ScreenCoverage {
  if !bounds.is_valid() {
    return ScreenCoverage::NONE;
  }

  let center = bounds.center();
  let radius = bounds.diagonal_length() * 0.5;

  let mut screen_bounds = [0.0; SIDE_PLANES];
  let mut distance = 0.0;

  for i in 0..PLANE_COUNT {
    let d = planes.signed_distance(i, center);
    if d < -radius {
      return ScreenCoverage {
        coverage: 0.0,
        distance,
      };
    }
    if i < SIDE_PLANES {
      screen_bounds[i] = d - radius;
    } else if i == NEAR_PLANE {
      distance = d;
    }
  }

  let full_w = screen_bounds[0] + screen_bounds[1] + 2.0 * radius;
  let full_h = screen_bounds[2] + screen_bounds[3] + 2.0 * radius;

  let part_w = full_w - screen_bounds[0].max(0.0) - screen_bounds[1].max(0.0);
  let part_h = full_h - screen_bounds[2].max(0.0) - screen_bounds[3].max(0.0);

  let denominator = full_w * full_h;
  let coverage = if denominator == 0.0 {
    0.0
  } else {
    ((part_w * part_h) / denominator).clamp(0.0, 1.0)
  };

  ScreenCoverage { coverage, distance }
}

/// `coverage^2 / (1 + refinement^2 + distance)`, or 0 when nothing is covered.
#[inline]
pub fn priority(coverage: f64, refinement: f64, distance: f64) -> f64 {
  if coverage > 0.0 {
    coverage * coverage / (1.0 + refinement * refinement + distance)
  } else {
    0.0
  }
}

#[cfg(test)]
#[path = "coverage_test.rs"]
mod coverage_test;
