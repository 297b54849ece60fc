//! Synthetic multi-level datasets and the demo camera path.

use glam::{DMat4, DVec3};
use stream_plugin::{
  BlockBounds, BlockMeta, CompositeDataset, CompositeMetadata, Dataset, ImagePatch, ViewPlanes,
};

/// Center of every generated hierarchy.
pub const SCENE_CENTER: DVec3 = DVec3::new(0.0, 0.0, -40.0);
/// Half extent of level 0.
pub const SCENE_HALF_EXTENT: f64 = 32.0;

/// Generated payloads plus the skeleton advertised for them.
pub struct Scene {
  pub dataset: CompositeDataset,
  pub metadata: CompositeMetadata,
}

impl Scene {
  fn from_levels(levels: Vec<Vec<(BlockBounds, Dataset)>>) -> Self {
    let metadata = CompositeMetadata::new(
      levels
        .iter()
        .map(|level| {
          level
            .iter()
            .map(|(b, d)| BlockMeta::new(*b).with_detail(d.point_count() as f64))
            .collect()
        })
        .collect(),
    );
    let dataset = CompositeDataset::new(
      levels
        .into_iter()
        .map(|level| level.into_iter().map(|(_, d)| Some(d)).collect())
        .collect(),
    );
    Self { dataset, metadata }
  }
}

/// `side³` blocks tiling the cube of the given center and half extent.
fn tile(center: DVec3, half_extent: f64, side: usize) -> Vec<BlockBounds> {
  let size = 2.0 * half_extent / side as f64;
  let origin = center - DVec3::splat(half_extent);
  let mut out = Vec::with_capacity(side * side * side);
  for z in 0..side {
    for y in 0..side {
      for x in 0..side {
        let min = origin + DVec3::new(x as f64, y as f64, z as f64) * size;
        out.push(BlockBounds::new(min, min + DVec3::splat(size)));
      }
    }
  }
  out
}

/// Nested refinement: level `l` tiles a cube half the size of level `l - 1`
/// around the scene center, so finer levels only exist near the middle.
pub fn amr_hierarchy(levels: usize, side: usize) -> Scene {
  Scene::from_levels(
    (0..levels)
      .map(|level| {
        let half = SCENE_HALF_EXTENT * 0.5f64.powi(level as i32);
        tile(SCENE_CENTER, half, side)
          .into_iter()
          .map(|b| (b, Dataset::Image(ImagePatch::covering(&b, [5, 5, 5]))))
          .collect()
      })
      .collect(),
  )
}

/// Every level tiles the same cube; level `l` has `2^(l+1)` lattice points
/// per axis in each block.
pub fn particle_levels(levels: usize, side: usize) -> Scene {
  let slots = tile(SCENE_CENTER, SCENE_HALF_EXTENT, side);
  Scene::from_levels(
    (0..levels)
      .map(|level| {
        let per_axis = 2usize << level;
        slots
          .iter()
          .map(|b| (*b, Dataset::Points(lattice(b, per_axis))))
          .collect()
      })
      .collect(),
  )
}

fn lattice(bounds: &BlockBounds, per_axis: usize) -> Vec<DVec3> {
  let step = bounds.size() / per_axis as f64;
  let half = step * 0.5;
  let mut points = Vec::with_capacity(per_axis.pow(3));
  for k in 0..per_axis {
    for j in 0..per_axis {
      for i in 0..per_axis {
        points.push(bounds.min + half + DVec3::new(i as f64, j as f64, k as f64) * step);
      }
    }
  }
  points
}

/// Dolly from outside the scene to its center, `t` in `[0, 1]`.
pub fn dolly(t: f64) -> ViewPlanes {
  let z = 80.0 - 120.0 * t.clamp(0.0, 1.0);
  let eye = DVec3::new(4.0, 2.0, z);
  let view = DMat4::look_at_rh(eye, eye - DVec3::Z, DVec3::Y);
  let proj = DMat4::perspective_rh_gl(60f64.to_radians(), 16.0 / 9.0, 0.1, 500.0);
  ViewPlanes::from_view_projection(&(proj * view))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_amr_hierarchy_shrinks_per_level() {
    let scene = amr_hierarchy(3, 2);
    assert_eq!(scene.dataset.num_blocks(), 24);
    let meta = &scene.metadata;
    let level0 = meta.level(0)[0].bounds.size().x;
    let level2 = meta.level(2)[0].bounds.size().x;
    assert!((level0 / level2 - 4.0).abs() < 1e-9);
    assert!(meta.blocks_per_level().is_ok());
  }

  #[test]
  fn test_particle_levels_share_slots() {
    let scene = particle_levels(2, 2);
    let meta = &scene.metadata;
    assert_eq!(meta.level(0)[3].bounds, meta.level(1)[3].bounds);
    assert!(meta.level(1)[0].amount_of_detail > meta.level(0)[0].amount_of_detail);
  }
}
