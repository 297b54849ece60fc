//! Fixtures shared by unit tests.
//!
//! The reference scene has 3 levels of 4 blocks:
//! - level 0: unit cubes along x at `z in [-11, -10]`
//! - level 1: block 4 at the origin close to the camera, blocks 5-7 far off
//! - level 2: blocks 8-11 far off
//!
//! [`wide_view`] sees only level 0; [`zoom_view`] also fills the screen with
//! block 4.

use glam::DVec3;

use crate::bounds::BlockBounds;
use crate::dataset::{CompositeDataset, Dataset, ImagePatch};
use crate::frustum::ViewPlanes;
use crate::metadata::{BlockMeta, CompositeMetadata};

pub fn aabb(min: [f64; 3], max: [f64; 3]) -> BlockBounds {
  BlockBounds::new(DVec3::from_array(min), DVec3::from_array(max))
}

/// Bounds of the reference scene in flat-id order.
pub fn scene_bounds() -> Vec<Vec<BlockBounds>> {
  let level0 = (0..4)
    .map(|i| {
      let x = -2.0 + i as f64;
      aabb([x, -0.5, -11.0], [x + 1.0, 0.5, -10.0])
    })
    .collect();
  let far = |i: usize, level: usize| {
    let x = 50.0 + 2.0 * i as f64 + 10.0 * level as f64;
    aabb([x, 0.0, -10.0], [x + 1.0, 1.0, -9.0])
  };
  let level1 = std::iter::once(aabb([-0.5, -0.5, -3.0], [0.5, 0.5, -2.0]))
    .chain((1..4).map(|i| far(i, 1)))
    .collect();
  let level2 = (0..4).map(|i| far(i, 2)).collect();
  vec![level0, level1, level2]
}

pub fn scene_metadata() -> CompositeMetadata {
  CompositeMetadata::new(
    scene_bounds()
      .into_iter()
      .map(|level| level.into_iter().map(BlockMeta::new).collect())
      .collect(),
  )
}

/// Reference scene as image patches with one cell per unit.
pub fn scene_dataset() -> CompositeDataset {
  CompositeDataset::new(
    scene_bounds()
      .into_iter()
      .map(|level| {
        level
          .into_iter()
          .map(|b| Some(Dataset::Image(ImagePatch::covering(&b, [2, 2, 2]))))
          .collect()
      })
      .collect(),
  )
}

/// Only level 0 is on screen; block 4 is in front of the near plane.
pub fn wide_view() -> ViewPlanes {
  ViewPlanes::orthographic(3.0, 3.0, 5.0, 100.0)
}

/// Block 4 covers the whole screen; level 0 is still partly visible.
pub fn zoom_view() -> ViewPlanes {
  ViewPlanes::orthographic(0.8, 0.8, 1.0, 100.0)
}

/// Sees x in `[-3, -0.9]`: level-0 blocks 0 and 1 only.
pub fn left_view() -> ViewPlanes {
  ViewPlanes::from_planes([
    [1.0, 0.0, 0.0, 3.0],
    [-1.0, 0.0, 0.0, -0.9],
    [0.0, 1.0, 0.0, 3.0],
    [0.0, -1.0, 0.0, 3.0],
    [0.0, 0.0, -1.0, -5.0],
    [0.0, 0.0, 1.0, 100.0],
  ])
}

/// Uniform `levels x per_level` grid of unit cubes stacked along z by level.
pub fn grid_metadata(levels: usize, per_level: usize) -> CompositeMetadata {
  CompositeMetadata::new(
    (0..levels)
      .map(|l| {
        (0..per_level)
          .map(|i| {
            let x = i as f64 - per_level as f64 * 0.5;
            BlockMeta::new(aabb([x, -0.5, -10.0 - l as f64], [x + 1.0, 0.5, -9.0 - l as f64]))
          })
          .collect()
      })
      .collect(),
  )
}
