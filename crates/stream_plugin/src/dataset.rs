//! Heavy block payloads and the composite tree that holds them.

use glam::DVec3;

use crate::bounds::BlockBounds;
use crate::error::{StreamError, StreamResult};
use crate::geometry::PolyGeometry;
use crate::metadata::{BlockMeta, CompositeMetadata};

/// Uniform grid patch. `dims` counts points per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePatch {
  pub origin: DVec3,
  pub spacing: DVec3,
  pub dims: [u32; 3],
}

impl ImagePatch {
  /// Patch spanning `bounds` with `dims` points per axis.
  pub fn covering(bounds: &BlockBounds, dims: [u32; 3]) -> Self {
    let cells = DVec3::new(
      dims[0].saturating_sub(1).max(1) as f64,
      dims[1].saturating_sub(1).max(1) as f64,
      dims[2].saturating_sub(1).max(1) as f64,
    );
    Self {
      origin: bounds.min,
      spacing: bounds.size() / cells,
      dims,
    }
  }

  pub fn point_count(&self) -> usize {
    self.dims.iter().map(|&d| d as usize).product()
  }

  pub fn bounds(&self) -> BlockBounds {
    if self.dims.iter().any(|&d| d == 0) {
      return BlockBounds::INVALID;
    }
    let extent = DVec3::new(
      (self.dims[0] - 1) as f64,
      (self.dims[1] - 1) as f64,
      (self.dims[2] - 1) as f64,
    ) * self.spacing;
    BlockBounds::from_points(&[self.origin, self.origin + extent])
  }

  /// Grid points, x fastest.
  pub fn points(&self) -> Vec<DVec3> {
    let [nx, ny, nz] = self.dims;
    let mut out = Vec::with_capacity(self.point_count());
    for k in 0..nz {
      for j in 0..ny {
        for i in 0..nx {
          out.push(self.origin + DVec3::new(i as f64, j as f64, k as f64) * self.spacing);
        }
      }
    }
    out
  }
}

/// Closed set of supported block kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Dataset {
  Image(ImagePatch),
  Points(Vec<DVec3>),
  Poly(PolyGeometry),
}

impl Dataset {
  pub fn bounds(&self) -> BlockBounds {
    match self {
      Dataset::Image(image) => image.bounds(),
      Dataset::Points(points) => BlockBounds::from_points(points),
      Dataset::Poly(poly) => poly.bounds(),
    }
  }

  pub fn point_count(&self) -> usize {
    match self {
      Dataset::Image(image) => image.point_count(),
      Dataset::Points(points) => points.len(),
      Dataset::Poly(poly) => poly.points.len(),
    }
  }
}

/// Levels x blocks tree of optional payloads, numbered like the metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeDataset {
  levels: Vec<Vec<Option<Dataset>>>,
}

impl CompositeDataset {
  pub fn new(levels: Vec<Vec<Option<Dataset>>>) -> Self {
    Self { levels }
  }

  /// Same shape as `self`, every slot empty.
  pub fn empty_like(&self) -> Self {
    Self {
      levels: self.levels.iter().map(|l| vec![None; l.len()]).collect(),
    }
  }

  pub fn num_blocks(&self) -> usize {
    self.levels.iter().map(Vec::len).sum()
  }

  fn locate(&self, id: u32) -> Option<(usize, usize)> {
    let mut remaining = id as usize;
    for (level, blocks) in self.levels.iter().enumerate() {
      if remaining < blocks.len() {
        return Some((level, remaining));
      }
      remaining -= blocks.len();
    }
    None
  }

  pub fn get(&self, id: u32) -> Option<&Dataset> {
    let (level, index) = self.locate(id)?;
    self.levels[level][index].as_ref()
  }

  /// Store a payload; fails when `id` is outside the tree.
  pub fn set(&mut self, id: u32, dataset: Dataset) -> StreamResult<()> {
    let (level, index) = self.locate(id).ok_or(StreamError::UnknownBlock(id))?;
    self.levels[level][index] = Some(dataset);
    Ok(())
  }

  /// Present payloads in flat-id order.
  pub fn iter(&self) -> impl Iterator<Item = (u32, &Dataset)> + '_ {
    self
      .levels
      .iter()
      .flatten()
      .enumerate()
      .filter_map(|(id, slot)| slot.as_ref().map(|d| (id as u32, d)))
  }

  /// Number of present payloads.
  pub fn len(&self) -> usize {
    self.iter().count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Copy of just the listed blocks, same shape.
  pub fn extract(&self, ids: &[u32]) -> StreamResult<Self> {
    let mut out = self.empty_like();
    for &id in ids {
      let (level, index) = self.locate(id).ok_or(StreamError::UnknownBlock(id))?;
      out.levels[level][index] = self.levels[level][index].clone();
    }
    Ok(out)
  }

  /// Copy holding only the root block (flat id 0).
  pub fn root_only(&self) -> Self {
    let mut out = self.empty_like();
    if let Some((level, index)) = self.locate(0) {
      out.levels[level][index] = self.levels[level][index].clone();
    }
    out
  }

  /// Union of payload bounds.
  pub fn bounds(&self) -> BlockBounds {
    self
      .iter()
      .fold(BlockBounds::INVALID, |acc, (_, d)| acc.union(&d.bounds()))
  }

  /// Skeleton describing every slot; point counts become detail hints.
  pub fn metadata(&self) -> CompositeMetadata {
    CompositeMetadata::new(
      self
        .levels
        .iter()
        .map(|level| {
          level
            .iter()
            .map(|slot| match slot {
              Some(d) => BlockMeta::new(d.bounds()).with_detail(d.point_count() as f64),
              None => BlockMeta::new(BlockBounds::INVALID),
            })
            .collect()
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{aabb, scene_dataset};

  #[test]
  fn test_image_patch_covering() {
    let b = aabb([0.0, 0.0, 0.0], [2.0, 4.0, 6.0]);
    let patch = ImagePatch::covering(&b, [3, 3, 4]);
    assert_eq!(patch.spacing, DVec3::new(1.0, 2.0, 2.0));
    assert_eq!(patch.bounds(), b);
    assert_eq!(patch.point_count(), 36);
    assert_eq!(patch.points().len(), 36);
    assert_eq!(patch.points()[1], DVec3::new(1.0, 0.0, 0.0));
  }

  #[test]
  fn test_extract_keeps_only_requested() {
    let data = scene_dataset();
    let piece = data.extract(&[2, 9]).unwrap();
    assert_eq!(piece.num_blocks(), data.num_blocks());
    let ids: Vec<u32> = piece.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![2, 9]);
    assert!(matches!(data.extract(&[12]), Err(StreamError::UnknownBlock(12))));
  }

  #[test]
  fn test_root_only() {
    let data = scene_dataset();
    let root = data.root_only();
    assert_eq!(root.len(), 1);
    assert!(root.get(0).is_some());
    assert!(CompositeDataset::default().root_only().is_empty());
  }

  #[test]
  fn test_root_only_skips_empty_leading_level() {
    let data = CompositeDataset::new(vec![
      vec![],
      vec![Some(Dataset::Points(vec![DVec3::ZERO])), Some(Dataset::Points(vec![DVec3::ONE]))],
    ]);
    let root = data.root_only();
    assert_eq!(root.num_blocks(), 2);
    let ids: Vec<u32> = root.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![0]);
    assert_eq!(root.get(0).map(Dataset::point_count), Some(1));
  }

  #[test]
  fn test_metadata_mirrors_payloads() {
    let mut data = scene_dataset().extract(&[0, 5]).unwrap();
    data.set(1, Dataset::Points(vec![DVec3::ZERO, DVec3::ONE])).unwrap();
    let meta = data.metadata();
    assert_eq!(meta.num_blocks(), 12);
    assert_eq!(meta.block(0).unwrap().amount_of_detail, 8.0);
    assert_eq!(meta.block(1).unwrap().amount_of_detail, 2.0);
    assert!(!meta.block(2).unwrap().bounds.is_valid());
    assert_eq!(meta.block(5).unwrap().bounds, data.get(5).unwrap().bounds());
  }
}
