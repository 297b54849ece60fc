//! Accumulated render-side geometry, one slot per block.

use std::collections::BTreeMap;

use crate::bounds::BlockBounds;
use crate::geometry::PolyGeometry;

/// Tree of block geometries keyed by flat id.
///
/// Merging a re-delivered block replaces its slot; purging empties it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderTree {
  blocks: BTreeMap<u32, PolyGeometry>,
}

impl RenderTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, id: u32, geometry: PolyGeometry) {
    self.blocks.insert(id, geometry);
  }

  pub fn get(&self, id: u32) -> Option<&PolyGeometry> {
    self.blocks.get(&id)
  }

  pub fn contains(&self, id: u32) -> bool {
    self.blocks.contains_key(&id)
  }

  pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
    self.blocks.keys().copied()
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  /// Append every block of `piece`. Returns how many slots were replaced.
  pub fn merge(&mut self, piece: RenderTree) -> usize {
    let mut replaced = 0;
    for (id, geometry) in piece.blocks {
      if self.blocks.insert(id, geometry).is_some() {
        replaced += 1;
      }
    }
    replaced
  }

  /// Null out the listed blocks. Returns how many were present.
  pub fn purge<'a>(&mut self, ids: impl IntoIterator<Item = &'a u32>) -> usize {
    ids
      .into_iter()
      .filter(|id| self.blocks.remove(*id).is_some())
      .count()
  }

  /// All blocks appended into one geometry, in id order.
  pub fn flatten(&self) -> PolyGeometry {
    let mut out = PolyGeometry::new();
    for geometry in self.blocks.values() {
      out.append(geometry);
    }
    out
  }

  pub fn bounds(&self) -> BlockBounds {
    self
      .blocks
      .values()
      .fold(BlockBounds::INVALID, |acc, g| acc.union(&g.bounds()))
  }
}
