//! Lightweight composite-structure description of a streamable dataset.
//!
//! Metadata describes every block (bounds, detail hint, owner) without the
//! heavy payload. Blocks are numbered by a flat index that walks levels in
//! order: all of level 0, then all of level 1, and so on.

use crate::bounds::BlockBounds;
use crate::error::{StreamError, StreamResult};

/// Per-block entry of the metadata skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMeta {
  /// Spatial extent; invalid bounds mark a block to skip.
  pub bounds: BlockBounds,
  /// Externally supplied detail hint (e.g. point count). 0 means "none".
  pub amount_of_detail: f64,
  /// Rank expected to load this block, when ownership hints are used.
  pub owner: Option<usize>,
}

impl BlockMeta {
  pub fn new(bounds: BlockBounds) -> Self {
    Self {
      bounds,
      amount_of_detail: 0.0,
      owner: None,
    }
  }

  pub fn with_detail(mut self, amount_of_detail: f64) -> Self {
    self.amount_of_detail = amount_of_detail;
    self
  }

  pub fn with_owner(mut self, owner: usize) -> Self {
    self.owner = Some(owner);
    self
  }
}

/// Levels x blocks skeleton of a composite dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeMetadata {
  levels: Vec<Vec<BlockMeta>>,
}

/// A block visited by [`CompositeMetadata::iter`].
#[derive(Clone, Copy, Debug)]
pub struct BlockEntry<'a> {
  pub id: u32,
  pub level: usize,
  pub index: usize,
  pub meta: &'a BlockMeta,
}

impl BlockEntry<'_> {
  /// Refinement of a block is its level (0 is coarsest).
  #[inline]
  pub fn refinement(&self) -> f64 {
    self.level as f64
  }
}

impl CompositeMetadata {
  pub fn new(levels: Vec<Vec<BlockMeta>>) -> Self {
    Self { levels }
  }

  pub fn num_levels(&self) -> usize {
    self.levels.len()
  }

  pub fn level(&self, level: usize) -> &[BlockMeta] {
    self.levels.get(level).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Total number of blocks across all levels.
  pub fn num_blocks(&self) -> usize {
    self.levels.iter().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.num_blocks() == 0
  }

  /// Flat id of `(level, index)`.
  pub fn flat_index(&self, level: usize, index: usize) -> Option<u32> {
    let count = self.levels.get(level)?.len();
    if index >= count {
      return None;
    }
    let offset: usize = self.levels[..level].iter().map(Vec::len).sum();
    u32::try_from(offset + index).ok()
  }

  /// `(level, index)` of a flat id.
  pub fn locate(&self, id: u32) -> Option<(usize, usize)> {
    let mut remaining = id as usize;
    for (level, blocks) in self.levels.iter().enumerate() {
      if remaining < blocks.len() {
        return Some((level, remaining));
      }
      remaining -= blocks.len();
    }
    None
  }

  pub fn block(&self, id: u32) -> Option<&BlockMeta> {
    let (level, index) = self.locate(id)?;
    self.levels[level].get(index)
  }

  pub fn block_mut(&mut self, id: u32) -> Option<&mut BlockMeta> {
    let (level, index) = self.locate(id)?;
    self.levels[level].get_mut(index)
  }

  /// Visit every block in flat-id order.
  pub fn iter(&self) -> impl Iterator<Item = BlockEntry<'_>> + '_ {
    self
      .levels
      .iter()
      .enumerate()
      .flat_map(|(level, blocks)| blocks.iter().enumerate().map(move |(index, meta)| (level, index, meta)))
      .enumerate()
      .map(|(id, (level, index, meta))| BlockEntry {
        id: id as u32,
        level,
        index,
        meta,
      })
  }

  /// Block count shared by every level.
  ///
  /// Fails when levels differ in size. An empty skeleton has 0 per level.
  pub fn blocks_per_level(&self) -> StreamResult<usize> {
    let expected = self.levels.first().map(Vec::len).unwrap_or(0);
    for (level, blocks) in self.levels.iter().enumerate() {
      if blocks.len() != expected {
        return Err(StreamError::NonUniformLevels {
          level,
          found: blocks.len(),
          expected,
        });
      }
    }
    Ok(expected)
  }

  /// Union of all valid block bounds.
  pub fn bounds(&self) -> BlockBounds {
    self.iter().fold(BlockBounds::INVALID, |acc, entry| acc.union(&entry.meta.bounds))
  }

  /// Hint ownership by flat id: block `id` goes to rank `id % num_ranks`.
  pub fn assign_round_robin_owners(&mut self, num_ranks: usize) {
    if num_ranks == 0 {
      return;
    }
    let mut id = 0usize;
    for blocks in &mut self.levels {
      for meta in blocks {
        meta.owner = Some(id % num_ranks);
        id += 1;
      }
    }
  }
}
