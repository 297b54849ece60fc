//! Upstream block sources.

use std::sync::Arc;

use crate::context::StreamingContext;
use crate::dataset::CompositeDataset;
use crate::error::{StreamError, StreamResult};
use crate::metadata::CompositeMetadata;

/// Which blocks an execution should materialize.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BlockRequest {
  /// Source's own default: the root block only.
  #[default]
  Default,
  /// Exactly these flat ids.
  Blocks(Vec<u32>),
}

/// Structural description advertised by a source.
#[derive(Clone, Debug)]
pub struct SourceMetadata {
  pub generation: u64,
  pub metadata: CompositeMetadata,
}

/// Upstream producer of composite data.
pub trait BlockSource {
  /// Lightweight metadata, or `None` when the source cannot stream.
  fn metadata(&self) -> Option<SourceMetadata>;

  /// Materialize the requested blocks.
  fn execute(&mut self, request: &BlockRequest) -> StreamResult<CompositeDataset>;
}

/// Serves a dataset registered in a [`StreamingContext`].
pub struct RegisteredSource {
  context: Arc<StreamingContext>,
  key: String,
  executions: u64,
}

impl RegisteredSource {
  pub fn new(context: Arc<StreamingContext>, key: impl Into<String>) -> Self {
    Self {
      context,
      key: key.into(),
      executions: 0,
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  /// Number of `execute` calls served.
  pub fn executions(&self) -> u64 {
    self.executions
  }
}

impl BlockSource for RegisteredSource {
  fn metadata(&self) -> Option<SourceMetadata> {
    self.context.get(&self.key).map(|r| SourceMetadata {
      generation: r.generation,
      metadata: r.metadata,
    })
  }

  fn execute(&mut self, request: &BlockRequest) -> StreamResult<CompositeDataset> {
    let registered = self
      .context
      .get(&self.key)
      .ok_or_else(|| StreamError::Source(format!("no dataset registered under '{}'", self.key)))?;
    self.executions += 1;
    match request {
      BlockRequest::Default => Ok(registered.dataset.root_only()),
      BlockRequest::Blocks(ids) => registered.dataset.extract(ids),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::scene_dataset;

  #[test]
  fn test_execute_default_and_blocks() {
    let ctx = StreamingContext::shared(true);
    ctx.register("scene", scene_dataset());
    let mut source = RegisteredSource::new(ctx, "scene");

    let root = source.execute(&BlockRequest::Default).unwrap();
    assert_eq!(root.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![0]);

    let piece = source.execute(&BlockRequest::Blocks(vec![4, 1])).unwrap();
    assert_eq!(piece.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(source.executions(), 2);
  }

  #[test]
  fn test_missing_key() {
    let mut source = RegisteredSource::new(StreamingContext::shared(true), "nope");
    assert!(source.metadata().is_none());
    assert!(matches!(source.execute(&BlockRequest::Default), Err(StreamError::Source(_))));
  }

  #[test]
  fn test_unknown_block() {
    let ctx = StreamingContext::shared(true);
    ctx.register("scene", scene_dataset());
    let mut source = RegisteredSource::new(ctx, "scene");
    assert!(matches!(
      source.execute(&BlockRequest::Blocks(vec![99])),
      Err(StreamError::UnknownBlock(99))
    ));
  }
}
