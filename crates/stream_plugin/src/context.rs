//! Injected registry of streamable datasets plus the global streaming switch.
//!
//! Representations and sources share one context through an `Arc`. Each
//! test or session builds its own, so nothing here is process-wide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::dataset::CompositeDataset;
use crate::metadata::CompositeMetadata;

/// A dataset registered under a key.
#[derive(Clone, Debug)]
pub struct RegisteredDataset {
  /// Bumped on every (re-)registration; a change means "new metadata".
  pub generation: u64,
  pub dataset: Arc<CompositeDataset>,
  pub metadata: CompositeMetadata,
}

#[derive(Debug)]
pub struct StreamingContext {
  registry: Mutex<HashMap<String, RegisteredDataset>>,
  streaming: AtomicBool,
  next_generation: AtomicU64,
}

impl Default for StreamingContext {
  fn default() -> Self {
    Self::new(true)
  }
}

impl StreamingContext {
  pub fn new(streaming_enabled: bool) -> Self {
    Self {
      registry: Mutex::new(HashMap::new()),
      streaming: AtomicBool::new(streaming_enabled),
      next_generation: AtomicU64::new(1),
    }
  }

  pub fn shared(streaming_enabled: bool) -> Arc<Self> {
    Arc::new(Self::new(streaming_enabled))
  }

  // A panic while holding the lock leaves the map itself consistent.
  fn lock(&self) -> MutexGuard<'_, HashMap<String, RegisteredDataset>> {
    self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Register (or replace) a dataset; returns its generation.
  pub fn register(&self, key: impl Into<String>, dataset: CompositeDataset) -> u64 {
    let metadata = dataset.metadata();
    self.register_with_metadata(key, dataset, metadata)
  }

  /// Register with externally supplied metadata (e.g. ownership hints).
  pub fn register_with_metadata(
    &self,
    key: impl Into<String>,
    dataset: CompositeDataset,
    metadata: CompositeMetadata,
  ) -> u64 {
    let key = key.into();
    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(%key, generation, blocks = metadata.num_blocks(), "dataset registered");
    self.lock().insert(
      key,
      RegisteredDataset {
        generation,
        dataset: Arc::new(dataset),
        metadata,
      },
    );
    generation
  }

  pub fn unregister(&self, key: &str) -> bool {
    self.lock().remove(key).is_some()
  }

  pub fn get(&self, key: &str) -> Option<RegisteredDataset> {
    self.lock().get(key).cloned()
  }

  pub fn contains(&self, key: &str) -> bool {
    self.lock().contains_key(key)
  }

  pub fn streaming_enabled(&self) -> bool {
    self.streaming.load(Ordering::Relaxed)
  }

  pub fn set_streaming_enabled(&self, enabled: bool) {
    self.streaming.store(enabled, Ordering::Relaxed);
  }
}
