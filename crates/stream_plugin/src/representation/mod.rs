//! Streaming representation: drives a block queue through the upstream
//! request protocol and accumulates delivered pieces for rendering.
//!
//! # Phases
//!
//! ```text
//!            begin_streaming_round             request_data
//!   Idle ───────────────────────────▶ AwaitingFetch ─────────▶ MergingPiece
//!    ▲                                                               │
//!    └───────────────────── end_streaming_round ─────────────────────┘
//! ```
//!
//! A plain [`StreamingRepresentation::update`] in `Idle` is a full pass: it
//! restarts the queue, rebuilds the processed data from the source's
//! default request and resets the render cache. A streaming round pops the
//! next block(s), runs one nested update that fetches exactly those blocks,
//! and stores the produced geometry as a piece that the next
//! [`StreamingRepresentation::render`] merges.
//!
//! All ranks of a group must call these entry points the same number of
//! times, in the same order, with bit-identical view planes.

use std::sync::Arc;

use web_time::Instant;

use crate::bounds::BlockBounds;
use crate::comm::Collectives;
use crate::config::RepresentationConfig;
use crate::context::StreamingContext;
use crate::dataset::CompositeDataset;
use crate::error::{StreamError, StreamResult};
use crate::frustum::ViewPlanes;
use crate::geometry::{GeometryOptions, GeometryRepresentation, PolyGeometry};
use crate::geometry_stage::GeometryStage;
use crate::metadata::CompositeMetadata;
use crate::metrics::StreamingMetrics;
use crate::queue::{AmrBlockQueue, BlockQueue, ParticleBlockQueue, ProcessTopology};
use crate::render_tree::RenderTree;
use crate::source::{BlockRequest, BlockSource};

/// Where a representation is inside the streaming protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamPhase {
  /// Not streaming; plain updates run full passes.
  #[default]
  Idle,
  /// Blocks were popped, the fetch has not been delivered yet.
  AwaitingFetch,
  /// The fetched piece is being turned into geometry.
  MergingPiece,
}

pub struct StreamingRepresentation<Q, C> {
  queue: Q,
  comm: C,
  context: Arc<StreamingContext>,
  config: RepresentationConfig,
  producer: GeometryRepresentation,
  stage: GeometryStage,

  phase: StreamPhase,
  round: u64,
  streaming_capable: bool,
  metadata_generation: Option<u64>,
  /// Metadata seen with a new generation, adopted by the next full pass.
  pending_metadata: Option<CompositeMetadata>,
  /// Blocks fetched by the current (or last) streaming round.
  inflight: Vec<u32>,
  /// Purge lists of every rank from the last re-prioritization (root only).
  group_purge: Vec<u32>,

  processed: RenderTree,
  processed_bounds: BlockBounds,
  processed_piece: Option<RenderTree>,
  rendered: Option<RenderTree>,

  metrics: StreamingMetrics,
}

/// Outline streaming of AMR blocks.
pub type AmrOutlineRepresentation<C> = StreamingRepresentation<AmrBlockQueue, C>;

/// Level-aware streaming of particle blocks.
pub type ParticleRepresentation<C> = StreamingRepresentation<ParticleBlockQueue, C>;

impl<C: Collectives> AmrOutlineRepresentation<C> {
  /// Outline geometry, AMR policy.
  pub fn amr_outline(comm: C, context: Arc<StreamingContext>, config: RepresentationConfig) -> Self {
    let topology = ProcessTopology::new(comm.rank(), comm.size());
    let queue = AmrBlockQueue::new(topology, config.distribution, config.selection);
    Self::new(queue, comm, context, config, GeometryOptions::OUTLINE)
  }
}

impl<C: Collectives> ParticleRepresentation<C> {
  /// Point geometry, level-aware particle policy.
  pub fn particles(comm: C, context: Arc<StreamingContext>, config: RepresentationConfig) -> Self {
    let topology = ProcessTopology::new(comm.rank(), comm.size());
    let queue = ParticleBlockQueue::new(topology, config.distribution, config.selection);
    Self::new(queue, comm, context, config, GeometryOptions::POINTS)
  }
}

impl<Q: BlockQueue, C: Collectives> StreamingRepresentation<Q, C> {
  pub fn new(
    queue: Q,
    comm: C,
    context: Arc<StreamingContext>,
    config: RepresentationConfig,
    geometry: GeometryOptions,
  ) -> Self {
    Self {
      queue,
      comm,
      context,
      config,
      producer: GeometryRepresentation::new(geometry),
      stage: GeometryStage::new(),
      phase: StreamPhase::Idle,
      round: 0,
      streaming_capable: false,
      metadata_generation: None,
      pending_metadata: None,
      inflight: Vec::new(),
      group_purge: Vec::new(),
      processed: RenderTree::new(),
      processed_bounds: BlockBounds::INVALID,
      processed_piece: None,
      rendered: None,
      metrics: StreamingMetrics::new(),
    }
  }

  /// Replace the geometry options.
  pub fn with_geometry(mut self, options: GeometryOptions) -> Self {
    self.producer = GeometryRepresentation::new(options);
    self
  }

  // ===========================================================================
  // Accessors
  // ===========================================================================

  pub fn phase(&self) -> StreamPhase {
    self.phase
  }

  /// Streaming rounds started so far.
  pub fn round(&self) -> u64 {
    self.round
  }

  pub fn is_streaming_capable(&self) -> bool {
    self.streaming_capable
  }

  pub fn queue(&self) -> &Q {
    &self.queue
  }

  pub fn comm(&self) -> &C {
    &self.comm
  }

  pub fn config(&self) -> &RepresentationConfig {
    &self.config
  }

  /// Blocks fetched by the last streaming round on this rank.
  pub fn inflight(&self) -> &[u32] {
    &self.inflight
  }

  /// Every rank's purge list from the last re-prioritization, on rank 0.
  pub fn group_purge(&self) -> &[u32] {
    &self.group_purge
  }

  /// Global bounds of the processed data.
  pub fn processed_bounds(&self) -> BlockBounds {
    self.processed_bounds
  }

  /// Render cache, `None` until the first render after a full pass.
  pub fn rendered(&self) -> Option<&RenderTree> {
    self.rendered.as_ref()
  }

  pub fn metrics(&self) -> &StreamingMetrics {
    &self.metrics
  }

  // ===========================================================================
  // Request protocol
  // ===========================================================================

  /// Read the source's structural metadata and decide streaming capability.
  pub fn request_information<S: BlockSource + ?Sized>(&mut self, source: &S) {
    match source.metadata() {
      Some(meta) => {
        self.streaming_capable = self.context.streaming_enabled();
        if self.metadata_generation != Some(meta.generation) {
          tracing::debug!(generation = meta.generation, "new upstream metadata");
          self.metadata_generation = Some(meta.generation);
          self.pending_metadata = Some(meta.metadata);
        }
      }
      None => self.streaming_capable = false,
    }
  }

  /// Blocks the next execution should materialize.
  pub fn request_update_extent(&self) -> BlockRequest {
    match self.phase {
      StreamPhase::Idle => BlockRequest::Default,
      StreamPhase::AwaitingFetch | StreamPhase::MergingPiece => BlockRequest::Blocks(self.inflight.clone()),
    }
  }

  /// Turn delivered data into processed geometry.
  pub fn request_data(&mut self, data: CompositeDataset) -> StreamResult<()> {
    match self.phase {
      StreamPhase::Idle => self.process_full(data),
      StreamPhase::AwaitingFetch | StreamPhase::MergingPiece => {
        self.phase = StreamPhase::MergingPiece;
        self.process_piece(&data);
        Ok(())
      }
    }
  }

  fn produce(&mut self, data: &CompositeDataset) -> RenderTree {
    self.stage.enqueue_composite(data);
    self.stage.tick(&self.producer);
    let mut tree = RenderTree::new();
    for completion in self.stage.drain_completions() {
      self.metrics.record_geometry_timing(completion.produce_time_us);
      tree.insert(completion.id, completion.geometry);
    }
    tree
  }

  fn process_full(&mut self, data: CompositeDataset) -> StreamResult<()> {
    if self.streaming_capable {
      // The render cache restarts below, so streamed state restarts too.
      let metadata = match self.pending_metadata.take() {
        Some(metadata) => metadata,
        None => self.queue.metadata().clone(),
      };
      self.queue.initialize(metadata)?;
    }

    self.processed = self.produce(&data);
    let local = self.processed.bounds();
    let global = self.comm.all_reduce_min_max(local.to_array())?;
    self.processed_bounds = BlockBounds::from_array(global);
    self.processed_piece = None;
    self.rendered = None;

    tracing::debug!(
      rank = self.comm.rank(),
      blocks = self.processed.len(),
      capable = self.streaming_capable,
      "full update processed"
    );
    Ok(())
  }

  fn process_piece(&mut self, data: &CompositeDataset) {
    let piece = self.produce(data);
    self.processed_bounds.add_bounds(&piece.bounds());
    self.processed_piece.get_or_insert_with(RenderTree::new).merge(piece);
  }

  /// One pass of the request protocol against `source`.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "representation::update"))]
  pub fn update<S: BlockSource + ?Sized>(&mut self, source: &mut S) -> StreamResult<()> {
    self.request_information(source);
    let request = self.request_update_extent();
    let data = source.execute(&request)?;
    self.request_data(data)
  }

  // ===========================================================================
  // Streaming
  // ===========================================================================

  /// Re-prioritize for `planes` and, if any rank still has work, pop this
  /// round's blocks and move to [`StreamPhase::AwaitingFetch`].
  ///
  /// Returns `false` when there is nothing to stream.
  pub fn begin_streaming_round(&mut self, planes: &ViewPlanes) -> StreamResult<bool> {
    if self.phase != StreamPhase::Idle {
      return Err(StreamError::ReentrantStreamingUpdate);
    }
    if !self.streaming_capable {
      return Ok(false);
    }

    let start = Instant::now();
    let changed = self.queue.update(planes, &self.config.clamp());
    if changed {
      self.metrics.record_update_timing(start.elapsed().as_micros() as u64);
      if Q::CONSULT_PEERS {
        let local: Vec<u32> = self.queue.blocks_to_purge().iter().copied().collect();
        if let Some(all) = self.comm.gather_to_root(&local)? {
          tracing::debug!(purged = all.len(), "group purge list gathered");
          self.group_purge = all;
        }
      }
    }

    let local_pending = !self.queue.is_empty();
    let pending = if Q::CONSULT_PEERS {
      self.comm.all_reduce_or(local_pending)?
    } else {
      local_pending
    };
    if !pending {
      tracing::trace!(rank = self.comm.rank(), "nothing left to stream");
      return Ok(false);
    }

    self.round += 1;
    if self.config.verify_rounds {
      let root = self.comm.broadcast_u64(self.round)?;
      if root != self.round {
        tracing::warn!(rank = self.comm.rank(), local = self.round, root, "streaming rounds diverged");
        return Err(StreamError::RoundDesync {
          rank: self.comm.rank(),
          local: self.round,
          root,
        });
      }
    }

    self.inflight = self.queue.pop_batch(self.config.request_size)?;
    self.metrics.record_round(self.inflight.len());
    tracing::debug!(
      rank = self.comm.rank(),
      round = self.round,
      blocks = ?self.inflight,
      "streaming round"
    );
    self.phase = StreamPhase::AwaitingFetch;
    Ok(true)
  }

  /// Return to [`StreamPhase::Idle`], whether or not the fetch completed.
  pub fn end_streaming_round(&mut self) {
    self.phase = StreamPhase::Idle;
  }

  /// Stream the next piece for `planes` from `source`.
  ///
  /// Returns `false` when nothing is left to stream for this camera on any
  /// rank. A `true` round with an empty [`inflight`](Self::inflight) means
  /// this rank got no blocks while its peers did; the source is not executed.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "representation::streaming_update"))]
  pub fn streaming_update<S: BlockSource + ?Sized>(
    &mut self,
    planes: &ViewPlanes,
    source: &mut S,
  ) -> StreamResult<bool> {
    if !self.begin_streaming_round(planes)? {
      return Ok(false);
    }
    if self.inflight.is_empty() {
      // Peers still had work, so the round counts to keep ranks in lockstep.
      tracing::trace!(rank = self.comm.rank(), round = self.round, "no blocks this round");
      self.end_streaming_round();
      return Ok(true);
    }
    let result = self.update(source);
    self.end_streaming_round();
    result.map(|()| true)
  }

  // ===========================================================================
  // Render
  // ===========================================================================

  /// Apply pending purges, merge any pending piece into the render cache and
  /// return it.
  pub fn render(&mut self) -> &RenderTree {
    let mut rendered = match self.rendered.take() {
      Some(rendered) => rendered,
      None => self.processed.clone(),
    };

    let mut piece = self.processed_piece.take();
    if self.config.purge_on_merge {
      // Pieces from several rounds may have piled up since the last render,
      // so superseded blocks can sit in either tree.
      let purge = self.queue.take_blocks_to_purge();
      if !purge.is_empty() {
        let mut removed = rendered.purge(&purge);
        if let Some(piece) = piece.as_mut() {
          removed += piece.purge(&purge);
        }
        self.metrics.record_purge(removed);
        tracing::debug!(rank = self.comm.rank(), removed, "purged blocks");
      }
    }

    if let Some(piece) = piece {
      let replaced = rendered.merge(piece);
      tracing::trace!(blocks = rendered.len(), replaced, "piece merged");
    }

    self.rendered.insert(rendered)
  }

  /// Render cache flattened into one geometry for a renderable sink.
  pub fn rendered_geometry(&mut self) -> PolyGeometry {
    self.render().flatten()
  }
}
