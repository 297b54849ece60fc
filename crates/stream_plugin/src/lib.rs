//! stream_plugin - View-driven incremental streaming of multi-block datasets
//!
//! This crate decides which blocks of a hierarchical (AMR) or particle
//! dataset to fetch next for a camera, fetches them one round at a time
//! through a pull-style request protocol, and accumulates the produced
//! geometry for rendering while purging blocks that are no longer wanted.
//!
//! # Features
//!
//! - **Screen coverage**: bounding-sphere estimate of how much of the view a
//!   block fills, plus its distance from the near plane
//! - **Priority queues**: AMR policy (purge what fell out of view) and
//!   particle policy (one level per slot, step down before purging)
//! - **Distribution**: round-robin or ownership-hinted block assignment
//!   across cooperating ranks
//! - **Streaming representations**: the Idle → AwaitingFetch → MergingPiece
//!   protocol around any [`source::BlockSource`]
//!
//! # Example
//!
//! ```ignore
//! use stream_plugin::{
//!   AmrOutlineRepresentation, RegisteredSource, RepresentationConfig, SingleProcess,
//!   StreamingContext, ViewPlanes,
//! };
//!
//! let ctx = StreamingContext::shared(true);
//! ctx.register("scene", dataset);
//! let mut source = RegisteredSource::new(ctx.clone(), "scene");
//! let mut rep = AmrOutlineRepresentation::amr_outline(SingleProcess, ctx, RepresentationConfig::AMR);
//!
//! rep.update(&mut source)?;
//! let planes = ViewPlanes::from_view_projection(&view_projection);
//! while rep.streaming_update(&planes, &mut source)? {
//!   draw(rep.render());
//! }
//! ```

pub mod bounds;
pub mod constants;
pub mod coverage;
pub mod error;
pub mod frustum;
pub mod metadata;

pub use bounds::BlockBounds;
pub use constants::NO_BLOCK;
pub use coverage::ScreenCoverage;
pub use error::{StreamError, StreamResult};
pub use frustum::ViewPlanes;
pub use metadata::{BlockMeta, CompositeMetadata};

// Priority queues and distribution
pub mod queue;
pub use queue::{
  AmrBlockQueue, BlockQueue, DistributionMode, ParticleBlockQueue, ProcessTopology, SelectionConfig,
};

// Payloads and geometry
pub mod dataset;
pub mod geometry;
pub mod render_tree;
pub use dataset::{CompositeDataset, Dataset, ImagePatch};
pub use geometry::{GeometryOptions, GeometryProducer, GeometryRepresentation, PolyGeometry};
pub use render_tree::RenderTree;

// Parallel geometry production
pub mod geometry_stage;
pub use geometry_stage::{GeometryCompletion, GeometryRequest, GeometryStage};

// Cooperating ranks
pub mod comm;
pub use comm::{Collectives, LocalGroup, SingleProcess};

// Registry, sources and the streaming protocol
pub mod context;
pub mod representation;
pub mod source;
pub use context::StreamingContext;
pub use representation::{
  AmrOutlineRepresentation, ParticleRepresentation, StreamPhase, StreamingRepresentation,
};
pub use source::{BlockRequest, BlockSource, RegisteredSource};

pub mod config;
pub use config::{RepresentationConfig, StreamingConfig};

pub mod metrics;

#[cfg(test)]
mod test_utils;
