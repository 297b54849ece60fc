//! Headless streaming demo.
//!
//! Synthesizes a multi-level dataset, registers it in a streaming context and
//! dollies a camera through it while one or more in-process ranks stream
//! blocks in view-priority order. Every frame logs what was fetched, purged
//! and rendered.
//!
//! ```text
//! RUST_LOG=stream_plugin=debug stream_demo --policy particles --ranks 4
//! ```

mod scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use stream_plugin::{
  AmrOutlineRepresentation, BlockQueue, Collectives, LocalGroup, ParticleRepresentation,
  RegisteredSource, StreamingConfig, StreamingContext, StreamingRepresentation,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DATASET_KEY: &str = "demo";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
  /// Outline streaming of nested AMR blocks.
  Amr,
  /// Level-aware particle streaming.
  Particles,
}

/// View-driven block streaming demo.
#[derive(Parser, Debug)]
#[command(name = "stream_demo")]
#[command(about = "Streams a synthetic multi-level dataset along a camera dolly")]
struct Args {
  /// Streaming configuration TOML file (defaults when omitted).
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Streaming policy.
  #[arg(long, value_enum, default_value_t = Policy::Amr)]
  policy: Policy,

  /// Cooperating in-process ranks.
  #[arg(long, default_value_t = 1)]
  ranks: usize,

  /// Refinement levels.
  #[arg(long, default_value_t = 3)]
  levels: usize,

  /// Blocks per axis on every level.
  #[arg(long, default_value_t = 4)]
  side: usize,

  /// Camera steps along the dolly.
  #[arg(long, default_value_t = 24)]
  frames: usize,

  /// Streaming rounds allowed per frame.
  #[arg(long, default_value_t = 16)]
  rounds_per_frame: usize,
}

/// What one rank ended up with.
#[derive(Debug, Default)]
struct RankSummary {
  rank: usize,
  rounds: u64,
  fetched: usize,
  rendered_blocks: usize,
  points: usize,
  lines: usize,
}

fn init_logging() {
  tracing_subscriber::registry()
    .with(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stream_demo=info,stream_plugin=info".into()),
    )
    .with(fmt::layer().with_target(false))
    .init();
}

fn main() -> Result<()> {
  init_logging();
  let args = Args::parse();
  anyhow::ensure!(args.ranks > 0, "--ranks must be at least 1");
  anyhow::ensure!(args.levels > 0 && args.side > 0, "--levels and --side must be at least 1");

  let config = match &args.config {
    Some(path) => StreamingConfig::load(path)
      .with_context(|| format!("Failed to load config: {}", path.display()))?,
    None => StreamingConfig::default(),
  };

  let scene = match args.policy {
    Policy::Amr => scene::amr_hierarchy(args.levels, args.side),
    Policy::Particles => scene::particle_levels(args.levels, args.side),
  };
  let mut metadata = scene.metadata;
  if args.ranks > 1 {
    metadata.assign_round_robin_owners(args.ranks);
  }
  tracing::info!(
    policy = ?args.policy,
    blocks = metadata.num_blocks(),
    levels = metadata.num_levels(),
    ranks = args.ranks,
    "scene generated"
  );

  let ctx = StreamingContext::shared(config.streaming_enabled);
  ctx.register_with_metadata(DATASET_KEY, scene.dataset, metadata);

  let summaries = thread::scope(|s| {
    let handles: Vec<_> = LocalGroup::create(args.ranks)
      .into_iter()
      .map(|comm| {
        let ctx = Arc::clone(&ctx);
        let args = &args;
        s.spawn(move || run_rank(comm, ctx, &config, args))
      })
      .collect();
    handles
      .into_iter()
      .map(|h| {
        h.join()
          .map_err(|_| anyhow::anyhow!("rank thread panicked"))?
      })
      .collect::<Result<Vec<_>>>()
  })?;

  for summary in &summaries {
    tracing::info!(
      rank = summary.rank,
      rounds = summary.rounds,
      fetched = summary.fetched,
      rendered = summary.rendered_blocks,
      points = summary.points,
      lines = summary.lines,
      "rank finished"
    );
  }
  Ok(())
}

fn run_rank(
  comm: LocalGroup,
  ctx: Arc<StreamingContext>,
  config: &StreamingConfig,
  args: &Args,
) -> Result<RankSummary> {
  let source = RegisteredSource::new(ctx.clone(), DATASET_KEY);
  match args.policy {
    Policy::Amr => {
      let rep = AmrOutlineRepresentation::amr_outline(comm, ctx, config.amr);
      drive(rep, source, args)
    }
    Policy::Particles => {
      let rep = ParticleRepresentation::particles(comm, ctx, config.particles);
      drive(rep, source, args)
    }
  }
}

/// Full pass, then stream along the dolly.
fn drive<Q: BlockQueue, C: Collectives>(
  mut rep: StreamingRepresentation<Q, C>,
  mut source: RegisteredSource,
  args: &Args,
) -> Result<RankSummary> {
  let rank = rep.comm().rank();
  rep.update(&mut source).context("Initial update failed")?;
  if !rep.is_streaming_capable() {
    tracing::warn!(rank, "streaming disabled, rendering root block only");
  }

  let mut fetched = 0;
  let steps = args.frames.max(1);
  for frame in 0..steps {
    let planes = scene::dolly(frame as f64 / (steps - 1).max(1) as f64);
    let mut rounds = 0;
    while rounds < args.rounds_per_frame && rep.streaming_update(&planes, &mut source)? {
      fetched += rep.inflight().len();
      rounds += 1;
    }
    let blocks = rep.render().len();
    tracing::info!(rank, frame, rounds, blocks, "frame rendered");
  }

  let geometry = rep.rendered_geometry();
  Ok(RankSummary {
    rank,
    rounds: rep.round(),
    fetched,
    rendered_blocks: rep.render().len(),
    points: geometry.points.len(),
    lines: geometry.lines.len(),
  })
}
