//! Re-prioritization benchmarks.
//!
//! Workload: a uniform AMR-like hierarchy where every level halves the block
//! size, viewed from a camera dollying across it. This mirrors the per-frame
//! cost of a camera change.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::{DMat4, DVec3};
use stream_plugin::{
  coverage,
  queue::{BlockItem, StreamingPriorityQueue},
  AmrBlockQueue, BlockBounds, BlockMeta, BlockQueue, CompositeMetadata, DistributionMode,
  ParticleBlockQueue, ProcessTopology, SelectionConfig, ViewPlanes,
};

// =============================================================================
// Fixtures
// =============================================================================

/// `levels` levels of `side³` blocks each, all spanning the unit cube scaled
/// by 64.
fn hierarchy(levels: usize, side: usize) -> CompositeMetadata {
  let extent = 64.0;
  let cell = extent / side as f64;
  CompositeMetadata::new(
    (0..levels)
      .map(|level| {
        let shrink = 0.5f64.powi(level as i32);
        let mut blocks = Vec::with_capacity(side * side * side);
        for x in 0..side {
          for y in 0..side {
            for z in 0..side {
              let min = DVec3::new(x as f64, y as f64, -(z as f64) - 1.0) * cell;
              let max = min + DVec3::splat(cell * shrink);
              blocks.push(BlockMeta::new(BlockBounds::new(min, max)));
            }
          }
        }
        blocks
      })
      .collect(),
  )
}

fn camera(t: f64) -> ViewPlanes {
  let eye = DVec3::new(32.0 + 20.0 * t, 32.0, 40.0);
  let view = DMat4::look_at_rh(eye, DVec3::new(32.0, 32.0, -32.0), DVec3::Y);
  let proj = DMat4::perspective_rh_gl(60f64.to_radians(), 16.0 / 9.0, 0.1, 500.0);
  ViewPlanes::from_view_projection(&(proj * view))
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_coverage(c: &mut Criterion) {
  let meta = hierarchy(1, 16);
  let planes = camera(0.0);
  let bounds: Vec<BlockBounds> = meta.iter().map(|e| e.meta.bounds).collect();

  let mut group = c.benchmark_group("coverage");
  group.throughput(Throughput::Elements(bounds.len() as u64));
  group.bench_function("estimate_4096", |b| {
    b.iter(|| {
      let mut sum = 0.0;
      for block in &bounds {
        sum += coverage::estimate(black_box(&planes), block).coverage;
      }
      black_box(sum)
    })
  });
  group.finish();
}

fn bench_update_priorities(c: &mut Criterion) {
  let mut group = c.benchmark_group("update_priorities");
  for side in [8usize, 16, 24] {
    let meta = hierarchy(3, side);
    let planes = camera(0.5);
    group.throughput(Throughput::Elements(meta.num_blocks() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(meta.num_blocks()), &meta, |b, meta| {
      b.iter(|| {
        let mut heap = StreamingPriorityQueue::new();
        for entry in meta.iter() {
          heap.push(BlockItem::from(entry));
        }
        heap.update_priorities(&planes, &BlockBounds::INVALID);
        black_box(heap.len())
      })
    });
  }
  group.finish();
}

/// Full queue update per camera step, both policies.
fn bench_queue_update(c: &mut Criterion) {
  let meta = hierarchy(3, 16);
  let frames: Vec<ViewPlanes> = (0..16).map(|i| camera(i as f64 / 16.0)).collect();

  let mut group = c.benchmark_group("queue_update");
  group.throughput(Throughput::Elements(meta.num_blocks() as u64));

  group.bench_function("amr", |b| {
    let mut queue = AmrBlockQueue::new(
      ProcessTopology::SINGLE,
      DistributionMode::RoundRobin,
      SelectionConfig::DEFAULT,
    );
    let _ = queue.initialize(meta.clone());
    let mut frame = 0;
    b.iter(|| {
      frame = (frame + 1) % frames.len();
      black_box(queue.update(&frames[frame], &BlockBounds::INVALID))
    })
  });

  group.bench_function("particles", |b| {
    let mut queue = ParticleBlockQueue::new(
      ProcessTopology::SINGLE,
      DistributionMode::RoundRobin,
      SelectionConfig::DEFAULT,
    );
    let _ = queue.initialize(meta.clone());
    let mut frame = 0;
    b.iter(|| {
      frame = (frame + 1) % frames.len();
      black_box(queue.update(&frames[frame], &BlockBounds::INVALID))
    })
  });

  group.finish();
}

criterion_group!(benches, bench_coverage, bench_update_priorities, bench_queue_update);
criterion_main!(benches);
