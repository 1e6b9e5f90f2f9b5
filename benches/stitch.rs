//! Stitching benchmark suite.
//!
//! Benchmarks compositing and PNG encoding at different page lengths:
//! - Frame counts: 4, 16, 32
//! - Frame size: 1280x800 (a typical laptop viewport)
//!
//! Run with: cargo bench --bench stitch
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use fullpage_capture::Compositor;
use fullpage_capture::compositor::encode_png;
use fullpage_capture::orchestrator::CapturedFrame;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const FRAME_COUNTS: &[u32] = &[4, 16, 32];
const FRAME_WIDTH: u32 = 1280;
const FRAME_HEIGHT: u32 = 800;
const OVERLAP_PX: u32 = 10;

// ============================================================================
// Fixtures
// ============================================================================

fn frames(count: u32) -> Vec<CapturedFrame> {
    (0..count)
        .map(|index| {
            let image = RgbaImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, (index % 256) as u8, 255])
            });
            CapturedFrame::new(index, image, index * (FRAME_HEIGHT - 80))
        })
        .collect()
}

// ============================================================================
// Benchmark: Stitch
// ============================================================================

fn bench_stitch(c: &mut Criterion) {
    let compositor = Compositor::new(OVERLAP_PX, "bench");

    let mut group = c.benchmark_group("stitch");
    group.sample_size(20);

    for &count in FRAME_COUNTS {
        let frames = frames(count);
        group.bench_with_input(BenchmarkId::new("frames", count), &frames, |b, frames| {
            b.iter(|| {
                compositor
                    .stitch(black_box(frames.iter()))
                    .expect("stitch")
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Encode
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let compositor = Compositor::new(OVERLAP_PX, "bench");

    let mut group = c.benchmark_group("encode_png");
    group.sample_size(10);

    for &count in FRAME_COUNTS {
        let stitched = compositor.stitch(frames(count).iter()).expect("stitch");
        group.bench_with_input(
            BenchmarkId::new("frames", count),
            &stitched,
            |b, stitched| {
                b.iter(|| encode_png(black_box(stitched)).expect("encode"));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_stitch, bench_encode);
criterion_main!(benches);
