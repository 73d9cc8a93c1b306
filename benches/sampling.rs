//! Benchmarks for the CPU-side hot paths: shape sampling, glyph sampling and
//! per-frame engine ticks.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use glyphmorph::prelude::*;
use glyphmorph::{sample_shape, CachePolicy, FnBackend, MorphConfig, RasterConfig, RasterError};
use image::{GrayImage, Luma};

fn block(text: &str, px: f32) -> Result<GrayImage, RasterError> {
    let size = px as u32;
    let mut bitmap = GrayImage::new(size, size);
    if !text.trim().is_empty() {
        for y in 10..size - 10 {
            for x in 25..size - 25 {
                bitmap.put_pixel(x, y, Luma([255]));
            }
        }
    }
    Ok(bitmap)
}

fn bench_sample_shape(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_shape");

    for kind in ShapeKind::ALL {
        for count in [1_000u32, 10_000] {
            group.bench_with_input(BenchmarkId::new(kind.name(), count), &count, |b, &count| {
                let spec = ShapeSpec::new(kind, count);
                b.iter(|| black_box(sample_shape(black_box(&spec))))
            });
        }
    }

    group.finish();
}

fn bench_glyphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("glyph");
    let config = RasterConfig {
        seed: Some(1),
        ..RasterConfig::default()
    };

    group.bench_function("rasterize_uncached_800", |b| {
        let backend = FnBackend::new("block", block);
        let mut rasterizer = GlyphRasterizer::with_config(backend, config.clone());
        b.iter(|| black_box(rasterizer.rasterize(black_box("8"), 800)))
    });

    group.bench_function("rasterize_cached_800", |b| {
        let backend = FnBackend::new("block", block);
        let mut rasterizer = GlyphRasterizer::with_config(backend, config.clone());
        let mut cache = PositionCache::new(CachePolicy::lru(64));
        b.iter(|| black_box(rasterizer.rasterize_cached(&mut cache, black_box("8"), 800)))
    });

    group.finish();
}

fn bench_morph(c: &mut Criterion) {
    let mut group = c.benchmark_group("morph");

    for count in [1_000usize, 10_000] {
        let tree = sample_shape(&ShapeSpec::new(ShapeKind::Tree, count as u32));
        let heart = sample_shape(&ShapeSpec::new(ShapeKind::Heart, count as u32));

        group.bench_with_input(BenchmarkId::new("transition", count), &count, |b, &count| {
            let mut morph = MorphController::new(count, &tree, MorphConfig::default());
            let mut flip = false;
            b.iter(|| {
                if morph.is_settled() {
                    flip = !flip;
                    morph.set_target(if flip { &heart } else { &tree });
                }
                black_box(morph.advance(0.016).len())
            })
        });

        group.bench_with_input(BenchmarkId::new("spread_apply", count), &count, |b, &count| {
            let mut blend = SpreadBlend::default();
            blend.set_target(true);
            blend.advance(0.1);
            let mut out = vec![Vec3::ZERO; count];
            b.iter(|| {
                blend.apply(black_box(&tree), black_box(&heart), &mut out);
                black_box(out[0])
            })
        });
    }

    group.finish();
}

fn bench_engine_tick(c: &mut Criterion) {
    let mut engine = Engine::new(EngineConfig::default(), FnBackend::new("block", block));
    let settings = Settings::default()
        .with_particle_count(5_000)
        .with_text("2025")
        .with_label("Happy New Year");
    let mut elapsed = 0.0;

    c.bench_function("engine_tick_5000", |b| {
        b.iter(|| {
            elapsed += 0.016;
            let frame = engine.tick(FrameTime::new(0.016, elapsed), &settings);
            black_box(frame.particle_count())
        })
    });
}

criterion_group!(benches, bench_sample_shape, bench_glyphs, bench_morph, bench_engine_tick);
criterion_main!(benches);
