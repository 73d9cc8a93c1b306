//! Glyph point clouds.
//!
//! Turns a character or string into particle positions:
//!
//! 1. A [`GlyphRasterizationBackend`] renders the text to a luminance bitmap.
//! 2. Pixels brighter than the threshold form the foreground set.
//! 3. The foreground bounding box is centered and scaled so its larger side
//!    spans `target_size` model units.
//! 4. Each output particle picks a foreground pixel uniformly (with
//!    replacement), maps it into model space with Y flipped, and gets a little
//!    jitter plus a shallow depth offset.
//!
//! Failures never propagate: a broken backend or a blank glyph (space,
//! unsupported character) yields the configured [`FallbackPolicy`] shape.
//!
//! ```ignore
//! let mut rasterizer = GlyphRasterizer::new(CosmicTextBackend::new());
//! let mut cache = PositionCache::new(CachePolicy::lru(256));
//! let digit = rasterizer.rasterize_cached(&mut cache, "3", 800);
//! assert_eq!(digit.len(), 800);
//! ```

mod backend;
#[cfg(feature = "text")]
mod cosmic;

pub use backend::{FnBackend, GlyphRasterizationBackend, UnavailableBackend};
#[cfg(feature = "text")]
pub use cosmic::CosmicTextBackend;

use crate::cache::{GlyphKey, PositionCache, SharedPositionCache};
use crate::error::ConfigError;
use glam::Vec3;
use image::GrayImage;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Canvases larger than this many pixels are sampled at double stride.
const LARGE_CANVAS_PIXELS: u32 = 512 * 512;

/// Number of columns in the [`FallbackPolicy::Stripes`] placeholder.
const STRIPE_COUNT: usize = 3;

/// What to return when a glyph cannot be turned into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Every particle at the origin (content is effectively invisible).
    #[default]
    Zero,
    /// Three vertical stripes, a visible "something should be here" marker.
    Stripes,
}

/// Rasterization tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Font size requested from the backend, in pixels.
    pub font_px: f32,
    /// Pixels with luminance strictly above this are foreground.
    pub luminance_threshold: u8,
    /// Pixel stride when scanning the bitmap. Doubled for large canvases.
    pub stride: u32,
    /// Model-space size of the foreground box's larger side.
    pub target_size: f32,
    /// Per-axis jitter amplitude in model units.
    pub jitter: f32,
    /// Total span of the random depth offset.
    pub depth_jitter: f32,
    /// Fewer foreground pixels than this means "blank glyph".
    pub min_pixels: usize,
    /// Shape returned for blank glyphs and backend failures.
    pub fallback: FallbackPolicy,
    /// Seed for pixel sampling. `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            font_px: 110.0,
            luminance_threshold: 100,
            stride: 1,
            target_size: 2.0,
            jitter: 0.04,
            depth_jitter: 0.15,
            min_pixels: 10,
            fallback: FallbackPolicy::Zero,
            seed: None,
        }
    }
}

impl RasterConfig {
    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.font_px.is_finite() && self.font_px > 0.0) {
            return Err(ConfigError::invalid("raster.font_px", "must be positive"));
        }
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(ConfigError::invalid("raster.target_size", "must be positive"));
        }
        if !(self.jitter.is_finite() && self.jitter >= 0.0) {
            return Err(ConfigError::invalid("raster.jitter", "must be >= 0"));
        }
        if !(self.depth_jitter.is_finite() && self.depth_jitter >= 0.0) {
            return Err(ConfigError::invalid("raster.depth_jitter", "must be >= 0"));
        }
        Ok(())
    }

    /// Stride actually used for a `width`×`height` bitmap.
    pub fn effective_stride(&self, width: u32, height: u32) -> u32 {
        let stride = self.stride.max(1);
        if width.saturating_mul(height) > LARGE_CANVAS_PIXELS {
            stride * 2
        } else {
            stride
        }
    }
}

/// Inclusive pixel-space bounding box of a foreground set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    /// Leftmost foreground column.
    pub min_x: u32,
    /// Topmost foreground row.
    pub min_y: u32,
    /// Rightmost foreground column.
    pub max_x: u32,
    /// Bottom foreground row.
    pub max_y: u32,
}

impl PixelBounds {
    /// Bounds of `pixels`, or `None` if empty.
    pub fn from_pixels(pixels: &[(u32, u32)]) -> Option<Self> {
        let (&(x0, y0), rest) = pixels.split_first()?;
        let mut bounds = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for &(x, y) in rest {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        Some(bounds)
    }

    /// Center in pixel coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) as f32 * 0.5,
            (self.min_y + self.max_y) as f32 * 0.5,
        )
    }

    /// Uniform pixel-to-model scale mapping the larger extent to `target_size`.
    pub fn scale_to(&self, target_size: f32) -> f32 {
        let extent_x = (self.max_x - self.min_x) as f32;
        let extent_y = (self.max_y - self.min_y) as f32;
        target_size / extent_x.max(extent_y).max(1.0)
    }
}

/// Coordinates of pixels brighter than `threshold`, scanning every `stride`-th
/// row and column.
pub fn foreground_pixels(bitmap: &GrayImage, threshold: u8, stride: u32) -> Vec<(u32, u32)> {
    let step = stride.max(1) as usize;
    let (width, height) = bitmap.dimensions();
    let mut pixels = Vec::new();
    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            if bitmap.get_pixel(x, y).0[0] > threshold {
                pixels.push((x, y));
            }
        }
    }
    pixels
}

/// Deterministic placeholder positions for glyphs that cannot be sampled.
pub fn fallback_positions(policy: FallbackPolicy, count: usize) -> Vec<Vec3> {
    match policy {
        FallbackPolicy::Zero => vec![Vec3::ZERO; count],
        FallbackPolicy::Stripes => {
            let rows = count.div_ceil(STRIPE_COUNT).max(1);
            (0..count)
                .map(|i| {
                    let column = (i % STRIPE_COUNT) as f32 - 1.0;
                    let row = (i / STRIPE_COUNT) as f32;
                    let y = if rows > 1 {
                        row / (rows - 1) as f32 - 0.5
                    } else {
                        0.0
                    };
                    Vec3::new(column * 0.4, y, 0.0)
                })
                .collect()
        }
    }
}

/// Samples particle positions from rasterized text.
pub struct GlyphRasterizer {
    backend: Box<dyn GlyphRasterizationBackend>,
    config: RasterConfig,
    rng: SmallRng,
}

impl GlyphRasterizer {
    /// Rasterizer with default configuration.
    pub fn new(backend: impl GlyphRasterizationBackend + 'static) -> Self {
        Self::with_config(backend, RasterConfig::default())
    }

    /// Rasterizer with explicit configuration.
    pub fn with_config(
        backend: impl GlyphRasterizationBackend + 'static,
        config: RasterConfig,
    ) -> Self {
        Self::from_boxed(Box::new(backend), config)
    }

    /// Rasterizer over an already boxed backend.
    pub fn from_boxed(backend: Box<dyn GlyphRasterizationBackend>, config: RasterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            backend,
            config,
            rng,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Name of the backend, for diagnostics.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Sample `count` positions for `text`.
    ///
    /// Always returns exactly `count` finite points. Sampling is re-randomized
    /// on every call; use [`rasterize_cached`](Self::rasterize_cached) for a
    /// stable result per `(text, count)`.
    pub fn rasterize(&mut self, text: &str, count: u32) -> Vec<Vec3> {
        let count = count as usize;
        if count == 0 {
            return Vec::new();
        }

        let bitmap = match self.backend.render(text, self.config.font_px) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                log::warn!(
                    "rasterizing {:?} failed, using {:?} fallback: {}",
                    text,
                    self.config.fallback,
                    err
                );
                return fallback_positions(self.config.fallback, count);
            }
        };

        let stride = self.config.effective_stride(bitmap.width(), bitmap.height());
        let pixels = foreground_pixels(&bitmap, self.config.luminance_threshold, stride);
        let bounds = match PixelBounds::from_pixels(&pixels) {
            Some(bounds) if pixels.len() >= self.config.min_pixels => bounds,
            _ => {
                log::debug!(
                    "{:?} has {} foreground pixels, using {:?} fallback",
                    text,
                    pixels.len(),
                    self.config.fallback
                );
                return fallback_positions(self.config.fallback, count);
            }
        };

        let scale = bounds.scale_to(self.config.target_size);
        let (cx, cy) = bounds.center();
        let jitter = self.config.jitter;
        let depth = self.config.depth_jitter;
        let rng = &mut self.rng;

        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let (px, py) = pixels[rng.gen_range(0..pixels.len())];
            points.push(Vec3::new(
                (px as f32 - cx) * scale + symmetric(rng, jitter),
                -(py as f32 - cy) * scale + symmetric(rng, jitter),
                (rng.gen::<f32>() - 0.5) * depth + symmetric(rng, jitter),
            ));
        }
        points
    }

    /// Like [`rasterize`](Self::rasterize), memoized in `cache` by
    /// `(text, count)`.
    pub fn rasterize_cached(
        &mut self,
        cache: &mut PositionCache,
        text: &str,
        count: u32,
    ) -> Arc<[Vec3]> {
        cache.get_or_compute(GlyphKey::new(text, count), || self.rasterize(text, count))
    }

    /// Like [`rasterize_cached`](Self::rasterize_cached) for a cache shared
    /// between threads. The lock is held while rasterizing on a miss.
    pub fn rasterize_shared(
        &mut self,
        cache: &SharedPositionCache,
        text: &str,
        count: u32,
    ) -> Arc<[Vec3]> {
        cache.get_or_compute(GlyphKey::new(text, count), || self.rasterize(text, count))
    }
}

fn symmetric(rng: &mut SmallRng, amplitude: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * 2.0 * amplitude
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::RasterError;
    use image::Luma;

    /// Draws a filled rectangle for non-whitespace text, nothing otherwise.
    pub(crate) fn block_backend(
    ) -> FnBackend<impl FnMut(&str, f32) -> Result<GrayImage, RasterError>> {
        FnBackend::new("block", |text: &str, px: f32| {
            let size = px as u32;
            let mut bitmap = GrayImage::new(size, size);
            if !text.trim().is_empty() {
                for y in 10..size - 10 {
                    for x in 30..size - 30 {
                        bitmap.put_pixel(x, y, Luma([255]));
                    }
                }
            }
            Ok(bitmap)
        })
    }

    /// Block-glyph rasterizer with a fixed seed.
    pub(crate) fn block_rasterizer() -> GlyphRasterizer {
        let config = RasterConfig {
            seed: Some(7),
            ..RasterConfig::default()
        };
        GlyphRasterizer::with_config(block_backend(), config)
    }

    /// Counts `warn!` records logged on the current thread.
    pub(crate) mod warnings {
        use std::cell::Cell;

        struct WarnCounter;

        thread_local! {
            static WARNINGS: Cell<usize> = const { Cell::new(0) };
        }

        impl log::Log for WarnCounter {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                metadata.level() <= log::Level::Warn
            }

            fn log(&self, record: &log::Record) {
                if record.level() == log::Level::Warn {
                    WARNINGS.with(|w| w.set(w.get() + 1));
                }
            }

            fn flush(&self) {}
        }

        static WARN_COUNTER: WarnCounter = WarnCounter;

        /// Install the counter (once per process) and zero this thread's count.
        pub(crate) fn reset() {
            let _ = log::set_logger(&WARN_COUNTER);
            log::set_max_level(log::LevelFilter::Warn);
            WARNINGS.with(|w| w.set(0));
        }

        pub(crate) fn count() -> usize {
            WARNINGS.with(|w| w.get())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::block_backend;
    use super::*;
    use crate::cache::CachePolicy;
    use image::Luma;

    fn seeded() -> RasterConfig {
        RasterConfig {
            seed: Some(7),
            ..RasterConfig::default()
        }
    }

    #[test]
    fn test_rasterize_count_and_bounds() {
        let mut rasterizer = GlyphRasterizer::with_config(block_backend(), seeded());
        let points = rasterizer.rasterize("A", 500);
        assert_eq!(points.len(), 500);

        let half = rasterizer.config().target_size / 2.0;
        let slack = rasterizer.config().jitter + rasterizer.config().depth_jitter;
        for p in &points {
            assert!(p.is_finite());
            assert!(p.x.abs() <= half + slack);
            assert!(p.y.abs() <= half + slack);
        }
    }

    #[test]
    fn test_rasterize_zero_count() {
        let mut rasterizer = GlyphRasterizer::new(block_backend());
        assert!(rasterizer.rasterize("A", 0).is_empty());
    }

    #[test]
    fn test_blank_glyph_uses_zero_fallback() {
        let mut rasterizer = GlyphRasterizer::with_config(block_backend(), seeded());
        let points = rasterizer.rasterize(" ", 300);
        assert_eq!(points.len(), 300);
        assert!(points.iter().all(|p| p.length() < 1e-6));
    }

    #[test]
    fn test_blank_glyph_uses_stripes_fallback() {
        let config = RasterConfig {
            fallback: FallbackPolicy::Stripes,
            ..seeded()
        };
        let mut rasterizer = GlyphRasterizer::with_config(block_backend(), config);
        let points = rasterizer.rasterize(" ", 30);
        assert_eq!(points, fallback_positions(FallbackPolicy::Stripes, 30));

        let mut columns: Vec<i32> = points.iter().map(|p| (p.x * 10.0).round() as i32).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns, vec![-4, 0, 4]);
    }

    #[test]
    fn test_unavailable_backend_falls_back() {
        let mut rasterizer = GlyphRasterizer::new(UnavailableBackend);
        let points = rasterizer.rasterize("A", 64);
        assert_eq!(points, vec![Vec3::ZERO; 64]);
    }

    #[test]
    fn test_y_axis_is_flipped() {
        // Foreground only in the top rows of the bitmap.
        let backend = FnBackend::new("top", |_: &str, _: f32| {
            let mut bitmap = GrayImage::new(100, 100);
            for x in 0..100 {
                for y in 0..20 {
                    bitmap.put_pixel(x, y, Luma([255]));
                }
                bitmap.put_pixel(x, 99, Luma([255]));
            }
            Ok(bitmap)
        });
        let config = RasterConfig {
            jitter: 0.0,
            depth_jitter: 0.0,
            ..seeded()
        };
        let mut rasterizer = GlyphRasterizer::with_config(backend, config);
        let points = rasterizer.rasterize("-", 400);
        let above = points.iter().filter(|p| p.y > 0.0).count();
        assert!(above > points.len() / 2);
    }

    #[test]
    fn test_seeded_rasterizers_agree() {
        let mut a = GlyphRasterizer::with_config(block_backend(), seeded());
        let mut b = GlyphRasterizer::with_config(block_backend(), seeded());
        assert_eq!(a.rasterize("7", 100), b.rasterize("7", 100));
    }

    #[test]
    fn test_rasterize_cached_reuses_result() {
        let mut rasterizer = GlyphRasterizer::with_config(block_backend(), seeded());
        let mut cache = PositionCache::new(CachePolicy::Unbounded);
        let first = rasterizer.rasterize_cached(&mut cache, "A", 500);
        let second = rasterizer.rasterize_cached(&mut cache, "A", 500);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_foreground_and_bounds() {
        let mut bitmap = GrayImage::new(8, 8);
        bitmap.put_pixel(2, 3, Luma([101]));
        bitmap.put_pixel(6, 5, Luma([255]));
        bitmap.put_pixel(4, 4, Luma([100]));
        let pixels = foreground_pixels(&bitmap, 100, 1);
        assert_eq!(pixels, vec![(2, 3), (6, 5)]);

        let bounds = PixelBounds::from_pixels(&pixels).unwrap();
        assert_eq!(bounds.center(), (4.0, 4.0));
        assert!((bounds.scale_to(2.0) - 0.5).abs() < 1e-6);
        assert!(PixelBounds::from_pixels(&[]).is_none());
    }

    #[test]
    fn test_large_canvas_doubles_stride() {
        let config = RasterConfig::default();
        assert_eq!(config.effective_stride(200, 200), 1);
        assert_eq!(config.effective_stride(2000, 200), 2);
    }
}
