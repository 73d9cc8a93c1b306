//! Deterministic procedural shape sampling.
//!
//! Every formation (tree, firework, heart, cake, sphere) is a pure function of
//! the particle index: the same `(index, total, kind, params)` always produces
//! the same point, bit for bit. Per-particle "randomness" comes from a numeric
//! hash of the index rather than from an RNG, so no per-particle state needs to
//! be stored and buffers can be regenerated at any time.
//!
//! ```ignore
//! use glyphmorph::shapes::{sample_shape, ShapeKind, ShapeSpec};
//!
//! let heart = sample_shape(&ShapeSpec::new(ShapeKind::Heart, 2_000));
//! assert_eq!(heart.len(), 2_000);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Golden angle in radians, `PI * (3 - sqrt(5))`.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Procedural target formations.
///
/// Unknown names parse to [`ShapeKind::Sphere`] with a logged warning, never
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeKind {
    /// Tapered cone with a golden-angle spiral.
    Tree,
    /// Dense core plus five concentric rings.
    Firework,
    /// Parametric heart curve.
    Heart,
    /// Three stacked tiers and a candle.
    Cake,
    /// Uniform ball. The fallback for anything unrecognized.
    #[default]
    Sphere,
}

impl ShapeKind {
    /// All kinds, in declaration order.
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Tree,
        ShapeKind::Firework,
        ShapeKind::Heart,
        ShapeKind::Cake,
        ShapeKind::Sphere,
    ];

    /// Parse a shape name, falling back to [`ShapeKind::Sphere`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tree" => ShapeKind::Tree,
            "firework" | "fireworks" => ShapeKind::Firework,
            "heart" => ShapeKind::Heart,
            "cake" => ShapeKind::Cake,
            "sphere" | "default" => ShapeKind::Sphere,
            other => {
                log::warn!("unknown shape kind `{}`, falling back to sphere", other);
                ShapeKind::Sphere
            }
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Tree => "tree",
            ShapeKind::Firework => "firework",
            ShapeKind::Heart => "heart",
            ShapeKind::Cake => "cake",
            ShapeKind::Sphere => "sphere",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ShapeKind::parse(s))
    }
}

impl From<String> for ShapeKind {
    fn from(s: String) -> Self {
        ShapeKind::parse(&s)
    }
}

impl From<ShapeKind> for String {
    fn from(kind: ShapeKind) -> Self {
        kind.name().to_string()
    }
}

/// Parameters shared by every shape kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Uniform scale applied to the unit-sized formation.
    pub scale: f32,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// A complete request for one formation buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    /// Which formation to build.
    pub kind: ShapeKind,
    /// Number of particles in the buffer.
    pub total_count: u32,
    /// Uniform scale.
    pub scale: f32,
}

impl ShapeSpec {
    /// A spec at unit scale.
    pub fn new(kind: ShapeKind, total_count: u32) -> Self {
        Self {
            kind,
            total_count,
            scale: 1.0,
        }
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Sampling parameters derived from this spec.
    pub fn params(&self) -> ShapeParams {
        ShapeParams { scale: self.scale }
    }
}

/// Pseudo-random value in `[0, 1)` derived only from `index` and `salt`.
///
/// `frac(sin(index * a + (index + salt) * b) * c)`, evaluated in `f64` so large
/// indices keep their spread.
#[inline]
pub fn hash(index: u32, salt: f32) -> f32 {
    let n = index as f64;
    let v = (n * 12.9898 + (n + salt as f64) * 78.233).sin() * 43_758.545_3;
    (v - v.floor()).min(0.999_999) as f32
}

/// Per-particle sampling helpers built on [`hash`].
///
/// Mirrors a spawn context: it knows which particle it is and how many there
/// are, and hands out deterministic values keyed by a salt.
#[derive(Debug, Clone, Copy)]
pub struct SampleContext {
    /// Index of the particle being placed.
    pub index: u32,
    /// Total number of particles in the buffer (at least 1).
    pub total: u32,
}

impl SampleContext {
    /// Context for particle `index` of `total`.
    pub fn new(index: u32, total: u32) -> Self {
        Self {
            index,
            total: total.max(1),
        }
    }

    /// Normalized position in the buffer, `index / total`.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.index as f32 / self.total as f32
    }

    /// Hash value in `[0, 1)` for this particle.
    #[inline]
    pub fn hash(&self, salt: f32) -> f32 {
        hash(self.index, salt)
    }

    /// Symmetric jitter in `[-amplitude, amplitude)`.
    #[inline]
    pub fn jitter(&self, salt: f32, amplitude: f32) -> f32 {
        (self.hash(salt) - 0.5) * 2.0 * amplitude
    }

    /// Angle of this index on a golden-angle spiral, wrapped to `[0, TAU)`.
    #[inline]
    pub fn golden_angle(&self) -> f32 {
        (self.index as f64 * GOLDEN_ANGLE as f64).rem_euclid(TAU as f64) as f32
    }

    /// Point on a sphere surface of the given radius.
    pub fn on_sphere(&self, salt: f32, radius: f32) -> Vec3 {
        let z = self.hash(salt) * 2.0 - 1.0;
        let phi = self.hash(salt + 1.0) * TAU;
        let ring = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(ring * phi.cos(), z, ring * phi.sin()) * radius
    }

    /// Point inside a ball of the given radius, uniform by volume.
    pub fn in_sphere(&self, salt: f32, radius: f32) -> Vec3 {
        let r = radius * self.hash(salt + 2.0).cbrt();
        self.on_sphere(salt, r)
    }
}

/// Sample one point of a formation.
///
/// Pure: identical arguments return bit-identical output. Callers with
/// `total == 0` should not sample at all; the buffer is simply empty.
pub fn sample(index: u32, total: u32, kind: ShapeKind, params: &ShapeParams) -> Vec3 {
    let ctx = SampleContext::new(index, total);
    let point = match kind {
        ShapeKind::Tree => tree(&ctx),
        ShapeKind::Firework => firework(&ctx),
        ShapeKind::Heart => heart(&ctx),
        ShapeKind::Cake => cake(&ctx),
        ShapeKind::Sphere => sphere(&ctx),
    };
    let scale = if params.scale.is_finite() {
        params.scale
    } else {
        1.0
    };
    point * scale
}

/// Sample a whole formation buffer.
pub fn sample_shape(spec: &ShapeSpec) -> Vec<Vec3> {
    let params = spec.params();
    (0..spec.total_count)
        .map(|i| sample(i, spec.total_count, spec.kind, &params))
        .collect()
}

/// Fill `out` with a formation of `out.len()` particles.
pub fn sample_into(kind: ShapeKind, params: &ShapeParams, out: &mut [Vec3]) {
    let total = out.len() as u32;
    for (i, p) in out.iter_mut().enumerate() {
        *p = sample(i as u32, total, kind, params);
    }
}

/// Deterministic "spread out" position for particle `index`.
///
/// A thick spherical shell, used as the far end of the formed/spread blend.
pub fn scatter(index: u32, total: u32, radius: f32) -> Vec3 {
    let ctx = SampleContext::new(index, total);
    let r = radius * (0.6 + 0.4 * ctx.hash(13.0));
    ctx.on_sphere(11.0, r)
}

fn tree(ctx: &SampleContext) -> Vec3 {
    const HEIGHT: f32 = 3.0;
    const BASE_RADIUS: f32 = 1.2;
    const TIP_RADIUS: f32 = 0.08;

    let h = ((ctx.index as f32 + 0.5) / ctx.total as f32).min(1.0);
    let radius = (BASE_RADIUS * (1.0 - h) + TIP_RADIUS) * (1.0 + ctx.jitter(1.0, 0.12));
    let angle = ctx.golden_angle() + ctx.jitter(2.0, 0.2);
    let y = (h - 0.5) * HEIGHT + ctx.jitter(3.0, 0.05);
    Vec3::new(radius * angle.cos(), y, radius * angle.sin())
}

fn firework(ctx: &SampleContext) -> Vec3 {
    const CORE_FRACTION: f32 = 0.3;
    const CORE_RADIUS: f32 = 0.6;
    const RING_COUNT: u32 = 5;
    const RING_BASE: f32 = 0.8;
    const RING_STEP: f32 = 0.3;
    const BAND: f32 = 0.06;

    if ctx.hash(1.0) < CORE_FRACTION {
        // sqrt biases toward the center
        let r = ctx.hash(2.0).sqrt() * CORE_RADIUS;
        return ctx.on_sphere(3.0, r);
    }

    let ring = ((ctx.hash(4.0) * RING_COUNT as f32) as u32).min(RING_COUNT - 1);
    let radius = RING_BASE + ring as f32 * RING_STEP + ctx.jitter(7.0, 0.02);
    let angle = ctx.hash(5.0) * TAU;
    Vec3::new(
        radius * angle.cos(),
        ctx.jitter(6.0, BAND),
        radius * angle.sin(),
    )
}

fn heart(ctx: &SampleContext) -> Vec3 {
    const CURVE_SCALE: f32 = 0.05;
    const Y_OFFSET: f32 = 0.1;

    let t = ctx.progress() * TAU;
    let s = t.sin();
    let x = 16.0 * s * s * s;
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    let radial = 1.0 + ctx.jitter(1.0, 0.06);
    Vec3::new(
        x * CURVE_SCALE * radial,
        y * CURVE_SCALE * radial + Y_OFFSET,
        ctx.jitter(2.0, 0.15),
    )
}

fn cake(ctx: &SampleContext) -> Vec3 {
    // (radius, y_min, y_max) for base, middle, top, candle
    let band = ctx.hash(1.0);
    let (radius, y_min, y_max) = if band < 0.45 {
        (1.0, -0.9, -0.3)
    } else if band < 0.75 {
        (0.75, -0.3, 0.2)
    } else if band < 0.92 {
        (0.5, 0.2, 0.6)
    } else {
        (0.06, 0.6, 0.95)
    };

    let angle = ctx.hash(2.0) * TAU;
    let r = radius * (0.85 + 0.15 * ctx.hash(3.0));
    let y = y_min + (y_max - y_min) * ctx.hash(4.0);
    Vec3::new(r * angle.cos(), y, r * angle.sin())
}

fn sphere(ctx: &SampleContext) -> Vec3 {
    ctx.in_sphere(1.0, 1.5)
}
