//! Color and size for rendered particles.
//!
//! Positions are the engine's business; colors are a thin, replaceable layer
//! on top. A [`Palette`] is a five-stop gradient and a [`ColorMapping`] picks
//! where on the gradient each particle lands.
//!
//! ```ignore
//! let mapping = ColorMapping::default();
//! colorize(frame.positions(), &Palette::Festive, mapping, 0.05, &mut colors, &mut sizes);
//! ```

use crate::morph::is_sentinel;
use crate::shapes;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Five-stop color gradients.
///
/// Themes are normally injected by the host; the named variants are only
/// reasonable defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Deep red through gold to warm white.
    #[default]
    Festive,
    /// Trunk brown into needle greens.
    Evergreen,
    /// Night blue into pale frost.
    Frost,
    /// Host-provided stops.
    Custom([Vec3; 5]),
}

impl Palette {
    /// The five color stops.
    pub fn colors(&self) -> [Vec3; 5] {
        match self {
            Palette::Festive => [
                Vec3::new(0.35, 0.02, 0.05),
                Vec3::new(0.75, 0.08, 0.1),
                Vec3::new(0.95, 0.45, 0.1),
                Vec3::new(1.0, 0.8, 0.3),
                Vec3::new(1.0, 0.97, 0.85),
            ],
            Palette::Evergreen => [
                Vec3::new(0.25, 0.12, 0.04),
                Vec3::new(0.05, 0.3, 0.1),
                Vec3::new(0.1, 0.5, 0.2),
                Vec3::new(0.35, 0.75, 0.3),
                Vec3::new(1.0, 0.85, 0.4),
            ],
            Palette::Frost => [
                Vec3::new(0.02, 0.04, 0.2),
                Vec3::new(0.1, 0.2, 0.5),
                Vec3::new(0.3, 0.55, 0.85),
                Vec3::new(0.7, 0.85, 1.0),
                Vec3::new(0.95, 0.98, 1.0),
            ],
            Palette::Custom(stops) => *stops,
        }
    }

    /// Color at `t` in `[0, 1]`, linear between stops.
    pub fn sample(&self, t: f32) -> Vec3 {
        let stops = self.colors();
        let scaled = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
        let i = (scaled as usize).min(stops.len() - 2);
        stops[i].lerp(stops[i + 1], scaled - i as f32)
    }
}

/// How a particle picks its place on the palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ColorMapping {
    /// Particle index over buffer length (bands).
    Index,
    /// Height between `min` and `max`.
    PositionY {
        /// Maps to the palette start.
        min: f32,
        /// Maps to the palette end.
        max: f32,
    },
    /// Distance from the origin up to `max`.
    Distance {
        /// Maps to the palette end.
        max: f32,
    },
}

impl Default for ColorMapping {
    fn default() -> Self {
        ColorMapping::PositionY { min: -1.5, max: 1.5 }
    }
}

impl ColorMapping {
    /// Palette coordinate for particle `index` of `total` at `position`.
    pub fn coordinate(&self, index: usize, total: usize, position: Vec3) -> f32 {
        let t = match *self {
            ColorMapping::Index => index as f32 / total.max(1) as f32,
            ColorMapping::PositionY { min, max } => {
                let span = max - min;
                if span.abs() > f32::EPSILON {
                    (position.y - min) / span
                } else {
                    0.0
                }
            }
            ColorMapping::Distance { max } => {
                if max > 0.0 {
                    position.length() / max
                } else {
                    0.0
                }
            }
        };
        t.clamp(0.0, 1.0)
    }
}

/// Fill `colors` and `sizes` for `positions`.
///
/// Sizes vary ±30% around `base_size` per particle (deterministically by
/// index). Sentinel particles get black and size 0.
pub fn colorize(
    positions: &[Vec3],
    palette: &Palette,
    mapping: ColorMapping,
    base_size: f32,
    colors: &mut [Vec3],
    sizes: &mut [f32],
) {
    let total = positions.len();
    let outputs = colors.iter_mut().zip(sizes.iter_mut());
    for (i, (p, (c, s))) in positions.iter().zip(outputs).enumerate() {
        if is_sentinel(*p) {
            *c = Vec3::ZERO;
            *s = 0.0;
            continue;
        }
        *c = palette.sample(mapping.coordinate(i, total, *p));
        *s = base_size * (0.7 + 0.6 * shapes::hash(i as u32, 41.0));
    }
}
