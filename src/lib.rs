//! # glyphmorph - procedural particle shapes and glyph clouds
//!
//! Drives animated point-cloud visuals: countdown digits, greeting text,
//! free-form labels and formation shapes (tree, cake, firework, heart,
//! sphere). The crate produces positions, colors and sizes; drawing them is
//! the host renderer's job.
//!
//! ## Quick Start
//!
//! ```ignore
//! use glyphmorph::prelude::*;
//!
//! let mut engine = Engine::new(EngineConfig::default(), CosmicTextBackend::new());
//! let mut time = Time::new();
//! let settings = Settings::default()
//!     .with_shape(ShapeKind::Heart)
//!     .with_text("10");
//!
//! loop {
//!     let frame = engine.tick(time.update(), &settings);
//!     upload(frame.formation.positions_flat());
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Sampling
//!
//! [`shapes::sample`] is a pure function of `(index, total, kind, params)`.
//! The same inputs give bit-identical points on every call, so formations
//! never need to be stored.
//!
//! ### Glyphs
//!
//! A [`GlyphRasterizer`] asks an injected [`GlyphRasterizationBackend`] for a
//! luminance bitmap and samples particles from its bright pixels. Results are
//! memoized per `(text, count)` in a caller-owned [`PositionCache`].
//!
//! ### Morphing
//!
//! Every entity owns a [`MorphController`] over a fixed-capacity buffer. A new
//! target starts an ease-out-cubic transition from wherever the particles are;
//! a target that arrives mid-transition supersedes the old one. The formation
//! additionally blends toward a scattered shell through [`SpreadBlend`].
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`shapes`] | deterministic shape sampler, [`ShapeKind`] |
//! | [`glyph`] | rasterizer, backends, fallbacks |
//! | [`cache`] | [`PositionCache`], [`SharedPositionCache`] |
//! | [`morph`] | [`MorphController`], [`SpreadBlend`], easing |
//! | [`slots`] | [`SlotArena`] per-character text |
//! | [`visuals`] | [`Palette`], [`ColorMapping`], colorizer |
//! | [`bridge`] | [`FrameBuffers`], [`RenderBridge`], [`FireworkSimulator`] |
//! | [`engine`] | [`Engine`], [`Frame`] |
//! | [`config`] | [`EngineConfig`], [`Settings`] (TOML) |
//! | [`time`] | [`Time`], [`FrameTime`] |

pub mod bridge;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod glyph;
pub mod morph;
pub mod shapes;
pub mod slots;
pub mod time;
pub mod visuals;

pub use bridge::{FireworkLaunch, FireworkSimulator, FrameBuffers, RenderBridge};
pub use cache::{CachePolicy, CacheStats, GlyphKey, PositionCache, SharedPositionCache};
pub use config::{EngineConfig, RenderConfig, Settings};
pub use engine::{Engine, Frame};
pub use error::{ConfigError, RasterError};
#[cfg(feature = "text")]
pub use glyph::CosmicTextBackend;
pub use glyph::{
    FallbackPolicy, FnBackend, GlyphRasterizationBackend, GlyphRasterizer, RasterConfig,
    UnavailableBackend,
};
pub use glam::Vec3;
pub use morph::{
    MorphConfig, MorphController, MorphPhase, SpreadBlend, SpreadConfig, SENTINEL, SENTINEL_X,
};
pub use shapes::{sample, sample_shape, ShapeKind, ShapeParams, ShapeSpec};
pub use slots::{SlotArena, SlotConfig};
pub use time::{FrameTime, Time};
pub use visuals::{ColorMapping, Palette};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use glyphmorph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bridge::{FrameBuffers, RenderBridge};
    pub use crate::cache::{CachePolicy, PositionCache};
    pub use crate::config::{EngineConfig, Settings};
    pub use crate::engine::{Engine, Frame};
    #[cfg(feature = "text")]
    pub use crate::glyph::CosmicTextBackend;
    pub use crate::glyph::{GlyphRasterizationBackend, GlyphRasterizer, UnavailableBackend};
    pub use crate::morph::{MorphController, SpreadBlend};
    pub use crate::shapes::{ShapeKind, ShapeSpec};
    pub use crate::slots::SlotArena;
    pub use crate::time::{FrameTime, Time};
    pub use crate::visuals::{ColorMapping, Palette};
    pub use crate::Vec3;
}
