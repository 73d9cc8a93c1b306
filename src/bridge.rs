//! Render bridge boundary.
//!
//! The engine's only obligation to a renderer is a dense set of per-frame
//! buffers: `N` positions (exposed flat as `N * 3` floats), `N` colors and `N`
//! sizes. GPU resources, shaders and draw calls live on the other side of
//! [`RenderBridge`].

use crate::visuals::{colorize, ColorMapping, Palette};
use glam::Vec3;

/// Fixed-length per-entity output buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffers {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    sizes: Vec<f32>,
}

impl FrameBuffers {
    /// Buffers for `count` particles, zeroed.
    pub fn new(count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; count],
            colors: vec![Vec3::ZERO; count],
            sizes: vec![0.0; count],
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Mutable positions, for the engine to write into.
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Colors (RGB, 0-1).
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Point sizes in model units.
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Positions as `[x0, y0, z0, x1, ...]`.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as `[r0, g0, b0, r1, ...]`.
    pub fn colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Position bytes, ready for a vertex/instance buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Copy `src` into the position buffer over the common length.
    pub fn copy_positions(&mut self, src: &[Vec3]) {
        let n = src.len().min(self.positions.len());
        self.positions[..n].copy_from_slice(&src[..n]);
    }

    /// Recompute colors and sizes from the current positions.
    pub fn recolor(&mut self, palette: &Palette, mapping: ColorMapping, base_size: f32) {
        colorize(
            &self.positions,
            palette,
            mapping,
            base_size,
            &mut self.colors,
            &mut self.sizes,
        );
    }
}

/// Consumer of frame buffers, implemented by the host renderer.
pub trait RenderBridge {
    /// Called once per frame per entity.
    fn submit(&mut self, entity: &str, frame: &FrameBuffers);
}

/// Launch parameters for an external firework simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireworkLaunch {
    /// Launch position.
    pub origin: Vec3,
    /// Height at which the rocket bursts.
    pub burst_height: f32,
    /// Burst color.
    pub color: Vec3,
    /// Number of burst particles.
    pub particle_count: u32,
}

/// External firework physics. The engine only launches and steps it.
pub trait FireworkSimulator {
    /// Fire a rocket.
    fn launch(&mut self, config: FireworkLaunch);
    /// Step the simulation.
    fn update(&mut self, dt: f32);
    /// Draw the current state.
    fn render(&mut self);
}
