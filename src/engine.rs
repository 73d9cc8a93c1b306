//! The frame-driven engine.
//!
//! [`Engine`] owns three entities and the glyph cache:
//!
//! | Entity | Source | Capacity |
//! |--------|--------|----------|
//! | formation | [`shapes::sample_shape`] + [`SpreadBlend`] | `Settings::particle_count` |
//! | text | [`SlotArena`] | `max_slots * particles_per_slot` |
//! | label | [`GlyphRasterizer::rasterize_cached`] | `EngineConfig::label_particles` |
//!
//! Each [`Engine::tick`] takes the host's [`FrameTime`] and a read-only
//! [`Settings`] snapshot, reacts to whatever changed since the previous
//! snapshot, advances every controller and returns borrowed frame buffers.
//! Nothing in here fails; problems turn into fallbacks and log lines.
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default(), CosmicTextBackend::new());
//! let settings = Settings::default().with_text("10");
//!
//! // each frame
//! let frame = engine.tick(time.update(), &settings);
//! frame.submit(&mut renderer);
//! ```

use crate::bridge::{FireworkLaunch, FireworkSimulator, FrameBuffers, RenderBridge};
use crate::cache::{CachePolicy, CacheStats, PositionCache};
use crate::config::{EngineConfig, Settings};
use crate::glyph::{GlyphRasterizationBackend, GlyphRasterizer};
use crate::morph::{MorphConfig, MorphController, SpreadBlend};
use crate::shapes::{self, ShapeKind, ShapeSpec};
use crate::slots::SlotArena;
use crate::time::FrameTime;
use crate::visuals::{ColorMapping, Palette};
use glam::Vec3;

/// Palette coordinate for glyph entities, which live roughly in [-1, 1].
const GLYPH_MAPPING: ColorMapping = ColorMapping::PositionY { min: -1.2, max: 1.2 };

/// Seed offset separating the label controller from the formation.
const LABEL_SEED_SALT: u64 = 0x1abe1;

/// Borrowed output of one tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Timing this frame was produced with.
    pub time: FrameTime,
    /// Shape formation.
    pub formation: &'a FrameBuffers,
    /// Per-character slot text.
    pub text: &'a FrameBuffers,
    /// Free-form label.
    pub label: &'a FrameBuffers,
}

impl Frame<'_> {
    /// Hand every entity to a renderer.
    pub fn submit(&self, bridge: &mut impl RenderBridge) {
        bridge.submit("formation", self.formation);
        bridge.submit("text", self.text);
        bridge.submit("label", self.label);
    }

    /// Total particles across entities, sentinels included.
    pub fn particle_count(&self) -> usize {
        self.formation.len() + self.text.len() + self.label.len()
    }
}

/// Shape formation with its spread blend.
struct Formation {
    kind: ShapeKind,
    scale: f32,
    morph: MorphController,
    spread: SpreadBlend,
    scatter: Vec<Vec3>,
    buffers: FrameBuffers,
}

impl Formation {
    fn empty(spread: SpreadBlend, morph: MorphConfig) -> Self {
        Self {
            kind: ShapeKind::default(),
            scale: 1.0,
            morph: MorphController::hidden(0, morph),
            spread,
            scatter: Vec::new(),
            buffers: FrameBuffers::new(0),
        }
    }

    /// Build a formation of `count` particles that condenses from its
    /// scattered positions into `kind`.
    fn mount(
        count: u32,
        kind: ShapeKind,
        scale: f32,
        spread: SpreadBlend,
        config: &EngineConfig,
    ) -> Self {
        let radius = config.spread.radius;
        let scatter: Vec<Vec3> = (0..count).map(|i| shapes::scatter(i, count, radius)).collect();
        let mut morph = MorphController::new(count as usize, &scatter, config.morph.clone());
        morph.set_target(&shapes::sample_shape(&ShapeSpec::new(kind, count).with_scale(scale)));
        Self {
            kind,
            scale,
            morph,
            spread,
            scatter,
            buffers: FrameBuffers::new(count as usize),
        }
    }

    fn capacity(&self) -> usize {
        self.morph.capacity()
    }

    fn retarget(&mut self, kind: ShapeKind, scale: f32) {
        let spec = ShapeSpec::new(kind, self.capacity() as u32).with_scale(scale);
        self.morph.set_target(&shapes::sample_shape(&spec));
        self.kind = kind;
        self.scale = scale;
    }

    fn advance(&mut self, time: FrameTime) {
        self.morph.advance_at(time.dt, time.elapsed);
        self.spread.advance(time.dt);
        self.spread
            .apply(self.morph.live(), &self.scatter, self.buffers.positions_mut());
    }
}

/// Free-form label: one point cloud for the whole string.
struct Label {
    content: Option<String>,
    morph: MorphController,
    buffers: FrameBuffers,
}

impl Label {
    fn new(count: u32, morph: MorphConfig) -> Self {
        let mut buffers = FrameBuffers::new(count as usize);
        let morph = MorphController::hidden(count as usize, morph);
        buffers.copy_positions(morph.live());
        Self {
            content: None,
            morph,
            buffers,
        }
    }

    fn show(&mut self, text: &str, rasterizer: &mut GlyphRasterizer, cache: &mut PositionCache) {
        if self.content.as_deref() == Some(text) {
            return;
        }
        let count = self.morph.capacity() as u32;
        let target = rasterizer.rasterize_cached(cache, text, count);
        if self.content.is_none() {
            // bloom out of the center instead of sweeping in from the sentinel
            self.morph.snap_to(&vec![Vec3::ZERO; count as usize]);
        }
        self.morph.set_target(&target);
        self.content = Some(text.to_string());
        log::debug!("label now shows {:?}", text);
    }

    fn hide(&mut self) {
        if self.content.take().is_some() {
            self.morph.snap_to(&[]);
            log::debug!("label hidden");
        }
    }

    fn advance(&mut self, time: FrameTime) {
        let live = self.morph.advance_at(time.dt, time.elapsed);
        self.buffers.copy_positions(live);
    }
}

/// Owns every entity and advances them once per frame.
pub struct Engine {
    config: EngineConfig,
    rasterizer: GlyphRasterizer,
    cache: PositionCache,
    formation: Formation,
    slots: SlotArena,
    text_buffers: FrameBuffers,
    label: Label,
    theme: Palette,
    fireworks: Option<Box<dyn FireworkSimulator>>,
    ticks: u64,
}

impl Engine {
    /// Engine with glyphs rendered by `backend`.
    ///
    /// Entities are mounted lazily from the first [`Settings`] passed to
    /// [`tick`](Self::tick).
    pub fn new(config: EngineConfig, backend: impl GlyphRasterizationBackend + 'static) -> Self {
        Self::from_boxed(config, Box::new(backend))
    }

    /// Engine with an already boxed backend.
    pub fn from_boxed(config: EngineConfig, backend: Box<dyn GlyphRasterizationBackend>) -> Self {
        let rasterizer = GlyphRasterizer::from_boxed(backend, config.raster.clone());
        let cache = PositionCache::new(CachePolicy::lru(config.cache_capacity));
        let slots = SlotArena::new(&config.slots, &config.morph);
        let text_buffers = FrameBuffers::new(slots.particle_count());
        let label_morph = config
            .morph
            .clone()
            .with_seed(config.morph.seed ^ LABEL_SEED_SALT);
        let label = Label::new(config.label_particles, label_morph);
        let formation = Formation::empty(
            SpreadBlend::from_config(&config.spread),
            config.morph.clone(),
        );

        log::debug!(
            "engine created: backend={}, {} slots x {} particles, label {} particles",
            rasterizer.backend_name(),
            slots.max_slots(),
            slots.particles_per_slot(),
            config.label_particles
        );

        Self {
            config,
            rasterizer,
            cache,
            formation,
            slots,
            text_buffers,
            label,
            theme: Palette::default(),
            fireworks: None,
            ticks: 0,
        }
    }

    /// Attach an external firework simulator, stepped on every tick.
    pub fn with_fireworks(mut self, simulator: impl FireworkSimulator + 'static) -> Self {
        self.fireworks = Some(Box::new(simulator));
        self
    }

    /// Launch a rocket on the attached simulator. Returns `false` if none is
    /// attached.
    pub fn launch_firework(&mut self, launch: FireworkLaunch) -> bool {
        match self.fireworks.as_mut() {
            Some(sim) => {
                sim.launch(launch);
                true
            }
            None => false,
        }
    }

    /// Ask the attached simulator to draw itself.
    pub fn render_fireworks(&mut self) {
        if let Some(sim) = self.fireworks.as_mut() {
            sim.render();
        }
    }

    /// Advance one frame.
    pub fn tick(&mut self, time: FrameTime, settings: &Settings) -> Frame<'_> {
        self.apply_settings(settings);

        self.formation.advance(time);
        self.formation
            .buffers
            .recolor(&self.theme, self.config.render.mapping, self.config.render.point_size);

        self.slots.advance_at(time.dt, time.elapsed);
        self.slots.write_positions(self.text_buffers.positions_mut());
        self.text_buffers
            .recolor(&self.theme, GLYPH_MAPPING, self.config.render.point_size);

        self.label.advance(time);
        self.label
            .buffers
            .recolor(&self.theme, GLYPH_MAPPING, self.config.render.point_size);

        if let Some(sim) = self.fireworks.as_mut() {
            sim.update(time.dt);
        }

        self.ticks += 1;
        Frame {
            time,
            formation: &self.formation.buffers,
            text: &self.text_buffers,
            label: &self.label.buffers,
        }
    }

    fn apply_settings(&mut self, settings: &Settings) {
        let count = settings.particle_count;
        if count as usize != self.formation.capacity() || self.ticks == 0 {
            log::debug!(
                "mounting {} formation with {} particles",
                settings.shape,
                count
            );
            let spread = self.formation.spread.clone();
            self.formation = Formation::mount(
                count,
                settings.shape,
                settings.scale,
                spread,
                &self.config,
            );
        } else if settings.shape != self.formation.kind || settings.scale != self.formation.scale {
            log::debug!("formation {} -> {}", self.formation.kind, settings.shape);
            self.formation.retarget(settings.shape, settings.scale);
        }
        self.formation.spread.set_target(!settings.formed);

        self.slots
            .set_text(&settings.text, &mut self.rasterizer, &mut self.cache);

        match settings.label.as_deref() {
            Some(label) => self.label.show(label, &mut self.rasterizer, &mut self.cache),
            None => self.label.hide(),
        }

        self.theme = settings.theme;
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Glyph cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of cached glyph arrays.
    pub fn cached_glyphs(&self) -> usize {
        self.cache.len()
    }

    /// Formed (0) to spread (1) blend progress.
    pub fn spread_progress(&self) -> f32 {
        self.formation.spread.progress()
    }

    /// The formation's morph controller.
    pub fn formation(&self) -> &MorphController {
        &self.formation.morph
    }

    /// Shape the formation is heading to.
    pub fn formation_kind(&self) -> ShapeKind {
        self.formation.kind
    }

    /// The slot arena.
    pub fn slots(&self) -> &SlotArena {
        &self.slots
    }

    /// The label's morph controller.
    pub fn label(&self) -> &MorphController {
        &self.label.morph
    }

    /// Ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
