//! Fixed per-character slot arena.
//!
//! Text such as countdown digits or a short greeting is laid out one character
//! per slot. The arena allocates `max_slots` slots up front, each with its own
//! [`MorphController`]; slots are never added or removed. Unused slots are
//! parked at [`SENTINEL_X`], so the output buffer has the same length for the
//! arena's whole life.
//!
//! Content is centered: `n` characters start at slot `(max_slots - n) / 2`.
//! When the character count changes, slots that keep their character ease to
//! their new offset at the morph rate instead of jumping.

use crate::cache::PositionCache;
use crate::glyph::GlyphRasterizer;
use crate::morph::{
    clamp_dt, ease_out_cubic, MorphConfig, MorphController, SENTINEL, SENTINEL_X,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Arena layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Number of pre-allocated slots.
    pub max_slots: usize,
    /// Particles per slot.
    pub particles_per_slot: u32,
    /// Horizontal distance between neighbouring characters, in model units.
    pub spacing: f32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            max_slots: 12,
            particles_per_slot: 600,
            spacing: 1.6,
        }
    }
}

/// Index of the first occupied slot when `len` characters are centered in
/// `max_slots` slots.
pub fn centered_start(max_slots: usize, len: usize) -> usize {
    max_slots.saturating_sub(len) / 2
}

/// One character position.
pub struct Slot {
    content: Option<char>,
    x_offset: f32,
    x_from: f32,
    x_target: f32,
    x_progress: f32,
    morph: MorphController,
}

impl Slot {
    /// Character shown, or `None` when unused.
    pub fn content(&self) -> Option<char> {
        self.content
    }

    /// Current horizontal offset; [`SENTINEL_X`] when unused.
    pub fn x_offset(&self) -> f32 {
        self.x_offset
    }

    /// Offset the slot is easing toward.
    pub fn target_x(&self) -> f32 {
        self.x_target
    }

    /// Whether the slot currently shows a character.
    pub fn is_active(&self) -> bool {
        self.content.is_some()
    }

    /// The slot's morph controller.
    pub fn morph(&self) -> &MorphController {
        &self.morph
    }

    fn park(&mut self) {
        self.content = None;
        self.x_offset = SENTINEL_X;
        self.x_from = SENTINEL_X;
        self.x_target = SENTINEL_X;
        self.x_progress = 1.0;
    }

    /// Move to `x`: immediately when the slot was unused, eased otherwise.
    fn place(&mut self, x: f32) {
        if !self.is_active() {
            self.x_offset = x;
            self.x_from = x;
            self.x_target = x;
            self.x_progress = 1.0;
        } else if x != self.x_target {
            self.x_from = self.x_offset;
            self.x_target = x;
            self.x_progress = 0.0;
        }
    }

    fn advance_offset(&mut self, dt: f32, rate: f32) {
        if self.x_progress >= 1.0 {
            return;
        }
        self.x_progress = (self.x_progress + dt * rate).min(1.0);
        let eased = ease_out_cubic(self.x_progress);
        self.x_offset = self.x_from + (self.x_target - self.x_from) * eased;
    }
}

/// `max_slots` pre-allocated character slots.
pub struct SlotArena {
    slots: Vec<Slot>,
    particles_per_slot: u32,
    spacing: f32,
    rate: f32,
    max_dt: f32,
    /// Last input to `set_text`, before truncation.
    requested: String,
    text: String,
}

impl SlotArena {
    /// Allocate the arena. Slot `i` seeds its controller with `morph.seed + i`.
    pub fn new(config: &SlotConfig, morph: &MorphConfig) -> Self {
        let per_slot = config.particles_per_slot as usize;
        let collapsed = vec![Vec3::ZERO; per_slot];
        let slots = (0..config.max_slots)
            .map(|i| Slot {
                content: None,
                x_offset: SENTINEL_X,
                x_from: SENTINEL_X,
                x_target: SENTINEL_X,
                x_progress: 1.0,
                morph: MorphController::new(
                    per_slot,
                    &collapsed,
                    morph.clone().with_seed(morph.seed.wrapping_add(i as u64)),
                ),
            })
            .collect();
        Self {
            slots,
            particles_per_slot: config.particles_per_slot,
            spacing: config.spacing,
            rate: morph.rate,
            max_dt: morph.max_dt,
            requested: String::new(),
            text: String::new(),
        }
    }

    /// Number of slots.
    pub fn max_slots(&self) -> usize {
        self.slots.len()
    }

    /// Particles per slot.
    pub fn particles_per_slot(&self) -> u32 {
        self.particles_per_slot
    }

    /// Length of the buffer written by [`write_positions`](Self::write_positions).
    pub fn particle_count(&self) -> usize {
        self.slots.len() * self.particles_per_slot as usize
    }

    /// Text currently laid out (after truncation).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All slots, in order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Indices of occupied slots.
    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_active())
            .map(|(i, _)| i)
    }

    /// Lay out `text`, retargeting slots whose character changed.
    ///
    /// Characters past `max_slots` are dropped. Returns `false` if the text is
    /// unchanged.
    pub fn set_text(
        &mut self,
        text: &str,
        rasterizer: &mut GlyphRasterizer,
        cache: &mut PositionCache,
    ) -> bool {
        if text == self.requested {
            return false;
        }
        self.requested = text.to_string();

        let mut chars: Vec<char> = text.chars().collect();
        if chars.len() > self.slots.len() {
            log::warn!(
                "{:?} has {} characters, only {} slots available",
                text,
                chars.len(),
                self.slots.len()
            );
            chars.truncate(self.slots.len());
        }
        let text: String = chars.iter().collect();
        if text == self.text {
            return false;
        }

        let n = chars.len();
        let start = centered_start(self.slots.len(), n);
        let center = (n as f32 - 1.0) * 0.5;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let Some(&ch) = i.checked_sub(start).and_then(|k| chars.get(k)) else {
                slot.park();
                continue;
            };

            let k = i - start;
            slot.place((k as f32 - center) * self.spacing);
            if slot.content != Some(ch) {
                let glyph = rasterizer.rasterize_cached(
                    cache,
                    ch.encode_utf8(&mut [0; 4]),
                    self.particles_per_slot,
                );
                slot.morph.set_target(&glyph);
                slot.content = Some(ch);
            }
        }

        log::debug!("slot arena now shows {:?}", text);
        self.text = text;
        true
    }

    /// Show a whole-second countdown value.
    pub fn set_countdown(
        &mut self,
        seconds: u32,
        rasterizer: &mut GlyphRasterizer,
        cache: &mut PositionCache,
    ) -> bool {
        self.set_text(&seconds.to_string(), rasterizer, cache)
    }

    /// Tick every slot.
    pub fn advance(&mut self, dt: f32) {
        let offset_dt = clamp_dt(dt, self.max_dt);
        for slot in &mut self.slots {
            slot.morph.advance(dt);
            slot.advance_offset(offset_dt, self.rate);
        }
    }

    /// Tick every slot with the idle shimmer phased by the host clock.
    pub fn advance_at(&mut self, dt: f32, elapsed: f32) {
        let offset_dt = clamp_dt(dt, self.max_dt);
        for slot in &mut self.slots {
            slot.morph.advance_at(dt, elapsed);
            slot.advance_offset(offset_dt, self.rate);
        }
    }

    /// Write every slot's particles, offsets applied, into `out`.
    ///
    /// `out` should be [`particle_count`](Self::particle_count) long; unused
    /// slots are written as [`SENTINEL`].
    pub fn write_positions(&self, out: &mut [Vec3]) {
        let per_slot = self.particles_per_slot as usize;
        if per_slot == 0 {
            return;
        }
        for (slot, chunk) in self.slots.iter().zip(out.chunks_mut(per_slot)) {
            if slot.is_active() {
                let offset = Vec3::new(slot.x_offset, 0.0, 0.0);
                for (o, p) in chunk.iter_mut().zip(slot.morph.live()) {
                    *o = *p + offset;
                }
            } else {
                chunk.fill(SENTINEL);
            }
        }
    }
}

/// Whole seconds to display for `remaining` seconds, rounded up.
pub fn countdown_seconds(remaining: f32) -> u32 {
    if remaining.is_finite() && remaining > 0.0 {
        remaining.ceil() as u32
    } else {
        0
    }
}
