//! Buffer morphing.
//!
//! [`MorphController`] owns one fixed-length live buffer and animates it toward
//! whatever target the caller currently wants:
//!
//! | Phase | Per tick |
//! |-------|----------|
//! | `Transitioning` | `progress += dt * rate`, `live = lerp(from, to, ease_out_cubic(progress))` |
//! | `Settled` | `live = to + idle shimmer` |
//!
//! A new target snapshots the live buffer (even mid-transition) into `from`
//! and restarts at `progress = 0`, so superseded transitions never jump.
//!
//! [`SpreadBlend`] is the continuous counterpart for binary toggles such as
//! "formed vs. spread out": an exponential approach that is never triggered,
//! only steered.

use crate::shapes;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// X coordinate marking a hidden, unused particle.
pub const SENTINEL_X: f32 = -1000.0;

/// Position used to pad buffers past the end of their content.
pub const SENTINEL: Vec3 = Vec3::new(SENTINEL_X, 0.0, 0.0);

/// Whether `p` is a parked sentinel particle.
#[inline]
pub fn is_sentinel(p: Vec3) -> bool {
    p.x <= SENTINEL_X * 0.5
}

/// Cubic ease-out: fast start, gentle landing.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// `out[i] = lerp(from[i], to[i], t)` over the common length.
pub fn lerp_points(from: &[Vec3], to: &[Vec3], t: f32, out: &mut [Vec3]) {
    for ((o, a), b) in out.iter_mut().zip(from).zip(to) {
        *o = a.lerp(*b, t);
    }
}

/// Clamp a frame delta into `[0, max_dt]`, treating garbage as zero.
#[inline]
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt.min(max_dt)
    } else {
        0.0
    }
}

/// Transition and idle tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    /// Progress per second. 3.5 gives a ~290ms transition.
    pub rate: f32,
    /// Largest dt applied in a single tick, in seconds.
    pub max_dt: f32,
    /// Idle shimmer amplitude in model units. 0 disables it.
    pub idle_amplitude: f32,
    /// Idle shimmer frequency in Hz.
    pub idle_frequency: f32,
    /// Seed for the controller's RNG.
    pub seed: u64,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            rate: 3.5,
            max_dt: 0.05,
            idle_amplitude: 0.015,
            idle_frequency: 0.6,
            seed: 0x5eed,
        }
    }
}

impl MorphConfig {
    /// Same settings with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Where a controller is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphPhase {
    /// At the target, shimmering.
    Settled,
    /// Easing from `from` toward `to`.
    Transitioning,
}

/// Eased interpolation over one fixed-capacity buffer.
///
/// # Example
///
/// ```ignore
/// let mut morph = MorphController::new(800, &sample_shape(&tree), MorphConfig::default());
/// morph.set_target(&sample_shape(&heart));
///
/// // each frame
/// let positions = morph.advance(dt);
/// ```
pub struct MorphController {
    live: Vec<Vec3>,
    from: Vec<Vec3>,
    to: Vec<Vec3>,
    progress: f32,
    phase: MorphPhase,
    config: MorphConfig,
    elapsed: f32,
    /// Shimmer gain drawn once per tick.
    shimmer: f32,
    rng: SmallRng,
}

impl MorphController {
    /// Controller settled at `initial`, padded or truncated to `capacity`.
    pub fn new(capacity: usize, initial: &[Vec3], config: MorphConfig) -> Self {
        let mut to = vec![SENTINEL; capacity];
        fit_into(initial, &mut to);
        Self {
            live: to.clone(),
            from: to.clone(),
            to,
            progress: 1.0,
            phase: MorphPhase::Settled,
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            elapsed: 0.0,
            shimmer: 1.0,
        }
    }

    /// Controller of `capacity` particles, all parked at the sentinel.
    pub fn hidden(capacity: usize, config: MorphConfig) -> Self {
        Self::new(capacity, &[], config)
    }

    /// Fixed number of particles.
    pub fn capacity(&self) -> usize {
        self.live.len()
    }

    /// Transition progress in `[0, 1]`; 1 when settled.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Current phase.
    pub fn phase(&self) -> MorphPhase {
        self.phase
    }

    /// Whether no transition is running.
    pub fn is_settled(&self) -> bool {
        self.phase == MorphPhase::Settled
    }

    /// The buffer to render.
    pub fn live(&self) -> &[Vec3] {
        &self.live
    }

    /// Start of the current transition.
    pub fn from(&self) -> &[Vec3] {
        &self.from
    }

    /// Current target.
    pub fn target(&self) -> &[Vec3] {
        &self.to
    }

    /// Steer toward a new target.
    ///
    /// Returns `false` (and does nothing) when `target` equals the current
    /// target. Shorter targets are padded with [`SENTINEL`]; longer ones are
    /// truncated.
    pub fn set_target(&mut self, target: &[Vec3]) -> bool {
        if self.live.is_empty() || self.target_matches(target) {
            return false;
        }
        if target.len() > self.capacity() {
            log::warn!(
                "morph target has {} points, truncating to capacity {}",
                target.len(),
                self.capacity()
            );
        }

        self.from.copy_from_slice(&self.live);
        fit_into(target, &mut self.to);
        self.progress = 0.0;
        self.phase = MorphPhase::Transitioning;
        true
    }

    /// Replace the target and the live buffer immediately, without easing.
    pub fn snap_to(&mut self, target: &[Vec3]) {
        fit_into(target, &mut self.to);
        self.from.copy_from_slice(&self.to);
        self.live.copy_from_slice(&self.to);
        self.progress = 1.0;
        self.phase = MorphPhase::Settled;
    }

    /// Advance by `dt` seconds and return the live buffer.
    ///
    /// `dt` is clamped to `[0, max_dt]` first. The idle shimmer runs on the
    /// controller's own clock (the sum of clamped deltas).
    pub fn advance(&mut self, dt: f32) -> &[Vec3] {
        self.step(dt, None)
    }

    /// Like [`advance`](Self::advance), with the idle shimmer phased by the
    /// host's `elapsed` seconds so every controller on screen shares a clock.
    pub fn advance_at(&mut self, dt: f32, elapsed: f32) -> &[Vec3] {
        self.step(dt, Some(elapsed))
    }

    fn step(&mut self, dt: f32, clock: Option<f32>) -> &[Vec3] {
        if self.live.is_empty() {
            return &self.live;
        }
        let dt = clamp_dt(dt, self.config.max_dt);
        self.elapsed = match clock {
            Some(elapsed) if elapsed.is_finite() => elapsed,
            _ => self.elapsed + dt,
        };
        self.shimmer = 0.75 + 0.5 * self.rng.gen::<f32>();

        match self.phase {
            MorphPhase::Transitioning => {
                self.progress = (self.progress + dt * self.config.rate).min(1.0);
                if self.progress >= 1.0 {
                    self.live.copy_from_slice(&self.to);
                    self.phase = MorphPhase::Settled;
                    log::trace!("morph of {} particles settled", self.live.len());
                } else {
                    let eased = ease_out_cubic(self.progress);
                    lerp_points(&self.from, &self.to, eased, &mut self.live);
                }
            }
            MorphPhase::Settled => self.apply_idle(),
        }
        &self.live
    }

    fn apply_idle(&mut self) {
        let amplitude = self.config.idle_amplitude * self.shimmer;
        if amplitude <= 0.0 {
            self.live.copy_from_slice(&self.to);
            return;
        }

        let omega = self.config.idle_frequency * TAU;
        for (i, (live, to)) in self.live.iter_mut().zip(&self.to).enumerate() {
            if is_sentinel(*to) {
                *live = *to;
                continue;
            }
            let t = self.elapsed * omega + shapes::hash(i as u32, 31.0) * TAU;
            let wobble = Vec3::new(t.sin(), (t * 1.3 + 1.0).sin(), (t * 0.7 + 2.0).cos());
            *live = *to + wobble * amplitude;
        }
    }

    fn target_matches(&self, target: &[Vec3]) -> bool {
        let n = self.to.len();
        if target.len() >= n {
            self.to[..] == target[..n]
        } else {
            self.to[..target.len()] == *target
                && self.to[target.len()..].iter().all(|p| *p == SENTINEL)
        }
    }
}

/// Copy `src` into `dst`, padding the tail with [`SENTINEL`].
fn fit_into(src: &[Vec3], dst: &mut [Vec3]) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    dst[n..].fill(SENTINEL);
}

/// Blend tunables for [`SpreadBlend`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    /// Approach rate `k` per second.
    pub rate: f32,
    /// Largest dt applied in a single tick.
    pub max_dt: f32,
    /// Radius of the spread-out shell.
    pub radius: f32,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            rate: 3.0,
            max_dt: 0.1,
            radius: 2.6,
        }
    }
}

/// Exponential approach between "formed" (0) and "spread" (1).
///
/// `progress += (target - progress) * min(1, dt * k)` each tick, so it moves
/// monotonically toward the target and can never overshoot, whatever the dt.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadBlend {
    progress: f32,
    target: f32,
    rate: f32,
    max_dt: f32,
}

impl SpreadBlend {
    /// Formed blend approaching at `rate` per second.
    pub fn new(rate: f32) -> Self {
        Self {
            progress: 0.0,
            target: 0.0,
            rate: rate.max(0.0),
            max_dt: SpreadConfig::default().max_dt,
        }
    }

    /// Blend configured from a [`SpreadConfig`].
    pub fn from_config(config: &SpreadConfig) -> Self {
        Self::new(config.rate).with_max_dt(config.max_dt)
    }

    /// Override the per-tick dt cap.
    pub fn with_max_dt(mut self, max_dt: f32) -> Self {
        self.max_dt = max_dt.max(0.0);
        self
    }

    /// Aim at spread (`true`) or formed (`false`).
    pub fn set_target(&mut self, spread: bool) {
        self.target = if spread { 1.0 } else { 0.0 };
    }

    /// Current blend factor in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Current target, 0 or 1.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the blend is aiming at spread.
    pub fn is_spreading(&self) -> bool {
        self.target > 0.5
    }

    /// Advance by `dt` seconds and return the new progress.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = clamp_dt(dt, self.max_dt);
        let step = (dt * self.rate).min(1.0);
        self.progress = (self.progress + (self.target - self.progress) * step).clamp(0.0, 1.0);
        self.progress
    }

    /// `out[i] = lerp(base[i], spread[i], progress)`.
    ///
    /// Sentinel particles in `base` stay parked.
    pub fn apply(&self, base: &[Vec3], spread: &[Vec3], out: &mut [Vec3]) {
        for ((o, b), s) in out.iter_mut().zip(base).zip(spread) {
            *o = if is_sentinel(*b) {
                *b
            } else {
                b.lerp(*s, self.progress)
            };
        }
    }
}

impl Default for SpreadBlend {
    fn default() -> Self {
        Self::from_config(&SpreadConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still() -> MorphConfig {
        MorphConfig {
            idle_amplitude: 0.0,
            ..MorphConfig::default()
        }
    }

    fn filled(n: usize, v: f32) -> Vec<Vec3> {
        vec![Vec3::splat(v); n]
    }

    #[test]
    fn test_initial_state_is_settled() {
        let morph = MorphController::new(4, &filled(4, 1.0), still());
        assert!(morph.is_settled());
        assert_eq!(morph.live(), morph.target());
        assert_eq!(morph.from(), morph.target());
    }

    #[test]
    fn test_transition_saturates() {
        let mut morph = MorphController::new(16, &filled(16, 0.0), still());
        assert!(morph.set_target(&filled(16, 2.0)));
        assert_eq!(morph.phase(), MorphPhase::Transitioning);
        assert_eq!(morph.progress(), 0.0);

        // 1 / 3.5 s at 16ms ticks
        for _ in 0..18 {
            morph.advance(0.016);
        }
        assert_eq!(morph.progress(), 1.0);
        assert!(morph.is_settled());
        for p in morph.live() {
            assert!((*p - Vec3::splat(2.0)).length() < 1e-6);
        }
    }

    #[test]
    fn test_ease_out_cubic_shape() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
        assert_eq!(ease_out_cubic(3.0), 1.0);
    }

    #[test]
    fn test_same_target_is_noop() {
        let mut morph = MorphController::new(4, &filled(4, 1.0), still());
        assert!(!morph.set_target(&filled(4, 1.0)));
        assert!(morph.is_settled());
    }

    #[test]
    fn test_supersede_captures_live_buffer() {
        let mut morph = MorphController::new(8, &filled(8, 0.0), still());
        morph.set_target(&filled(8, 1.0));
        morph.advance(0.05);
        morph.advance(0.05);
        let midway = morph.live().to_vec();
        assert!(midway[0].x > 0.0 && midway[0].x < 1.0);

        assert!(morph.set_target(&filled(8, -1.0)));
        assert_eq!(morph.from(), midway.as_slice());
        assert_eq!(morph.progress(), 0.0);
    }

    #[test]
    fn test_dt_spike_is_clamped() {
        let mut morph = MorphController::new(2, &filled(2, 0.0), still());
        morph.set_target(&filled(2, 1.0));
        morph.advance(5.0);
        assert!((morph.progress() - 0.05 * 3.5).abs() < 1e-6);
        morph.advance(f32::NAN);
        assert!((morph.progress() - 0.05 * 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_short_target_is_sentinel_padded() {
        let mut morph = MorphController::new(6, &[], still());
        assert!(morph.live().iter().all(|p| *p == SENTINEL));
        morph.set_target(&filled(2, 0.5));
        assert_eq!(morph.capacity(), 6);
        assert_eq!(&morph.target()[2..], &[SENTINEL; 4]);
        // padding an identical prefix again is not a new target
        assert!(!morph.set_target(&filled(2, 0.5)));
    }

    #[test]
    fn test_long_target_is_truncated() {
        let mut morph = MorphController::new(3, &[], still());
        morph.set_target(&filled(10, 0.5));
        assert_eq!(morph.target().len(), 3);
    }

    #[test]
    fn test_zero_capacity_is_noop() {
        let mut morph = MorphController::new(0, &filled(5, 1.0), MorphConfig::default());
        assert!(!morph.set_target(&filled(5, 2.0)));
        assert!(morph.advance(0.016).is_empty());
    }

    #[test]
    fn test_idle_shimmer_is_small_and_reproducible() {
        let config = MorphConfig::default().with_seed(99);
        let mut a = MorphController::new(32, &filled(32, 0.0), config.clone());
        let mut b = MorphController::new(32, &filled(32, 0.0), config);
        for _ in 0..30 {
            a.advance(0.016);
            b.advance(0.016);
        }
        assert_eq!(a.live(), b.live());
        let bound = MorphConfig::default().idle_amplitude * 1.25 * 3f32.sqrt() + 1e-6;
        assert!(a.live().iter().all(|p| p.length() <= bound));
        assert!(a.live().iter().any(|p| p.length() > 0.0));
    }

    #[test]
    fn test_idle_shimmer_follows_host_clock() {
        let config = MorphConfig::default().with_seed(5);
        let mut a = MorphController::new(16, &filled(16, 0.0), config.clone());
        let mut b = MorphController::new(16, &filled(16, 0.0), config.clone());
        let mut c = MorphController::new(16, &filled(16, 0.0), config);

        a.advance_at(0.016, 3.25);
        b.advance_at(0.016, 3.25);
        c.advance(0.016);
        assert_eq!(a.live(), b.live());
        assert_ne!(a.live(), c.live());

        // a bad clock falls back to accumulating dt
        b.advance_at(0.016, f32::NAN);
        assert!(b.live().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_sentinels_do_not_shimmer() {
        let mut morph = MorphController::hidden(4, MorphConfig::default());
        for _ in 0..10 {
            morph.advance(0.016);
        }
        assert!(morph.live().iter().all(|p| *p == SENTINEL));
    }

    #[test]
    fn test_spread_blend_bounded_under_spikes() {
        let mut blend = SpreadBlend::new(3.0);
        blend.set_target(true);
        let mut last = blend.progress();
        for dt in [5.0, 0.016, 5.0, 1e9, 0.2] {
            let p = blend.advance(dt);
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= last);
            last = p;
        }
        blend.set_target(false);
        for _ in 0..5 {
            let p = blend.advance(5.0);
            assert!((0.0..=1.0).contains(&p));
            assert!(p <= last);
            last = p;
        }
    }

    #[test]
    fn test_spread_blend_tracks_exponential() {
        let k = 3.0;
        let mut blend = SpreadBlend::new(k);
        blend.set_target(true);
        for step in 1..=20 {
            let p = blend.advance(0.1);
            let t = step as f32 * 0.1;
            let ideal = 1.0 - (-k * t).exp();
            assert!((p - ideal).abs() < 0.08, "t={t} p={p} ideal={ideal}");
        }
        assert!(1.0 - blend.progress() < 0.01);
    }

    #[test]
    fn test_spread_apply_keeps_sentinels() {
        let mut blend = SpreadBlend::new(3.0);
        blend.set_target(true);
        for _ in 0..100 {
            blend.advance(0.1);
        }
        let base = [Vec3::ZERO, SENTINEL];
        let spread = [Vec3::ONE, Vec3::ONE];
        let mut out = [Vec3::ZERO; 2];
        blend.apply(&base, &spread, &mut out);
        assert!((out[0] - Vec3::ONE).length() < 1e-3);
        assert_eq!(out[1], SENTINEL);
    }
}
