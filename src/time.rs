//! Frame timing for the host loop.
//!
//! The engine never reads a clock itself; it is handed a [`FrameTime`] every
//! tick. [`Time`] is the convenience clock that produces one, either from the
//! wall clock ([`Time::update`]) or from a delta the host already has
//! ([`Time::advance`]). Both paths clamp the delta to [`Time::max_delta`] so a
//! stalled tab or a debugger pause cannot launch a transition to completion in
//! one frame.
//!
//! # Example
//!
//! ```ignore
//! use glyphmorph::time::Time;
//!
//! let mut time = Time::new();
//!
//! // In your frame callback:
//! time.update();
//! let frame = engine.tick(time.frame(), &settings);
//! ```

use std::time::{Duration, Instant};

/// Default cap on a single frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.05;

/// Timing for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Seconds since the clock started.
    pub elapsed: f32,
}

impl FrameTime {
    /// A frame with the given delta and elapsed time.
    pub fn new(dt: f32, elapsed: f32) -> Self {
        Self { dt, elapsed }
    }
}

/// Host clock.
#[derive(Debug)]
pub struct Time {
    /// When the last wall-clock update occurred.
    last_frame: Instant,
    /// Accumulated (clamped, scaled) time in seconds.
    elapsed_secs: f32,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
    /// Upper bound on a single delta.
    max_delta: f32,
}

impl Time {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Set the delta cap. Non-finite or negative values are treated as 0.
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = if max_delta.is_finite() { max_delta.max(0.0) } else { 0.0 };
        self
    }

    /// Update from the wall clock. Call once per frame.
    pub fn update(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.fps_update_interval <= now.duration_since(self.fps_update_time) {
            let window = now.duration_since(self.fps_update_time).as_secs_f32();
            self.fps = (self.frame_count + 1 - self.fps_frame_count) as f32 / window;
            self.fps_frame_count = self.frame_count + 1;
            self.fps_update_time = now;
        }

        self.step(raw)
    }

    /// Advance by a host-provided delta instead of reading the clock.
    pub fn advance(&mut self, dt: f32) -> FrameTime {
        self.step(dt)
    }

    fn step(&mut self, raw: f32) -> FrameTime {
        if self.paused {
            self.delta_secs = 0.0;
            return self.frame();
        }

        let raw = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        let dt = self.fixed_delta.unwrap_or(raw) * self.time_scale;
        self.delta_secs = dt.min(self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;
        self.frame()
    }

    /// The current [`FrameTime`].
    #[inline]
    pub fn frame(&self) -> FrameTime {
        FrameTime::new(self.delta_secs, self.elapsed_secs)
    }

    /// Total (clamped) elapsed time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds (delta time).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second (wall-clock updates only).
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Delta cap in seconds.
    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` is 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after pausing. The paused interval is not counted.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set a fixed delta time for deterministic updates.
    ///
    /// Pass `None` to use real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Reset the clock to its initial state, keeping scale and caps.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_frame = now;
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
        self.paused = false;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame_count(), 0);
        assert!(!time.is_paused());
        assert_eq!(time.time_scale(), 1.0);
        assert_eq!(time.max_delta(), DEFAULT_MAX_DELTA);
    }

    #[test]
    fn test_time_update() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let frame = time.update();

        assert!(frame.elapsed > 0.0);
        assert!(frame.dt > 0.0);
        assert!(frame.dt <= DEFAULT_MAX_DELTA);
        assert_eq!(time.frame_count(), 1);
    }

    #[test]
    fn test_advance_clamps_spikes() {
        let mut time = Time::new();
        let frame = time.advance(5.0);
        assert_eq!(frame.dt, DEFAULT_MAX_DELTA);
        assert_eq!(frame.elapsed, DEFAULT_MAX_DELTA);

        let frame = time.advance(0.016);
        assert!((frame.dt - 0.016).abs() < 1e-6);
        assert!((frame.elapsed - 0.066).abs() < 1e-6);
    }

    #[test]
    fn test_advance_rejects_bad_deltas() {
        let mut time = Time::new();
        assert_eq!(time.advance(-1.0).dt, 0.0);
        assert_eq!(time.advance(f32::NAN).dt, 0.0);
        assert_eq!(time.elapsed(), 0.0);
    }

    #[test]
    fn test_time_pause() {
        let mut time = Time::new();
        time.advance(0.01);

        time.pause();
        assert!(time.is_paused());

        let elapsed_before = time.elapsed();
        thread::sleep(Duration::from_millis(10));
        time.update();
        time.advance(0.02);

        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);

        time.resume();
        time.advance(0.02);
        assert!(time.elapsed() > elapsed_before);
    }

    #[test]
    fn test_time_scale() {
        let mut time = Time::new();
        time.set_time_scale(2.0);
        assert_eq!(time.time_scale(), 2.0);
        assert!((time.advance(0.01).dt - 0.02).abs() < 1e-6);

        // Negative scale should clamp to 0
        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(100));
        time.update();

        let expected = 1.0 / 60.0;
        assert!((time.delta() - expected).abs() < 0.0001);
    }

    #[test]
    fn test_custom_max_delta() {
        let mut time = Time::new().with_max_delta(0.1);
        assert!((time.advance(0.08).dt - 0.08).abs() < 1e-6);
        assert!((time.advance(1.0).dt - 0.1).abs() < 1e-6);
    }
}
