//! Engine configuration and per-frame settings.
//!
//! Two TOML documents drive the engine:
//!
//! | Type | Changes | Contents |
//! |------|---------|----------|
//! | [`EngineConfig`] | once, at construction | rates, caps, slot layout, raster tunables |
//! | [`Settings`] | any frame | shape, particle count, text, label, theme |
//!
//! Every field has a default, so an empty file is a valid config.
//!
//! ```toml
//! cache_capacity = 128
//!
//! [morph]
//! rate = 4.0
//!
//! [slots]
//! max_slots = 8
//! ```

use crate::error::ConfigError;
use crate::glyph::RasterConfig;
use crate::morph::{MorphConfig, SpreadConfig};
use crate::shapes::ShapeKind;
use crate::slots::SlotConfig;
use crate::visuals::{ColorMapping, Palette};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables fixed for an engine's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Formation, label and slot transitions.
    pub morph: MorphConfig,
    /// Formed/spread blend.
    pub spread: SpreadConfig,
    /// Per-character text layout.
    pub slots: SlotConfig,
    /// Glyph rasterization.
    pub raster: RasterConfig,
    /// How particles are colored and sized.
    pub render: RenderConfig,
    /// Maximum cached glyph arrays. 0 means unbounded.
    pub cache_capacity: usize,
    /// Particles used for the free-form label.
    pub label_particles: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            morph: MorphConfig::default(),
            spread: SpreadConfig::default(),
            slots: SlotConfig::default(),
            raster: RasterConfig::default(),
            render: RenderConfig::default(),
            cache_capacity: 256,
            label_particles: 1500,
        }
    }
}

/// Colorizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base point size in model units.
    pub point_size: f32,
    /// Palette coordinate for the formation.
    pub mapping: ColorMapping,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 0.05,
            mapping: ColorMapping::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Write as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.morph.rate.is_finite() && self.morph.rate > 0.0) {
            return Err(ConfigError::invalid("morph.rate", "must be positive"));
        }
        if !(self.morph.max_dt.is_finite() && self.morph.max_dt > 0.0) {
            return Err(ConfigError::invalid("morph.max_dt", "must be positive"));
        }
        if !(self.morph.idle_amplitude.is_finite() && self.morph.idle_amplitude >= 0.0) {
            return Err(ConfigError::invalid("morph.idle_amplitude", "must be >= 0"));
        }
        if !self.morph.idle_frequency.is_finite() {
            return Err(ConfigError::invalid("morph.idle_frequency", "must be finite"));
        }
        if !(self.spread.rate.is_finite() && self.spread.rate >= 0.0) {
            return Err(ConfigError::invalid("spread.rate", "must be >= 0"));
        }
        if !(self.spread.max_dt.is_finite() && self.spread.max_dt > 0.0) {
            return Err(ConfigError::invalid("spread.max_dt", "must be positive"));
        }
        if !(self.spread.radius.is_finite() && self.spread.radius > 0.0) {
            return Err(ConfigError::invalid("spread.radius", "must be positive"));
        }
        if !self.slots.spacing.is_finite() {
            return Err(ConfigError::invalid("slots.spacing", "must be finite"));
        }
        if !(self.render.point_size.is_finite() && self.render.point_size >= 0.0) {
            return Err(ConfigError::invalid("render.point_size", "must be >= 0"));
        }
        self.raster.validate()
    }
}

/// Read-only snapshot of what the host wants on screen.
///
/// Passed to [`Engine::tick`](crate::Engine::tick) every frame; the engine
/// diffs it against the previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Formation shape.
    pub shape: ShapeKind,
    /// Formation particle count.
    pub particle_count: u32,
    /// Formation scale.
    pub scale: f32,
    /// Text laid out in the slot arena (countdown digits, greetings).
    pub text: String,
    /// Free-form label rendered as a single point cloud.
    pub label: Option<String>,
    /// Colour theme.
    pub theme: Palette,
    /// `true` holds the formation shape; `false` spreads it out.
    pub formed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Tree,
            particle_count: 3000,
            scale: 1.0,
            text: String::new(),
            label: None,
            theme: Palette::default(),
            formed: true,
        }
    }
}

impl Settings {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(s)?;
        if !(settings.scale.is_finite() && settings.scale > 0.0) {
            return Err(ConfigError::invalid("scale", "must be positive"));
        }
        Ok(settings)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Builder: formation shape.
    pub fn with_shape(mut self, shape: ShapeKind) -> Self {
        self.shape = shape;
        self
    }

    /// Builder: formation particle count.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    /// Builder: slot text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: free-form label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builder: formed or spread.
    pub fn with_formed(mut self, formed: bool) -> Self {
        self.formed = formed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.slots.max_slots, 12);
        assert_eq!(config.cache_capacity, 256);
        assert_eq!(config.label_particles, 1500);
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            cache_capacity = 0

            [morph]
            rate = 5.0

            [raster]
            fallback = "stripes"
            seed = 42

            [render.mapping]
            mode = "distance"
            max = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.morph.rate, 5.0);
        assert_eq!(config.morph.max_dt, 0.05);
        assert_eq!(config.raster.seed, Some(42));
        assert_eq!(config.render.mapping, ColorMapping::Distance { max: 2.0 });
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("[morph]\nrate = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "morph.rate", .. }));

        let err = EngineConfig::from_toml_str("[raster]\nfont_px = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "raster.font_px", .. }));

        let err = EngineConfig::from_toml_str("cache_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = Settings::from_toml_str(
            r#"
            shape = "heart"
            particle_count = 200
            text = "2025"
            label = "Happy New Year"
            theme = "frost"
            formed = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.shape, ShapeKind::Heart);
        assert_eq!(settings.particle_count, 200);
        assert_eq!(settings.label.as_deref(), Some("Happy New Year"));
        assert_eq!(settings.theme, Palette::Frost);
        assert!(!settings.formed);
    }

    #[test]
    fn test_unknown_shape_falls_back() {
        let settings = Settings::from_toml_str("shape = \"dodecahedron\"").unwrap();
        assert_eq!(settings.shape, ShapeKind::Sphere);
    }

    #[test]
    fn test_config_save_load() {
        let path = std::env::temp_dir()
            .join(format!("glyphmorph-config-{}.toml", std::process::id()));
        let mut config = EngineConfig::default();
        config.slots.max_slots = 8;
        config.raster.seed = Some(9);
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
