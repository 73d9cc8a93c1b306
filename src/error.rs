//! Error types for glyphmorph.
//!
//! Engine operations never fail; they absorb problems into fallback shapes.
//! The errors here surface only at the edges: a glyph backend reporting why
//! it could not produce a bitmap, and configuration loading.

use thiserror::Error;

/// Errors a glyph rasterization backend can report.
///
/// [`GlyphRasterizer`](crate::GlyphRasterizer) logs these and substitutes the
/// configured fallback shape; they never reach engine callers.
#[derive(Debug, Error)]
pub enum RasterError {
    /// No 2-D rasterization capability is available (no fonts, no canvas).
    #[error("glyph backend `{backend}` is unavailable: {reason}")]
    BackendUnavailable {
        /// Name of the backend that failed.
        backend: String,
        /// Human-readable cause.
        reason: String,
    },
    /// The backend was asked for a zero-sized bitmap.
    #[error("cannot rasterize into a {width}x{height} bitmap")]
    EmptyBitmap {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
}

/// Errors that can occur while loading configuration or settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for the expected structure.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The value could not be written out as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value parsed but is out of its allowed range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
