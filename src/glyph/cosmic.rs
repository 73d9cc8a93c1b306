//! System-font backend built on `cosmic-text`.
//!
//! Shapes the string with font fallback (so CJK and emoji resolve to whatever
//! the system provides) and draws it bold, white on black, into a
//! [`GrayImage`].

use super::backend::GlyphRasterizationBackend;
use crate::error::RasterError;
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use image::GrayImage;

/// Glyph backend using the system font database.
pub struct CosmicTextBackend {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
}

impl CosmicTextBackend {
    /// Create a backend that loads system fonts.
    ///
    /// Loading the font database is slow; create one backend and keep it.
    pub fn new() -> Self {
        Self::from_font_system(FontSystem::new())
    }

    /// Use an already populated font system.
    pub fn from_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            family: None,
        }
    }

    /// Prefer a named family instead of the default sans-serif.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Canvas size for `text` at `font_px`, with a margin of half an em.
    fn canvas_size(text: &str, font_px: f32) -> (u32, u32) {
        let chars = text.chars().count().max(1) as f32;
        let width = (font_px * 1.2 * chars + font_px).ceil() as u32;
        let height = (font_px * 1.6).ceil() as u32;
        (width, height)
    }
}

impl Default for CosmicTextBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphRasterizationBackend for CosmicTextBackend {
    fn name(&self) -> &str {
        "cosmic-text"
    }

    fn render(&mut self, text: &str, font_px: f32) -> Result<GrayImage, RasterError> {
        if self.font_system.db().len() == 0 {
            return Err(RasterError::BackendUnavailable {
                backend: self.name().to_string(),
                reason: "font database is empty".to_string(),
            });
        }

        let (width, height) = Self::canvas_size(text, font_px);
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyBitmap { width, height });
        }

        let metrics = Metrics::new(font_px, font_px * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(
            &mut self.font_system,
            Some(width as f32),
            Some(height as f32),
        );

        let family = match &self.family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new().family(family).weight(Weight::BOLD);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let margin = (font_px * 0.5) as i32;
        let top = (font_px * 0.2) as i32;
        let mut bitmap = GrayImage::new(width, height);
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgb(255, 255, 255),
            |x, y, w, h, color| {
                let alpha = color.a();
                if alpha == 0 {
                    return;
                }
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        let px = x + dx + margin;
                        let py = y + dy + top;
                        if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                            continue;
                        }
                        let pixel = bitmap.get_pixel_mut(px as u32, py as u32);
                        pixel.0[0] = pixel.0[0].max(alpha);
                    }
                }
            },
        );

        Ok(bitmap)
    }
}
