//! Glyph rasterization backends.
//!
//! A backend turns a string into a luminance bitmap: bright foreground on a
//! dark background. Everything after that (thresholding, normalization,
//! sampling) is backend-independent and lives in [`super::GlyphRasterizer`].

use crate::error::RasterError;
use image::GrayImage;

/// Renders text to an 8-bit luminance bitmap.
///
/// Implementations should render bold, large (the rasterizer asks for
/// ~110px), and size the bitmap so the whole string fits with some margin.
pub trait GlyphRasterizationBackend {
    /// Short identifier used in log messages.
    fn name(&self) -> &str;

    /// Render `text` at `font_px` pixels.
    fn render(&mut self, text: &str, font_px: f32) -> Result<GrayImage, RasterError>;
}

impl<B: GlyphRasterizationBackend + ?Sized> GlyphRasterizationBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render(&mut self, text: &str, font_px: f32) -> Result<GrayImage, RasterError> {
        (**self).render(text, font_px)
    }
}

/// A backend for hosts without any 2-D text capability.
///
/// Every render fails, so the rasterizer always produces its fallback shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl GlyphRasterizationBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn render(&mut self, _text: &str, _font_px: f32) -> Result<GrayImage, RasterError> {
        Err(RasterError::BackendUnavailable {
            backend: self.name().to_string(),
            reason: "no glyph rasterization capability".to_string(),
        })
    }
}

/// Adapts a closure into a backend.
///
/// ```ignore
/// let backend = FnBackend::new("blocks", |text: &str, px: f32| {
///     Ok(GrayImage::from_pixel(px as u32, px as u32, Luma([255])))
/// });
/// ```
pub struct FnBackend<F> {
    name: String,
    render: F,
}

impl<F> FnBackend<F>
where
    F: FnMut(&str, f32) -> Result<GrayImage, RasterError>,
{
    /// Wrap `render` under the given name.
    pub fn new(name: impl Into<String>, render: F) -> Self {
        Self {
            name: name.into(),
            render,
        }
    }
}

impl<F> GlyphRasterizationBackend for FnBackend<F>
where
    F: FnMut(&str, f32) -> Result<GrayImage, RasterError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, text: &str, font_px: f32) -> Result<GrayImage, RasterError> {
        (self.render)(text, font_px)
    }
}
