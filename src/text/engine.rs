use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Single-font Parley shaper used to measure and lay out subtitle lines.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("family_name", &self.family_name)
            .field("size_px", &self.size_px)
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    /// Register `font_bytes` and shape at `size_px`.
    pub fn from_font_bytes(font_bytes: Vec<u8>, size_px: f32) -> ReelResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            size_px,
        })
    }

    /// Read a TTF/OTF file and shape at `size_px`.
    pub fn from_path(path: &Path, size_px: f32) -> ReelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ReelError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_font_bytes(bytes, size_px)
    }

    /// Font size used for shaping.
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Font data for glyph rasterization.
    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Advance width of `text` laid out on a single line.
    pub fn measure(&mut self, text: &str) -> f32 {
        let layout = self.layout_line(text, TextBrushRgba8::default());
        layout
            .lines()
            .map(|line| line.metrics().advance)
            .fold(0.0f32, f32::max)
    }

    /// Shape `text` without line breaking.
    pub fn layout_line(
        &mut self,
        text: &str,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// Font-free width estimate: average glyph advance of a bold sans face at `size_px`.
pub fn approximate_width(text: &str, size_px: f32) -> f32 {
    text.chars().count() as f32 * size_px * 0.55
}

#[cfg(test)]
#[path = "../../tests/unit/text/engine.rs"]
mod tests;
