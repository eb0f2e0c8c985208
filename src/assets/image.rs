use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Largest width or height the compositor can draw.
pub const MAX_IMAGE_SIDE: u32 = u16::MAX as u32;

/// Decoded still image, ready to draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap premultiplied RGBA8 bytes.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> ReelResult<Self> {
        let img = Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        };
        img.validate()?;
        Ok(img)
    }

    /// Flat single-color image. Sizes are checked like [`PreparedImage::from_premul`].
    pub fn solid(width: u32, height: u32, color: Rgba8) -> ReelResult<Self> {
        check_size(width, height)?;
        Ok(Self::fill(width, height, color))
    }

    /// Dark stand-in used when a scene has no usable image.
    ///
    /// Sized to the canvas, clamped into the drawable range.
    pub fn placeholder(canvas: Canvas) -> Self {
        Self::fill(
            canvas.width.clamp(1, MAX_IMAGE_SIDE),
            canvas.height.clamp(1, MAX_IMAGE_SIDE),
            PLACEHOLDER_RGBA,
        )
    }

    /// Check that the image is non-empty, drawable and that its bytes match its size.
    ///
    /// Fields are public, so images built by hand are checked again before they are shown.
    pub fn validate(&self) -> ReelResult<()> {
        check_size(self.width, self.height)?;
        if self.rgba8_premul.len() != (self.width as usize) * (self.height as usize) * 4 {
            return Err(ReelError::asset_decode(
                "image byte length does not match width*height*4",
            ));
        }
        Ok(())
    }

    fn fill(width: u32, height: u32, color: Rgba8) -> Self {
        let px = color.premultiplied();
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }
}

/// Placeholder fill (`#222222`).
pub const PLACEHOLDER_RGBA: Rgba8 = Rgba8::opaque(0x22, 0x22, 0x22);

fn check_size(width: u32, height: u32) -> ReelResult<()> {
    if width == 0 || height == 0 {
        return Err(ReelError::asset_decode("image has zero width or height"));
    }
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        return Err(ReelError::asset_decode(format!(
            "image {width}x{height} exceeds the drawable limit of {MAX_IMAGE_SIDE} px per side"
        )));
    }
    Ok(())
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ReelResult<PreparedImage> {
    let dyn_img = ::image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| ReelError::asset_decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_size(width, height)?;

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    PreparedImage::from_premul(width, height, rgba8_premul)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
