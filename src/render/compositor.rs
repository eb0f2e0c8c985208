use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect};

use crate::assets::image::PreparedImage;
use crate::config::{RenderOpts, SubtitleStyle};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::{Surface, canvas_u16};
use crate::text::{TextBrushRgba8, TextEngine, approximate_width, wrap};
use crate::timeline::Scene;

/// Band rectangle and per-line baselines for a subtitle block of `n` lines.
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitlePlacement {
    /// Band anchored to the bottom edge, full width.
    pub band: Rect,
    /// Alphabetic baseline of each line, top to bottom.
    pub baselines: Vec<f32>,
}

impl SubtitlePlacement {
    /// Center `line_count` lines vertically in the band.
    pub fn compute(canvas: Canvas, style: &SubtitleStyle, line_count: usize) -> Self {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let band_h = f64::from(style.band_height_px).min(h);
        let band = Rect::new(0.0, h - band_h, w, h);

        let lh = style.line_height_px;
        let n = line_count as f32;
        let start = canvas.height as f32 - style.band_height_px / 2.0 - (n - 1.0).max(0.0) * lh / 2.0
            + style.baseline_nudge_px;
        let baselines = (0..line_count).map(|k| start + k as f32 * lh).collect();
        Self { band, baselines }
    }
}

struct ImagePaint {
    key: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
    w: f64,
    h: f64,
}

struct WrappedText {
    scene_index: usize,
    text: String,
    lines: Arc<[String]>,
}

/// Draws one frame: the scene image stretched to the canvas, the subtitle band and the
/// wrapped narration.
///
/// Holds no timing state. The frame loop calls [`FrameCompositor::draw_frame`] once per
/// tick with whatever scene and image are current at that moment.
pub struct FrameCompositor {
    canvas: Canvas,
    style: SubtitleStyle,
    text: Option<TextEngine>,
    ctx: Option<vello_cpu::RenderContext>,
    image_paint: Option<ImagePaint>,
    wrapped: Option<WrappedText>,
}

impl std::fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("canvas", &self.canvas)
            .field("style", &self.style)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl FrameCompositor {
    /// Build a compositor. Without a text engine, lines are wrapped with an approximate
    /// measure and only the band is drawn.
    pub fn new(canvas: Canvas, style: SubtitleStyle, text: Option<TextEngine>) -> Self {
        Self {
            canvas,
            style,
            text,
            ctx: None,
            image_paint: None,
            wrapped: None,
        }
    }

    /// Compositor configured from render options, loading `font_path` when set.
    pub fn from_opts(opts: &RenderOpts) -> ReelResult<Self> {
        let style = opts.subtitle_style();
        let text = match &opts.font_path {
            Some(p) => Some(TextEngine::from_path(p, style.font_size_px)?),
            None => None,
        };
        Ok(Self::new(opts.canvas(), style, text))
    }

    /// Session canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Subtitle style in use.
    pub fn style(&self) -> &SubtitleStyle {
        &self.style
    }

    /// Return `true` when glyphs are drawn.
    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Wrap `text` to the canvas width minus the horizontal margin.
    pub fn subtitle_lines(&mut self, text: &str) -> Vec<String> {
        let max_width = self.canvas.width as f32 - self.style.margin_px;
        match self.text.as_mut() {
            Some(engine) => wrap(text, max_width, |s| engine.measure(s)),
            None => {
                let size = self.style.font_size_px;
                wrap(text, max_width, |s| approximate_width(s, size))
            }
        }
    }

    fn lines_for(&mut self, scene: &Scene) -> Arc<[String]> {
        if let Some(w) = &self.wrapped
            && w.scene_index == scene.index()
            && w.text == scene.narration_text()
        {
            return w.lines.clone();
        }
        let lines: Arc<[String]> = self.subtitle_lines(scene.narration_text()).into();
        self.wrapped = Some(WrappedText {
            scene_index: scene.index(),
            text: scene.narration_text().to_owned(),
            lines: lines.clone(),
        });
        lines
    }

    fn paint_for(&mut self, image: &PreparedImage) -> ReelResult<(vello_cpu::Image, f64, f64)> {
        if let Some(p) = &self.image_paint
            && Arc::ptr_eq(&p.key, &image.rgba8_premul)
        {
            return Ok((p.paint.clone(), p.w, p.h));
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let (w, h) = (f64::from(image.width), f64::from(image.height));
        self.image_paint = Some(ImagePaint {
            key: image.rgba8_premul.clone(),
            paint: paint.clone(),
            w,
            h,
        });
        Ok((paint, w, h))
    }

    /// Composite `image` and the subtitles of `scene` into `surface`.
    pub fn draw_frame(
        &mut self,
        surface: &mut Surface,
        image: &PreparedImage,
        scene: &Scene,
    ) -> ReelResult<()> {
        if surface.canvas() != self.canvas {
            return Err(ReelError::validation(
                "surface canvas does not match compositor canvas",
            ));
        }
        let (paint, iw, ih) = self.paint_for(image)?;
        let lines = self.lines_for(scene);
        let placement = SubtitlePlacement::compute(self.canvas, &self.style, lines.len());

        let (w16, h16) = canvas_u16(self.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();
        ctx.set_paint_transform(Affine::IDENTITY);

        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        // Stretch to fill; aspect mismatch is not corrected.
        ctx.set_transform(Affine::scale_non_uniform(w / iw, h / ih));
        ctx.set_paint(paint);
        ctx.fill_rect(&Rect::new(0.0, 0.0, iw, ih));

        ctx.set_transform(Affine::IDENTITY);
        let band = self.style.band_rgba;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            band.r, band.g, band.b, band.a,
        ));
        ctx.fill_rect(&placement.band);

        if let Some(engine) = self.text.as_mut() {
            let c = self.style.text_rgba;
            let brush = TextBrushRgba8 {
                r: c.r,
                g: c.g,
                b: c.b,
                a: c.a,
            };
            for (line, &baseline) in lines.iter().zip(&placement.baselines) {
                let layout = engine.layout_line(line, brush);
                for pline in layout.lines() {
                    let m = pline.metrics();
                    let x0 = (self.canvas.width as f32 - m.advance) / 2.0;
                    let dy = baseline - m.baseline;
                    for item in pline.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let b = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
                        let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: x0 + g.x,
                            y: dy + g.y,
                        });
                        ctx.glyph_run(engine.font())
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(surface.pixmap_mut());
        self.ctx = Some(ctx);
        Ok(())
    }
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::validation("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(ReelError::validation("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
