//! The drawing surface every layer renders into.
//!
//! A [`Canvas`] owns one `vello_cpu` render context and one output pixmap for its whole lifetime.
//! Frames are produced by `clear()`, any number of draw calls, then `save_png()`; nothing is
//! reallocated between frames. Alongside the pixels the canvas keeps a display list
//! ([`Primitive`]) of what the current frame contains, in plot-space terms.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use kurbo::Shape as _;

use crate::{
    foundation::core::{Dims, Point, Rect, Rgba8},
    foundation::error::{VizError, VizResult},
    plot::coords::{Extent, MarkerShape, PlotPoint, raster_extent},
    render::raster::Raster,
    render::text::{ShapedText, TextEngine},
};

#[derive(Clone, Debug)]
pub struct RenderSettings {
    /// Output width in pixels.
    pub width: u16,
    /// Output height in pixels.
    pub height: u16,
    /// Pixels per inch; converts point sizes (markers, strokes, fonts) to pixels.
    pub dpi: f64,
    pub background: Rgba8,
    /// Font file for text layers. `None` falls back to `PATHVIZ_FONT`, then system fonts.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            dpi: 100.0,
            background: Rgba8::WHITE,
            font_path: None,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> VizResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VizError::validation("frame width and height must be > 0"));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(VizError::validation("dpi must be finite and > 0"));
        }
        Ok(())
    }
}

/// What the current frame contains, recorded in plot space as layers draw.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Raster {
        dims: Dims,
        extent: Extent,
        opacity: f32,
    },
    Marker {
        at: PlotPoint,
        shape: MarkerShape,
        area_pt2: f64,
        color: Rgba8,
    },
    Segment {
        from: PlotPoint,
        to: PlotPoint,
        width_pt: f64,
        color: Rgba8,
    },
    Label {
        text: String,
        at: PlotPoint,
        color: Rgba8,
    },
    /// Multi-line annotation anchored to the top-right corner of the plot area.
    TextBox { text: String },
    Title { text: String },
}

/// Placement of the plot area inside the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    dims: Dims,
    /// Plot area in pixels, snapped to whole pixels.
    plot: Rect,
}

impl Viewport {
    /// Largest equal-aspect plot area for `dims` below a `top_band` reserved for the title.
    pub fn fit(width: u16, height: u16, dims: Dims, top_band: f64) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        let margin = (w.min(h) * 0.05).round();
        let top = (margin + top_band).min(h - 1.0).max(0.0);
        let avail_w = (w - 2.0 * margin).max(1.0);
        let avail_h = (h - top - margin).max(1.0);

        let cols = f64::from(dims.cols.max(1));
        let rows = f64::from(dims.rows.max(1));
        let scale = (avail_w / cols).min(avail_h / rows);
        let box_w = (cols * scale).round().max(1.0);
        let box_h = (rows * scale).round().max(1.0);
        let x0 = (margin + (avail_w - box_w) / 2.0).round();
        let y0 = (top + (avail_h - box_h) / 2.0).round();

        Self {
            dims,
            plot: Rect::new(x0, y0, x0 + box_w, y0 + box_h),
        }
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn plot_rect(&self) -> Rect {
        self.plot
    }

    /// Plot space (y up) to pixel space (y down). The raster extent fills the plot rect.
    pub fn to_px(&self, p: PlotPoint) -> Point {
        let ext = raster_extent(self.dims);
        Point::new(
            self.plot.x0 + (p.x - ext.x0) / ext.width().max(1.0) * self.plot.width(),
            self.plot.y0 + (ext.y1 - p.y) / ext.height().max(1.0) * self.plot.height(),
        )
    }

    /// Pixel size of one cell.
    pub fn cell_px(&self) -> (f64, f64) {
        let ext = raster_extent(self.dims);
        (
            self.plot.width() / ext.width().max(1.0),
            self.plot.height() / ext.height().max(1.0),
        )
    }
}

pub struct Canvas {
    settings: RenderSettings,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    viewport: Viewport,
    text: Option<TextEngine>,
    primitives: Vec<Primitive>,
    png_scratch: Vec<u8>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("settings", &self.settings)
            .field("viewport", &self.viewport)
            .field("text", &self.text)
            .field("primitives", &self.primitives.len())
            .finish_non_exhaustive()
    }
}

const TITLE_PT: f64 = 16.0;

impl Canvas {
    /// Create a canvas, resolving a font for text layers.
    pub fn new(settings: RenderSettings) -> VizResult<Self> {
        settings.validate()?;
        let text = TextEngine::discover(settings.font_path.as_deref())?;
        match &text {
            Some(t) => tracing::debug!(family = t.family_name(), "text layers enabled"),
            None => tracing::warn!("no usable font found; text layers will be skipped"),
        }
        Self::with_text(settings, text)
    }

    /// Create a canvas with an explicit text engine (`None` disables text rasterization).
    pub fn with_text(settings: RenderSettings, text: Option<TextEngine>) -> VizResult<Self> {
        settings.validate()?;
        let (w, h) = (settings.width, settings.height);
        let top_band = pt_to_px(TITLE_PT, settings.dpi) * 1.8;
        let mut canvas = Self {
            viewport: Viewport::fit(w, h, Dims::new(1, 1), top_band),
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            settings,
            text,
            primitives: Vec::new(),
            png_scratch: Vec::with_capacity(usize::from(w) * usize::from(h) * 4),
        };
        canvas.clear();
        Ok(canvas)
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Fit the plot area to a grid of `dims`. Takes effect from the next draw call.
    pub fn set_dims(&mut self, dims: Dims) {
        let top_band = pt_to_px(TITLE_PT, self.settings.dpi) * 1.8;
        self.viewport = Viewport::fit(self.settings.width, self.settings.height, dims, top_band);
    }

    pub fn dims(&self) -> Dims {
        self.viewport.dims()
    }

    /// Display list of the current frame.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Forget everything drawn so far and start a new frame on the background colour.
    pub fn clear(&mut self) {
        self.ctx.reset();
        self.primitives.clear();

        let bg = self.settings.background;
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.settings.width),
            f64::from(self.settings.height),
        ));
    }

    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt_to_px(pt, self.settings.dpi)
    }

    /// Paint a per-cell raster over the fixed extent `[0, cols, 0, rows]`.
    pub fn draw_raster(&mut self, raster: &Raster, opacity: f32) -> VizResult<()> {
        let dims = self.viewport.dims();
        if raster.dims() != dims {
            return Err(VizError::render(format!(
                "raster {} does not match canvas grid {dims}",
                raster.dims()
            )));
        }
        self.primitives.push(Primitive::Raster {
            dims,
            extent: raster_extent(dims),
            opacity,
        });
        if raster.is_fully_transparent() || opacity <= 0.0 {
            return Ok(());
        }

        let plot = self.viewport.plot_rect();
        let (w, h) = (plot.width() as u32, plot.height() as u32);
        let w16: u16 = w
            .try_into()
            .map_err(|_| VizError::render("raster width exceeds u16"))?;
        let h16: u16 = h
            .try_into()
            .map_err(|_| VizError::render("raster height exceeds u16"))?;

        let mut pixels = Vec::new();
        let may_have_opacities = raster.resample_premul(w, h, &mut pixels);
        let pixmap =
            vello_cpu::Pixmap::from_parts_with_opacity(pixels, w16, h16, may_have_opacities);
        let image = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((plot.x0, plot.y0)));
        self.ctx.set_paint(image);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        Ok(())
    }

    /// Filled marker centred at `at`; `area_pt2` is the marker area in square points.
    pub fn draw_marker(&mut self, at: PlotPoint, shape: MarkerShape, area_pt2: f64, color: Rgba8) {
        self.primitives.push(Primitive::Marker {
            at,
            shape,
            area_pt2,
            color,
        });
        let radius = 0.5 * self.pt_to_px(area_pt2.max(0.0).sqrt());
        let path = marker_path(shape, self.viewport.to_px(at), radius);
        self.fill(&path, color);
    }

    /// Straight line with projecting caps.
    pub fn draw_segment(&mut self, from: PlotPoint, to: PlotPoint, width_pt: f64, color: Rgba8) {
        self.primitives.push(Primitive::Segment {
            from,
            to,
            width_pt,
            color,
        });
        let path = segment_path(
            self.viewport.to_px(from),
            self.viewport.to_px(to),
            self.pt_to_px(width_pt),
        );
        self.fill(&path, color);
    }

    /// Centred single-line text at a plot-space point.
    pub fn draw_label(
        &mut self,
        text: &str,
        at: PlotPoint,
        size_px: f64,
        color: Rgba8,
    ) -> VizResult<()> {
        self.primitives.push(Primitive::Label {
            text: text.to_string(),
            at,
            color,
        });
        let centre = self.viewport.to_px(at);
        let Some(engine) = self.text.as_mut() else {
            return Ok(());
        };
        let shaped = engine.shape(text, size_px as f32, color)?;
        let origin = Point::new(centre.x - shaped.width / 2.0, centre.y - shaped.height / 2.0);
        fill_shaped(&mut self.ctx, engine.font(), &shaped, origin);
        Ok(())
    }

    /// Right/top aligned annotation inside the top-right corner of the plot area, drawn over a
    /// translucent rounded box.
    pub fn draw_text_box(&mut self, text: &str, size_pt: f64) -> VizResult<()> {
        self.primitives.push(Primitive::TextBox {
            text: text.to_string(),
        });
        let size_px = self.pt_to_px(size_pt);
        let plot = self.viewport.plot_rect();
        let Some(engine) = self.text.as_mut() else {
            return Ok(());
        };
        let shaped = engine.shape(text, size_px as f32, Rgba8::BLACK)?;

        let pad = (size_px * 0.3).round();
        let bx = Rect::new(
            plot.x1 - shaped.width - 2.0 * pad,
            plot.y0,
            plot.x1,
            plot.y0 + shaped.height + 2.0 * pad,
        );
        let rounded = kurbo::RoundedRect::from_rect(bx, pad);
        let box_path = to_cpu_path(rounded.path_elements(0.1));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 128));
        self.ctx.fill_path(&box_path);

        fill_shaped(
            &mut self.ctx,
            engine.font(),
            &shaped,
            Point::new(bx.x0 + pad, bx.y0 + pad),
        );
        Ok(())
    }

    /// Title centred above the plot area.
    pub fn draw_title(&mut self, text: &str) -> VizResult<()> {
        self.primitives.push(Primitive::Title {
            text: text.to_string(),
        });
        let size_px = self.pt_to_px(TITLE_PT);
        let plot = self.viewport.plot_rect();
        let Some(engine) = self.text.as_mut() else {
            return Ok(());
        };
        let shaped = engine.shape(text, size_px as f32, Rgba8::BLACK)?;
        let origin = Point::new(
            plot.center().x - shaped.width / 2.0,
            (plot.y0 - shaped.height - size_px * 0.4).max(0.0),
        );
        fill_shaped(&mut self.ctx, engine.font(), &shaped, origin);
        Ok(())
    }

    /// Rasterize the current frame into the canvas pixmap and return straight-alpha RGBA8.
    pub fn finish_rgba8(&mut self) -> &[u8] {
        self.draw_frame_border();
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);

        self.png_scratch.clear();
        self.png_scratch
            .extend_from_slice(self.pixmap.data_as_u8_slice());
        unpremultiply_rgba8_in_place(&mut self.png_scratch);
        &self.png_scratch
    }

    /// Rasterize the current frame and write it as a PNG.
    pub fn save_png(&mut self, path: &Path) -> VizResult<()> {
        let (w, h) = (
            u32::from(self.settings.width),
            u32::from(self.settings.height),
        );
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VizError::io(parent, e))?;
        }
        let data = self.finish_rgba8();
        image::save_buffer_with_format(
            path,
            data,
            w,
            h,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }

    fn draw_frame_border(&mut self) {
        let plot = self.viewport.plot_rect();
        let t = self.pt_to_px(0.8).max(1.0);
        let edges = [
            Rect::new(plot.x0 - t, plot.y0 - t, plot.x1 + t, plot.y0),
            Rect::new(plot.x0 - t, plot.y1, plot.x1 + t, plot.y1 + t),
            Rect::new(plot.x0 - t, plot.y0, plot.x0, plot.y1),
            Rect::new(plot.x1, plot.y0, plot.x1 + t, plot.y1),
        ];
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
        for e in edges {
            self.ctx
                .fill_rect(&vello_cpu::kurbo::Rect::new(e.x0, e.y0, e.x1, e.y1));
        }
    }

    fn fill(&mut self, path: &vello_cpu::kurbo::BezPath, color: Rgba8) {
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx.fill_path(path);
    }
}

pub fn pt_to_px(pt: f64, dpi: f64) -> f64 {
    pt * dpi / 72.0
}

fn fill_shaped(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    shaped: &ShapedText,
    origin: Point,
) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Re-express a kurbo path in the renderer's own kurbo types.
fn to_cpu_path(els: impl IntoIterator<Item = kurbo::PathEl>) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in els {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn polygon(points: impl IntoIterator<Item = Point>) -> vello_cpu::kurbo::BezPath {
    let mut path = kurbo::BezPath::new();
    for (i, p) in points.into_iter().enumerate() {
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    to_cpu_path(path.elements().iter().copied())
}

/// Marker outline in pixel space (y down) with circumradius `r`.
pub(crate) fn marker_path(shape: MarkerShape, c: Point, r: f64) -> vello_cpu::kurbo::BezPath {
    let sin60 = 3f64.sqrt() / 2.0;
    let at = |dx: f64, dy: f64| Point::new(c.x + dx * r, c.y + dy * r);
    match shape {
        MarkerShape::Circle => to_cpu_path(kurbo::Circle::new(c, r).path_elements(0.1)),
        MarkerShape::Square => {
            let h = 0.85;
            polygon([at(-h, -h), at(h, -h), at(h, h), at(-h, h)])
        }
        MarkerShape::TriangleUp => polygon([at(0.0, -1.0), at(sin60, 0.5), at(-sin60, 0.5)]),
        MarkerShape::TriangleDown => polygon([at(0.0, 1.0), at(-sin60, -0.5), at(sin60, -0.5)]),
        MarkerShape::TriangleRight => polygon([at(1.0, 0.0), at(-0.5, sin60), at(-0.5, -sin60)]),
        MarkerShape::TriangleLeft => polygon([at(-1.0, 0.0), at(0.5, -sin60), at(0.5, sin60)]),
        MarkerShape::Star => {
            let inner = 0.381_966;
            polygon((0..10).map(|i| {
                let angle = -std::f64::consts::FRAC_PI_2 + f64::from(i) * std::f64::consts::PI / 5.0;
                let k = if i % 2 == 0 { 1.0 } else { inner };
                at(k * angle.cos(), k * angle.sin())
            }))
        }
    }
}

/// Thick line from `a` to `b` with caps extending `width / 2` past each end.
pub(crate) fn segment_path(a: Point, b: Point, width: f64) -> vello_cpu::kurbo::BezPath {
    let half = width / 2.0;
    let d = b - a;
    let len = d.hypot();
    if len <= f64::EPSILON {
        return polygon([
            Point::new(a.x - half, a.y - half),
            Point::new(a.x + half, a.y - half),
            Point::new(a.x + half, a.y + half),
            Point::new(a.x - half, a.y + half),
        ]);
    }
    let dir = d / len * half;
    let normal = kurbo::Vec2::new(-dir.y, dir.x);
    let (a, b) = (a - dir, b + dir);
    polygon([a + normal, b + normal, b - normal, a - normal])
}

fn unpremultiply_rgba8_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_keeps_cells_square_and_inside_frame() {
        let vp = Viewport::fit(640, 480, Dims::new(10, 5), 40.0);
        let (cw, ch) = vp.cell_px();
        assert!((cw - ch).abs() < 0.5, "{cw} vs {ch}");
        let r = vp.plot_rect();
        assert!(r.x0 >= 0.0 && r.y0 >= 40.0 && r.x1 <= 640.0 && r.y1 <= 480.0);
    }

    #[test]
    fn plot_corners_map_to_plot_rect() {
        let vp = Viewport::fit(400, 400, Dims::new(4, 4), 0.0);
        let r = vp.plot_rect();
        let top_left = vp.to_px(PlotPoint::new(0.0, 4.0));
        let bottom_right = vp.to_px(PlotPoint::new(4.0, 0.0));
        assert_eq!(top_left, Point::new(r.x0, r.y0));
        assert_eq!(bottom_right, Point::new(r.x1, r.y1));
    }

    #[test]
    fn segment_has_projecting_caps() {
        let p = segment_path(Point::new(10.0, 10.0), Point::new(20.0, 10.0), 4.0);
        let bb = vello_cpu::kurbo::Shape::bounding_box(&p);
        assert!((bb.x0 - 8.0).abs() < 1e-9 && (bb.x1 - 22.0).abs() < 1e-9);
        assert!((bb.y0 - 8.0).abs() < 1e-9 && (bb.y1 - 12.0).abs() < 1e-9);
    }

    #[test]
    fn triangle_up_points_to_smaller_y() {
        let p = marker_path(MarkerShape::TriangleUp, Point::new(50.0, 50.0), 10.0);
        let bb = vello_cpu::kurbo::Shape::bounding_box(&p);
        assert!((bb.y0 - 40.0).abs() < 1e-9);
        assert!((bb.y1 - 55.0).abs() < 1e-9);
    }

    #[test]
    fn unpremultiply_restores_straight_alpha() {
        let mut px = [64u8, 0, 128, 128];
        unpremultiply_rgba8_in_place(&mut px);
        assert_eq!(px, [128, 0, 255, 128]);
    }

    #[test]
    fn settings_reject_empty_frames() {
        let s = RenderSettings {
            width: 0,
            ..RenderSettings::default()
        };
        assert!(s.validate().is_err());
    }
}
