use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use crate::{
    foundation::core::Rgba8,
    foundation::error::{VizError, VizResult},
};

/// Environment variable naming a font file for text layers.
pub const FONT_ENV: &str = "PATHVIZ_FONT";

/// RGBA8 brush colour used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Shaped text plus its measured size in pixels.
pub struct ShapedText {
    pub layout: parley::Layout<TextBrushRgba8>,
    pub width: f64,
    pub height: f64,
}

/// Parley contexts bound to one font face, reused for every label of every frame.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    /// Build an engine from raw font bytes (`index` selects the face inside a collection).
    pub fn from_font_bytes(bytes: Vec<u8>, index: u32) -> VizResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| VizError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VizError::render("registered font family has no name"))?
            .to_string();

        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), index);

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    pub fn from_font_file(path: &Path) -> VizResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| VizError::io(path, e))?;
        Self::from_font_bytes(bytes, 0)
    }

    /// Resolve a font in priority order: explicit path, `PATHVIZ_FONT`, system sans-serif.
    ///
    /// Returns `Ok(None)` when no font is available at all; text layers are then skipped.
    pub fn discover(explicit: Option<&Path>) -> VizResult<Option<Self>> {
        if let Some(path) = explicit {
            return Self::from_font_file(path).map(Some);
        }
        if let Some(path) = std::env::var_os(FONT_ENV).map(PathBuf::from) {
            return Self::from_font_file(&path).map(Some);
        }
        match system_sans_serif() {
            Some((bytes, index)) => Self::from_font_bytes(bytes, index).map(Some),
            None => Ok(None),
        }
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Shape `text` on a single column of lines (explicit `\n` only, no wrapping).
    pub fn shape(&mut self, text: &str, size_px: f32, color: Rgba8) -> VizResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(VizError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(
            color,
        )));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let mut width = 0.0f64;
        let mut height = 0.0f64;
        for line in layout.lines() {
            let m = line.metrics();
            width = width.max(f64::from(m.advance));
            height += f64::from(m.ascent + m.descent + m.leading);
        }

        Ok(ShapedText {
            layout,
            width,
            height,
        })
    }
}

fn system_sans_serif() -> Option<(Vec<u8>, u32)> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let families = [
        usvg::fontdb::Family::SansSerif,
        usvg::fontdb::Family::Serif,
        usvg::fontdb::Family::Monospace,
    ];
    let query = usvg::fontdb::Query {
        families: &families,
        weight: usvg::fontdb::Weight::NORMAL,
        stretch: usvg::fontdb::Stretch::Normal,
        style: usvg::fontdb::Style::Normal,
    };
    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|f| f.id))?;
    db.with_face_data(id, |data, index| (data.to_vec(), index))
}
