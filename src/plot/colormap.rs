//! Colour ramps used by the layer renderers.
//!
//! Each ramp is a 256-entry lookup table built once per process. Sampling follows the usual
//! plotting convention: `t` in `[0, 1]` picks entry `floor(t * 256)` (so `1.0` is the last entry),
//! out-of-range values clamp and NaN maps to transparent.

use std::sync::LazyLock;

use crate::foundation::core::Rgba8;

const LUT_SIZE: usize = 256;

pub struct Colormap {
    lut: [Rgba8; LUT_SIZE],
}

impl Colormap {
    /// Piecewise-linear ramp through evenly spaced stops.
    pub fn from_stops(stops: &[Rgba8]) -> Self {
        let mut lut = [Rgba8::TRANSPARENT; LUT_SIZE];
        match stops {
            [] => {}
            [only] => lut.fill(*only),
            _ => {
                let segments = (stops.len() - 1) as f64;
                for (i, slot) in lut.iter_mut().enumerate() {
                    let pos = (i as f64 / (LUT_SIZE - 1) as f64) * segments;
                    let seg = (pos.floor() as usize).min(stops.len() - 2);
                    *slot = stops[seg].lerp(stops[seg + 1], pos - seg as f64);
                }
            }
        }
        Self { lut }
    }

    /// Same ramp with entry 0 made fully transparent, so zero-valued cells show what is beneath.
    pub fn with_transparent_zero(mut self) -> Self {
        self.lut[0] = Rgba8::TRANSPARENT;
        self
    }

    pub fn sample(&self, t: f64) -> Rgba8 {
        if t.is_nan() {
            return Rgba8::TRANSPARENT;
        }
        let idx = (t.clamp(0.0, 1.0) * LUT_SIZE as f64) as usize;
        self.lut[idx.min(LUT_SIZE - 1)]
    }

    /// Colour for a boolean cell: entry 0 for `false`, the last entry for `true`.
    pub fn sample_bool(&self, b: bool) -> Rgba8 {
        if b { self.lut[LUT_SIZE - 1] } else { self.lut[0] }
    }
}

const VIRIDIS_STOPS: [Rgba8; 10] = [
    Rgba8::new(0x44, 0x01, 0x54, 255),
    Rgba8::new(0x48, 0x28, 0x78, 255),
    Rgba8::new(0x3e, 0x49, 0x89, 255),
    Rgba8::new(0x31, 0x68, 0x8e, 255),
    Rgba8::new(0x26, 0x82, 0x8e, 255),
    Rgba8::new(0x1f, 0x9e, 0x89, 255),
    Rgba8::new(0x35, 0xb7, 0x79, 255),
    Rgba8::new(0x6e, 0xce, 0x58, 255),
    Rgba8::new(0xb5, 0xde, 0x2b, 255),
    Rgba8::new(0xfd, 0xe7, 0x25, 255),
];

pub static VIRIDIS: LazyLock<Colormap> = LazyLock::new(|| Colormap::from_stops(&VIRIDIS_STOPS));

/// Heatmap ramp: viridis with a transparent zero.
pub static VIRIDIS_CLEAR_ZERO: LazyLock<Colormap> =
    LazyLock::new(|| Colormap::from_stops(&VIRIDIS_STOPS).with_transparent_zero());

/// Black to white; ground truth.
pub static GRAY: LazyLock<Colormap> =
    LazyLock::new(|| Colormap::from_stops(&[Rgba8::BLACK, Rgba8::WHITE]));

/// White to black; label text.
pub static GREYS: LazyLock<Colormap> =
    LazyLock::new(|| Colormap::from_stops(&[Rgba8::WHITE, Rgba8::BLACK]));

/// Transparent for `false`, orange for `true`; overlay masks.
pub static OVERLAY: LazyLock<Colormap> = LazyLock::new(|| {
    Colormap::from_stops(&[
        Rgba8::new(0xff, 0x7f, 0x0e, 255),
        Rgba8::new(0xff, 0x7f, 0x0e, 255),
    ])
    .with_transparent_zero()
});

/// Marker colour: the top of the viridis ramp.
pub fn marker_color() -> Rgba8 {
    VIRIDIS.sample(1.0)
}
