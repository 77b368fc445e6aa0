use crate::{
    foundation::core::{Dims, Grid, Rgba8},
    plot::colormap::Colormap,
};

/// One colour per grid cell, row-major, row 0 at the top of the raster extent.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    dims: Dims,
    px: Vec<Rgba8>,
}

impl Raster {
    pub fn from_mask(grid: &Grid<bool>, cmap: &Colormap) -> Self {
        Self {
            dims: grid.dims(),
            px: grid.cells().iter().map(|&b| cmap.sample_bool(b)).collect(),
        }
    }

    /// Colour-map a scalar field, normalised to `[min(0, lo), hi]` of its own values.
    pub fn from_scalar(grid: &Grid<f64>, cmap: &Colormap) -> Self {
        let (lo, hi) = grid
            .cells()
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0f64, 0.0f64), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = hi - lo;
        let px = grid
            .cells()
            .iter()
            .map(|&v| {
                if span > 0.0 {
                    cmap.sample((v - lo) / span)
                } else {
                    cmap.sample(0.0)
                }
            })
            .collect();
        Self {
            dims: grid.dims(),
            px,
        }
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn get(&self, col: u32, row: u32) -> Option<Rgba8> {
        if col >= self.dims.cols || row >= self.dims.rows {
            return None;
        }
        self.px
            .get(row as usize * self.dims.cols as usize + col as usize)
            .copied()
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.px.iter().all(|c| c.is_transparent())
    }

    /// Nearest-neighbour resample to `width x height` premultiplied pixels, reusing `out`.
    pub fn resample_premul(
        &self,
        width: u32,
        height: u32,
        out: &mut Vec<vello_cpu::peniko::color::PremulRgba8>,
    ) -> bool {
        out.clear();
        out.reserve(width as usize * height as usize);
        let cols = u64::from(self.dims.cols);
        let rows = u64::from(self.dims.rows);

        let mut may_have_opacities = false;
        for py in 0..height {
            let row = (u64::from(py) * rows / u64::from(height.max(1))) as u32;
            for px in 0..width {
                let col = (u64::from(px) * cols / u64::from(width.max(1))) as u32;
                let [r, g, b, a] = self
                    .get(col, row)
                    .unwrap_or(Rgba8::TRANSPARENT)
                    .to_premul();
                may_have_opacities |= a != 255;
                out.push(vello_cpu::peniko::color::PremulRgba8 { r, g, b, a });
            }
        }
        may_have_opacities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::colormap::{GRAY, VIRIDIS_CLEAR_ZERO};

    #[test]
    fn mask_raster_keeps_row_major_layout() {
        // columns[x][y]: only (x=1, y=0) is set.
        let grid = Grid::from_columns(vec![vec![false, false], vec![true, false]]).unwrap();
        let r = Raster::from_mask(&grid, &GRAY);
        assert_eq!(r.get(1, 0), Some(Rgba8::WHITE));
        assert_eq!(r.get(0, 0), Some(Rgba8::BLACK));
        assert_eq!(r.get(1, 1), Some(Rgba8::BLACK));
    }

    #[test]
    fn scalar_raster_normalises_to_max() {
        let mut grid = Grid::filled(Dims::new(3, 1), 0.0);
        *grid.get_mut(1, 0).unwrap() = 2.0;
        *grid.get_mut(2, 0).unwrap() = 4.0;
        let r = Raster::from_scalar(&grid, &VIRIDIS_CLEAR_ZERO);
        assert!(r.get(0, 0).unwrap().is_transparent());
        assert_eq!(r.get(1, 0), Some(VIRIDIS_CLEAR_ZERO.sample(0.5)));
        assert_eq!(r.get(2, 0), Some(VIRIDIS_CLEAR_ZERO.sample(1.0)));
    }

    #[test]
    fn all_zero_field_is_transparent() {
        let grid = Grid::filled(Dims::new(4, 4), 0.0);
        assert!(Raster::from_scalar(&grid, &VIRIDIS_CLEAR_ZERO).is_fully_transparent());
    }

    #[test]
    fn resample_repeats_cells() {
        let grid = Grid::from_columns(vec![vec![true], vec![false]]).unwrap();
        let r = Raster::from_mask(&grid, &GRAY);
        let mut out = Vec::new();
        let translucent = r.resample_premul(4, 2, &mut out);
        assert!(!translucent);
        assert_eq!(out.len(), 8);
        let reds: Vec<u8> = out.iter().map(|p| p.r).collect();
        assert_eq!(reds, vec![255, 255, 0, 0, 255, 255, 0, 0]);
    }
}
