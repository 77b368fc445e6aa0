//! Grid-index space to plot space.
//!
//! Plot space has its origin at the bottom-left of the grid, `x` to the right and `y` up, one unit
//! per cell. Two conventions meet here and must stay consistent:
//!
//! - **Points** (markers, path segments, labels) go through [`to_plot_xy`]: the cell centre, with
//!   the vertical axis flipped so row 0 lands at the top.
//! - **Rasters** are painted over [`raster_extent`] without any flip. The loader already stored
//!   them row-major, so row 0 of the array is the top row of the extent.

use crate::foundation::core::{Dims, GridPoint};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

impl PlotPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// `[x0, x1, y0, y1]` in plot units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Extent {
    pub fn as_array(self) -> [f64; 4] {
        [self.x0, self.x1, self.y0, self.y1]
    }

    pub fn width(self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(self) -> f64 {
        self.y1 - self.y0
    }
}

/// Centre of cell `p`, row 0 at the top.
pub fn to_plot_xy(p: GridPoint, dims: Dims) -> PlotPoint {
    PlotPoint {
        x: p.x as f64 + 0.5,
        y: f64::from(dims.rows) - p.y as f64 - 0.5,
    }
}

/// Area every raster layer covers: always `[0, cols, 0, rows]`.
pub fn raster_extent(dims: Dims) -> Extent {
    Extent {
        x0: 0.0,
        x1: f64::from(dims.cols),
        y0: 0.0,
        y1: f64::from(dims.rows),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerShape {
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
    TriangleLeft,
    TriangleRight,
    Star,
}

/// Marker for a single step `(dx, dy)` in grid-index space.
///
/// `dy = -1` moves toward row 0, which renders at the top, hence "up".
pub fn step_marker(diff: (i64, i64)) -> MarkerShape {
    match diff {
        (0, 0) => MarkerShape::Circle,
        (0, -1) => MarkerShape::TriangleUp,
        (0, 1) => MarkerShape::TriangleDown,
        (1, 0) => MarkerShape::TriangleRight,
        (-1, 0) => MarkerShape::TriangleLeft,
        _ => MarkerShape::Star,
    }
}

/// Marker for the `next` cursor given where the search currently is.
pub fn direction_marker(current: Option<GridPoint>, next: GridPoint) -> MarkerShape {
    match current {
        Some(current) => step_marker(next.offset_from(current)),
        None => MarkerShape::Star,
    }
}
